//! In-process store used by tests and local development. A single mutex over
//! both collections gives the transactional operations the same atomicity the
//! Postgres backend gets from row locks.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use rapida_core::{ReservationStore, StoreError, StoreResult, TripStore};
use rapida_domain::{Reservation, ReservationStatus, Trip};

#[derive(Default)]
struct Collections {
    trips: HashMap<Uuid, Trip>,
    reservations: HashMap<Uuid, Reservation>,
}

pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Collections::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn active_seats_for_trip(collections: &Collections, trip_id: Uuid) -> Vec<String> {
    collections
        .reservations
        .values()
        .filter(|r| r.trip_id == trip_id && r.status.is_active())
        .flat_map(|r| r.passengers.iter().map(|p| p.seat.clone()))
        .collect()
}

#[async_trait]
impl TripStore for MemoryStore {
    async fn get_trip(&self, trip_id: Uuid) -> StoreResult<Option<Trip>> {
        let collections = self.inner.lock().await;
        Ok(collections.trips.get(&trip_id).cloned())
    }

    async fn search_trips(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Trip>> {
        let collections = self.inner.lock().await;
        let mut trips: Vec<Trip> = collections
            .trips
            .values()
            .filter(|t| {
                t.active
                    && t.origin == origin
                    && t.destination == destination
                    && t.departure_time.date_naive() == date
            })
            .cloned()
            .collect();
        trips.sort_by_key(|t| t.departure_time);
        Ok(trips)
    }

    async fn list_active_trips(&self) -> StoreResult<Vec<Trip>> {
        let collections = self.inner.lock().await;
        let mut trips: Vec<Trip> = collections
            .trips
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect();
        trips.sort_by_key(|t| t.departure_time);
        Ok(trips)
    }

    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()> {
        let mut collections = self.inner.lock().await;
        collections.trips.insert(trip.id, trip.clone());
        Ok(())
    }

    async fn adjust_seats(&self, trip_id: Uuid, delta: i32) -> StoreResult<i32> {
        let mut collections = self.inner.lock().await;
        let trip = collections
            .trips
            .get_mut(&trip_id)
            .ok_or_else(|| StoreError::NotFound(format!("trip {}", trip_id)))?;

        let next = trip.seats_available + delta;
        if next < 0 || next > trip.seats_total {
            return Err(StoreError::InsufficientSeats {
                requested: delta.abs(),
                available: trip.seats_available,
            });
        }
        trip.seats_available = next;
        Ok(next)
    }
}

#[async_trait]
impl ReservationStore for MemoryStore {
    async fn commit_reservation(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut collections = self.inner.lock().await;

        // 1. The trip must exist
        let available = {
            let trip = collections
                .trips
                .get(&reservation.trip_id)
                .ok_or_else(|| StoreError::NotFound(format!("trip {}", reservation.trip_id)))?;
            trip.seats_available
        };

        // 2. Booking codes are unique
        if collections
            .reservations
            .values()
            .any(|r| r.code == reservation.code)
        {
            return Err(StoreError::DuplicateCode(reservation.code.clone()));
        }

        // 3. None of the requested seats may be held by an active reservation
        let taken = active_seats_for_trip(&collections, reservation.trip_id);
        for passenger in &reservation.passengers {
            if taken.contains(&passenger.seat) {
                return Err(StoreError::SeatTaken {
                    seat: passenger.seat.clone(),
                });
            }
        }

        // 4. Capacity must cover the party
        if available < reservation.passenger_count {
            return Err(StoreError::InsufficientSeats {
                requested: reservation.passenger_count,
                available,
            });
        }

        // 5. Insert and decrement under the same lock
        collections
            .reservations
            .insert(reservation.id, reservation.clone());
        if let Some(trip) = collections.trips.get_mut(&reservation.trip_id) {
            trip.seats_available -= reservation.passenger_count;
        }
        Ok(())
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<Reservation>> {
        let collections = self.inner.lock().await;
        Ok(collections.reservations.get(&reservation_id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>> {
        let collections = self.inner.lock().await;
        let mut matches: Vec<&Reservation> = collections
            .reservations
            .values()
            .filter(|r| r.code == code)
            .collect();
        matches.sort_by_key(|r| r.created_at);
        Ok(matches.first().map(|r| (*r).clone()))
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        statuses: &[ReservationStatus],
    ) -> StoreResult<Vec<Reservation>> {
        let collections = self.inner.lock().await;
        Ok(collections
            .reservations
            .values()
            .filter(|r| r.user_id == user_id && statuses.contains(&r.status))
            .cloned()
            .collect())
    }

    async fn list_active_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let collections = self.inner.lock().await;
        Ok(collections
            .reservations
            .values()
            .filter(|r| r.trip_id == trip_id && r.status.is_active())
            .cloned()
            .collect())
    }

    async fn release_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation> {
        let mut collections = self.inner.lock().await;

        let (trip_id, passenger_count, status) = {
            let reservation = collections
                .reservations
                .get(&reservation_id)
                .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation_id)))?;
            (
                reservation.trip_id,
                reservation.passenger_count,
                reservation.status,
            )
        };

        if !status.is_active() {
            return Err(StoreError::InactiveReservation(reservation_id.to_string()));
        }

        if let Some(reservation) = collections.reservations.get_mut(&reservation_id) {
            reservation.status = ReservationStatus::Cancelled;
        }
        if let Some(trip) = collections.trips.get_mut(&trip_id) {
            trip.seats_available = (trip.seats_available + passenger_count).min(trip.seats_total);
        }

        collections
            .reservations
            .get(&reservation_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation_id)))
    }

    async fn set_status(
        &self,
        reservation_id: Uuid,
        status: ReservationStatus,
    ) -> StoreResult<()> {
        let mut collections = self.inner.lock().await;
        let reservation = collections
            .reservations
            .get_mut(&reservation_id)
            .ok_or_else(|| StoreError::NotFound(format!("reservation {}", reservation_id)))?;

        if !reservation.status.is_active() {
            return Err(StoreError::InactiveReservation(reservation_id.to_string()));
        }
        reservation.status = status;
        Ok(())
    }

    async fn list_active_departed(&self, now: DateTime<Utc>) -> StoreResult<Vec<Reservation>> {
        let collections = self.inner.lock().await;
        Ok(collections
            .reservations
            .values()
            .filter(|r| r.status.is_active() && r.trip.departure_time < now)
            .cloned()
            .collect())
    }
}
