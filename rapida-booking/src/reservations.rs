use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use rapida_core::validation::validate_passenger;
use rapida_core::{IdentityProvider, ReservationStore, StoreError};
use rapida_domain::{
    Passenger, PaymentMethod, Reservation, ReservationStatus, TripSnapshot,
};
use rapida_store::app_config::BookingRules;

use crate::codes::generate_code;
use crate::occupancy::SeatOccupancy;
use crate::BookingError;

/// Attempts at a fresh booking code before giving up on a persistent collision
const CODE_ATTEMPTS: u32 = 3;

/// Everything the caller provides to book seats. Price and trip snapshot come
/// from the trip the caller selected; both are frozen into the reservation.
#[derive(Debug, Clone)]
pub struct CreateReservationRequest {
    pub trip_id: Uuid,
    pub passengers: Vec<Passenger>,
    /// Price per seat in cents
    pub price_amount: i64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub trip: TripSnapshot,
}

/// Creates, cancels and queries reservations, enforcing the lifecycle:
/// Pending/Confirmed may move to Cancelled (within the cutoff window) or to
/// Completed (departure sweep); Cancelled and Completed are terminal.
pub struct ReservationService {
    store: Arc<dyn ReservationStore>,
    occupancy: Arc<SeatOccupancy>,
    rules: BookingRules,
}

impl ReservationService {
    pub fn new(
        store: Arc<dyn ReservationStore>,
        occupancy: Arc<SeatOccupancy>,
        rules: BookingRules,
    ) -> Self {
        Self {
            store,
            occupancy,
            rules,
        }
    }

    /// Validate and book. Checks run before any write, first failure wins:
    /// party size, per-passenger fields, no seat requested twice, positive
    /// price, authenticated caller. The occupancy pre-check gives early
    /// feedback; the store transaction re-checks seats and capacity while
    /// inserting and decrementing, so racing callers cannot both win.
    pub async fn create(
        &self,
        identity: &dyn IdentityProvider,
        req: CreateReservationRequest,
    ) -> Result<Reservation, BookingError> {
        let count = req.passengers.len() as i32;
        if count < 1 || count > self.rules.max_passengers_per_reservation {
            return Err(BookingError::InvalidPassengerCount {
                max: self.rules.max_passengers_per_reservation,
            });
        }

        for (index, passenger) in req.passengers.iter().enumerate() {
            validate_passenger(passenger)
                .map_err(|source| BookingError::InvalidPassengerData { index, source })?;
        }

        let mut seen = BTreeSet::new();
        for passenger in &req.passengers {
            if !seen.insert(passenger.seat.as_str()) {
                return Err(BookingError::DuplicateSeatInRequest {
                    seat: passenger.seat.clone(),
                });
            }
        }

        let total_amount = req.price_amount * count as i64;
        if total_amount <= 0 {
            return Err(BookingError::InvalidPrice);
        }

        let user_id = identity
            .current_user_id()
            .ok_or(BookingError::Unauthenticated)?;

        let occupied = self.occupancy.occupied_seats(req.trip_id).await?;
        for passenger in &req.passengers {
            if occupied.contains(&passenger.seat) {
                return Err(BookingError::SeatUnavailable {
                    seat: passenger.seat.clone(),
                });
            }
        }

        let mut attempt = 0;
        loop {
            let now = Utc::now();
            let reservation = Reservation {
                id: Uuid::new_v4(),
                user_id: user_id.clone(),
                trip_id: req.trip_id,
                passengers: req.passengers.clone(),
                passenger_count: count,
                total_amount,
                currency: req.currency.clone(),
                created_at: now,
                status: ReservationStatus::Confirmed,
                payment_method: req.payment_method,
                code: generate_code(now),
                trip: req.trip.clone(),
            };

            match self.store.commit_reservation(&reservation).await {
                Ok(()) => {
                    info!(
                        reservation_id = %reservation.id,
                        trip_id = %reservation.trip_id,
                        code = %reservation.code,
                        passengers = count,
                        "reservation confirmed"
                    );
                    return Ok(reservation);
                }
                Err(StoreError::DuplicateCode(code)) => {
                    attempt += 1;
                    warn!(code = %code, attempt, "booking code collision, regenerating");
                    if attempt >= CODE_ATTEMPTS {
                        return Err(StoreError::DuplicateCode(code).into());
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Cancel an active reservation, allowed until `cancellation_cutoff_hours`
    /// whole hours before departure: exactly at the cutoff still cancels, one
    /// hour later does not. The state flip and the seat return are one store
    /// transaction; a reservation that is already Cancelled or Completed
    /// reports NotFound and never touches the counter again.
    pub async fn cancel(&self, reservation_id: Uuid) -> Result<(), BookingError> {
        let reservation = self
            .store
            .get_reservation(reservation_id)
            .await?
            .ok_or(BookingError::NotFound)?;

        if !reservation.is_active() {
            return Err(BookingError::NotFound);
        }

        let hours_remaining = reservation.hours_until_departure(Utc::now());
        if hours_remaining < self.rules.cancellation_cutoff_hours {
            return Err(BookingError::CancellationWindowExpired {
                hours_remaining,
                cutoff: self.rules.cancellation_cutoff_hours,
            });
        }

        let released = self.store.release_reservation(reservation_id).await?;
        info!(
            reservation_id = %released.id,
            trip_id = %released.trip_id,
            seats_returned = released.passenger_count,
            "reservation cancelled"
        );
        Ok(())
    }

    /// Upcoming reservations: pending or confirmed, trip not yet departed,
    /// soonest departure first
    pub async fn list_active(&self, user_id: &str) -> Result<Vec<Reservation>, BookingError> {
        let now = Utc::now();
        let mut reservations = self
            .store
            .list_for_user(
                user_id,
                &[ReservationStatus::Pending, ReservationStatus::Confirmed],
            )
            .await?;
        reservations.retain(|r| !r.has_departed(now));
        reservations.sort_by_key(|r| r.trip.departure_time);
        Ok(reservations)
    }

    /// Past reservations: completed or cancelled, most recently created first
    pub async fn list_history(&self, user_id: &str) -> Result<Vec<Reservation>, BookingError> {
        let mut reservations = self
            .store
            .list_for_user(
                user_id,
                &[ReservationStatus::Completed, ReservationStatus::Cancelled],
            )
            .await?;
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reservations)
    }

    pub async fn get(&self, reservation_id: Uuid) -> Result<Reservation, BookingError> {
        self.store
            .get_reservation(reservation_id)
            .await?
            .ok_or(BookingError::NotFound)
    }

    pub async fn find_by_code(&self, code: &str) -> Result<Reservation, BookingError> {
        self.store
            .find_by_code(code)
            .await?
            .ok_or(BookingError::NotFound)
    }

    /// Mark every active reservation whose trip has departed as Completed.
    /// Returns how many were moved. Seat counters are untouched; the bus has
    /// already left.
    pub async fn complete_departed(&self) -> Result<usize, BookingError> {
        let now = Utc::now();
        let departed = self.store.list_active_departed(now).await?;
        let mut completed = 0;
        for reservation in departed {
            match self
                .store
                .set_status(reservation.id, ReservationStatus::Completed)
                .await
            {
                Ok(()) => completed += 1,
                // Lost a race with a concurrent cancel or sweep; skip it
                Err(StoreError::InactiveReservation(_)) => {}
                Err(e) => return Err(e.into()),
            }
        }
        if completed > 0 {
            info!(completed, "departure sweep finished");
        }
        Ok(completed)
    }
}
