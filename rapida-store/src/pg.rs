//! Postgres store. One row per entity in `trips` and `reservations`, with
//! reservation passengers embedded as JSONB and the trip snapshot denormalized
//! into columns. The two multi-step operations take a `FOR UPDATE` lock on the
//! rows they touch, so concurrent commits on the same trip serialize at the
//! database.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use rapida_core::{ReservationStore, StoreError, StoreResult, TripStore};
use rapida_domain::{
    PaymentMethod, Reservation, ReservationStatus, ServiceTier, Trip, TripSnapshot,
};

const ACTIVE_STATUSES: [&str; 2] = ["PENDING", "CONFIRMED"];

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(connection_string: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(connection_string)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        info!("Running database migrations...");
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Migrations completed successfully.");
        Ok(())
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

fn corrupt(what: &str, detail: String) -> StoreError {
    StoreError::Unavailable(format!("corrupt {} document: {}", what, detail))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

// Internal structs for type-safe querying
#[derive(sqlx::FromRow)]
struct TripRow {
    id: Uuid,
    origin: String,
    destination: String,
    company: String,
    departure_time: DateTime<Utc>,
    arrival_time_label: String,
    duration_label: String,
    service_tier: String,
    price_amount: i64,
    price_currency: String,
    seats_total: i32,
    seats_available: i32,
    amenities: serde_json::Value,
    active: bool,
    image_url: Option<String>,
}

impl TripRow {
    fn into_trip(self) -> StoreResult<Trip> {
        let service_tier = ServiceTier::from_str(&self.service_tier)
            .map_err(|e| corrupt("trip", e))?;
        let amenities: Vec<String> = serde_json::from_value(self.amenities)
            .map_err(|e| corrupt("trip", e.to_string()))?;
        Ok(Trip {
            id: self.id,
            origin: self.origin,
            destination: self.destination,
            company: self.company,
            departure_time: self.departure_time,
            arrival_time_label: self.arrival_time_label,
            duration_label: self.duration_label,
            service_tier,
            price_amount: self.price_amount,
            price_currency: self.price_currency,
            seats_total: self.seats_total,
            seats_available: self.seats_available,
            amenities,
            active: self.active,
            image_url: self.image_url,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: Uuid,
    user_id: String,
    trip_id: Uuid,
    passengers: serde_json::Value,
    passenger_count: i32,
    total_amount: i64,
    currency: String,
    created_at: DateTime<Utc>,
    status: String,
    payment_method: String,
    code: String,
    trip_origin: String,
    trip_destination: String,
    trip_company: String,
    trip_departure_time: DateTime<Utc>,
}

impl ReservationRow {
    fn into_reservation(self) -> StoreResult<Reservation> {
        let status = ReservationStatus::from_str(&self.status)
            .map_err(|e| corrupt("reservation", e))?;
        let payment_method = PaymentMethod::from_str(&self.payment_method)
            .map_err(|e| corrupt("reservation", e))?;
        let passengers = serde_json::from_value(self.passengers)
            .map_err(|e| corrupt("reservation", e.to_string()))?;
        Ok(Reservation {
            id: self.id,
            user_id: self.user_id,
            trip_id: self.trip_id,
            passengers,
            passenger_count: self.passenger_count,
            total_amount: self.total_amount,
            currency: self.currency,
            created_at: self.created_at,
            status,
            payment_method,
            code: self.code,
            trip: TripSnapshot {
                origin: self.trip_origin,
                destination: self.trip_destination,
                company: self.trip_company,
                departure_time: self.trip_departure_time,
            },
        })
    }
}

const TRIP_COLUMNS: &str = "id, origin, destination, company, departure_time, arrival_time_label, \
     duration_label, service_tier, price_amount, price_currency, seats_total, seats_available, \
     amenities, active, image_url";

const RESERVATION_COLUMNS: &str = "id, user_id, trip_id, passengers, passenger_count, total_amount, \
     currency, created_at, status, payment_method, code, trip_origin, trip_destination, \
     trip_company, trip_departure_time";

#[async_trait]
impl TripStore for PgStore {
    async fn get_trip(&self, trip_id: Uuid) -> StoreResult<Option<Trip>> {
        let row: Option<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trips WHERE id = $1",
            TRIP_COLUMNS
        ))
        .bind(trip_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(TripRow::into_trip).transpose()
    }

    async fn search_trips(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Trip>> {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + chrono::Duration::days(1);

        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trips \
             WHERE origin = $1 AND destination = $2 \
               AND departure_time >= $3 AND departure_time < $4 \
               AND active = TRUE \
             ORDER BY departure_time ASC",
            TRIP_COLUMNS
        ))
        .bind(origin)
        .bind(destination)
        .bind(day_start)
        .bind(day_end)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(TripRow::into_trip).collect()
    }

    async fn list_active_trips(&self) -> StoreResult<Vec<Trip>> {
        let rows: Vec<TripRow> = sqlx::query_as(&format!(
            "SELECT {} FROM trips WHERE active = TRUE ORDER BY departure_time ASC",
            TRIP_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter().map(TripRow::into_trip).collect()
    }

    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()> {
        let amenities = serde_json::to_value(&trip.amenities)
            .map_err(|e| corrupt("trip", e.to_string()))?;

        sqlx::query(
            "INSERT INTO trips (id, origin, destination, company, departure_time, \
             arrival_time_label, duration_label, service_tier, price_amount, price_currency, \
             seats_total, seats_available, amenities, active, image_url) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(trip.id)
        .bind(&trip.origin)
        .bind(&trip.destination)
        .bind(&trip.company)
        .bind(trip.departure_time)
        .bind(&trip.arrival_time_label)
        .bind(&trip.duration_label)
        .bind(trip.service_tier.as_str())
        .bind(trip.price_amount)
        .bind(&trip.price_currency)
        .bind(trip.seats_total)
        .bind(trip.seats_available)
        .bind(amenities)
        .bind(trip.active)
        .bind(&trip.image_url)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(())
    }

    async fn adjust_seats(&self, trip_id: Uuid, delta: i32) -> StoreResult<i32> {
        // Single conditional update; the WHERE clause keeps the counter in
        // 0..=seats_total no matter how many writers race
        let row = sqlx::query(
            "UPDATE trips SET seats_available = seats_available + $2 \
             WHERE id = $1 \
               AND seats_available + $2 >= 0 \
               AND seats_available + $2 <= seats_total \
             RETURNING seats_available",
        )
        .bind(trip_id)
        .bind(delta)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        if let Some(row) = row {
            return row.try_get::<i32, _>("seats_available").map_err(unavailable);
        }

        // Nothing updated: either the trip is missing or the delta is out of
        // range; look again to report which
        let current: Option<(i32,)> =
            sqlx::query_as("SELECT seats_available FROM trips WHERE id = $1")
                .bind(trip_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        match current {
            None => Err(StoreError::NotFound(format!("trip {}", trip_id))),
            Some((available,)) => Err(StoreError::InsufficientSeats {
                requested: delta.abs(),
                available,
            }),
        }
    }
}

#[async_trait]
impl ReservationStore for PgStore {
    async fn commit_reservation(&self, reservation: &Reservation) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        // 1. Lock the trip row so concurrent commits on this trip serialize
        let seats: Option<(i32,)> = sqlx::query_as(
            "SELECT seats_available FROM trips WHERE id = $1 FOR UPDATE",
        )
        .bind(reservation.trip_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let available = match seats {
            Some((available,)) => available,
            None => {
                return Err(StoreError::NotFound(format!(
                    "trip {}",
                    reservation.trip_id
                )))
            }
        };

        if available < reservation.passenger_count {
            return Err(StoreError::InsufficientSeats {
                requested: reservation.passenger_count,
                available,
            });
        }

        // 2. Re-check seat conflicts against active reservations under the lock
        let held: Vec<(serde_json::Value,)> = sqlx::query_as(
            "SELECT passengers FROM reservations WHERE trip_id = $1 AND status = ANY($2)",
        )
        .bind(reservation.trip_id)
        .bind(ACTIVE_STATUSES.map(String::from).to_vec())
        .fetch_all(&mut *tx)
        .await
        .map_err(unavailable)?;

        for (passengers,) in held {
            let passengers: Vec<rapida_domain::Passenger> = serde_json::from_value(passengers)
                .map_err(|e| corrupt("reservation", e.to_string()))?;
            for held_passenger in &passengers {
                if reservation
                    .passengers
                    .iter()
                    .any(|p| p.seat == held_passenger.seat)
                {
                    return Err(StoreError::SeatTaken {
                        seat: held_passenger.seat.clone(),
                    });
                }
            }
        }

        // 3. Insert; the unique index on code turns races into DuplicateCode
        let passengers = serde_json::to_value(&reservation.passengers)
            .map_err(|e| corrupt("reservation", e.to_string()))?;

        let inserted = sqlx::query(
            "INSERT INTO reservations (id, user_id, trip_id, passengers, passenger_count, \
             total_amount, currency, created_at, status, payment_method, code, trip_origin, \
             trip_destination, trip_company, trip_departure_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(reservation.id)
        .bind(&reservation.user_id)
        .bind(reservation.trip_id)
        .bind(passengers)
        .bind(reservation.passenger_count)
        .bind(reservation.total_amount)
        .bind(&reservation.currency)
        .bind(reservation.created_at)
        .bind(reservation.status.as_str())
        .bind(reservation.payment_method.as_str())
        .bind(&reservation.code)
        .bind(&reservation.trip.origin)
        .bind(&reservation.trip.destination)
        .bind(&reservation.trip.company)
        .bind(reservation.trip.departure_time)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if is_unique_violation(&e) {
                return Err(StoreError::DuplicateCode(reservation.code.clone()));
            }
            return Err(unavailable(e));
        }

        // 4. Decrement the counter inside the same transaction
        let updated = sqlx::query(
            "UPDATE trips SET seats_available = seats_available - $2 \
             WHERE id = $1 AND seats_available >= $2",
        )
        .bind(reservation.trip_id)
        .bind(reservation.passenger_count)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::InsufficientSeats {
                requested: reservation.passenger_count,
                available,
            });
        }

        tx.commit().await.map_err(unavailable)?;
        Ok(())
    }

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1",
            RESERVATION_COLUMNS
        ))
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE code = $1 ORDER BY created_at ASC LIMIT 1",
            RESERVATION_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(unavailable)?;

        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        statuses: &[ReservationStatus],
    ) -> StoreResult<Vec<Reservation>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE user_id = $1 AND status = ANY($2)",
            RESERVATION_COLUMNS
        ))
        .bind(user_id)
        .bind(statuses)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    async fn list_active_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE trip_id = $1 AND status = ANY($2)",
            RESERVATION_COLUMNS
        ))
        .bind(trip_id)
        .bind(ACTIVE_STATUSES.map(String::from).to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }

    async fn release_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row: Option<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE id = $1 FOR UPDATE",
            RESERVATION_COLUMNS
        ))
        .bind(reservation_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(unavailable)?;

        let row = row.ok_or_else(|| {
            StoreError::NotFound(format!("reservation {}", reservation_id))
        })?;
        let mut reservation = row.into_reservation()?;

        if !reservation.status.is_active() {
            return Err(StoreError::InactiveReservation(reservation_id.to_string()));
        }

        sqlx::query("UPDATE reservations SET status = $2 WHERE id = $1")
            .bind(reservation_id)
            .bind(ReservationStatus::Cancelled.as_str())
            .execute(&mut *tx)
            .await
            .map_err(unavailable)?;

        sqlx::query(
            "UPDATE trips \
             SET seats_available = LEAST(seats_total, seats_available + $2) \
             WHERE id = $1",
        )
        .bind(reservation.trip_id)
        .bind(reservation.passenger_count)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;

        reservation.status = ReservationStatus::Cancelled;
        Ok(reservation)
    }

    async fn set_status(
        &self,
        reservation_id: Uuid,
        status: ReservationStatus,
    ) -> StoreResult<()> {
        let updated = sqlx::query(
            "UPDATE reservations SET status = $2 WHERE id = $1 AND status = ANY($3)",
        )
        .bind(reservation_id)
        .bind(status.as_str())
        .bind(ACTIVE_STATUSES.map(String::from).to_vec())
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        if updated.rows_affected() > 0 {
            return Ok(());
        }

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM reservations WHERE id = $1")
                .bind(reservation_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unavailable)?;

        match exists {
            Some(_) => Err(StoreError::InactiveReservation(reservation_id.to_string())),
            None => Err(StoreError::NotFound(format!(
                "reservation {}",
                reservation_id
            ))),
        }
    }

    async fn list_active_departed(&self, now: DateTime<Utc>) -> StoreResult<Vec<Reservation>> {
        let rows: Vec<ReservationRow> = sqlx::query_as(&format!(
            "SELECT {} FROM reservations WHERE status = ANY($1) AND trip_departure_time < $2",
            RESERVATION_COLUMNS
        ))
        .bind(ACTIVE_STATUSES.map(String::from).to_vec())
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        rows.into_iter()
            .map(ReservationRow::into_reservation)
            .collect()
    }
}
