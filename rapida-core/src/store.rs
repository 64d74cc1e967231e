use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use rapida_domain::{Reservation, ReservationStatus, Trip};

use crate::StoreResult;

/// Repository trait for trip data access
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn get_trip(&self, trip_id: Uuid) -> StoreResult<Option<Trip>>;

    /// Active trips matching origin and destination, departing on `date`,
    /// ordered by departure time ascending
    async fn search_trips(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> StoreResult<Vec<Trip>>;

    /// All active trips ordered by departure time ascending
    async fn list_active_trips(&self) -> StoreResult<Vec<Trip>>;

    /// Used by trip-management tooling and test fixtures
    async fn insert_trip(&self, trip: &Trip) -> StoreResult<()>;

    /// Apply `delta` to `seats_available` in a single conditional update.
    /// The write only lands if the result stays within `0..=seats_total`;
    /// otherwise `InsufficientSeats`. Returns the new count.
    async fn adjust_seats(&self, trip_id: Uuid, delta: i32) -> StoreResult<i32>;
}

/// Repository trait for reservation data access
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Persist a new reservation and decrement the trip's seat counter as one
    /// transaction. Inside the same transaction the store re-checks, against
    /// active reservations on the trip, that none of the requested seats is
    /// taken (`SeatTaken`), that capacity covers the party
    /// (`InsufficientSeats`), and that the booking code is unused
    /// (`DuplicateCode`). Concurrent commits on the same trip serialize here.
    async fn commit_reservation(&self, reservation: &Reservation) -> StoreResult<()>;

    async fn get_reservation(&self, reservation_id: Uuid) -> StoreResult<Option<Reservation>>;

    /// Exact-match lookup by booking code; first document wins if the code
    /// was ever duplicated
    async fn find_by_code(&self, code: &str) -> StoreResult<Option<Reservation>>;

    /// Reservations owned by `user_id` in any of `statuses`, unordered;
    /// callers sort per view
    async fn list_for_user(
        &self,
        user_id: &str,
        statuses: &[ReservationStatus],
    ) -> StoreResult<Vec<Reservation>>;

    /// Pending and confirmed reservations on a trip (the occupancy source)
    async fn list_active_for_trip(&self, trip_id: Uuid) -> StoreResult<Vec<Reservation>>;

    /// Flip an active reservation to Cancelled and return its seats to the
    /// trip counter as one transaction. A reservation that is already
    /// Cancelled or Completed fails with `InactiveReservation` and the
    /// counter is untouched. Returns the cancelled reservation.
    async fn release_reservation(&self, reservation_id: Uuid) -> StoreResult<Reservation>;

    /// Guarded status update: only Pending/Confirmed reservations may move,
    /// so Cancelled and Completed stay terminal. Does not touch seat
    /// counters; used by the departure sweep.
    async fn set_status(&self, reservation_id: Uuid, status: ReservationStatus) -> StoreResult<()>;

    /// Active reservations whose trip departed before `now`, feeding the
    /// completion sweep
    async fn list_active_departed(&self, now: DateTime<Utc>) -> StoreResult<Vec<Reservation>>;
}
