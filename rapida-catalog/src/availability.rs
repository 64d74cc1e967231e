use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use rapida_core::TripStore;

use crate::CatalogError;

/// Owns the `seats_available` counter per trip. Every adjustment goes through
/// the store's conditional update, so two trackers racing on the same trip
/// cannot drive the counter out of `0..=seats_total`.
pub struct AvailabilityTracker {
    trips: Arc<dyn TripStore>,
}

impl AvailabilityTracker {
    pub fn new(trips: Arc<dyn TripStore>) -> Self {
        Self { trips }
    }

    /// Advisory read: whether the trip can currently seat `requested` more
    /// passengers. Booking itself re-checks under the store transaction, so
    /// a `true` here is a hint, not a hold.
    pub async fn has_capacity(&self, trip_id: Uuid, requested: i32) -> Result<bool, CatalogError> {
        let trip = self
            .trips
            .get_trip(trip_id)
            .await?
            .ok_or(CatalogError::NotFound)?;
        Ok(trip.has_capacity(requested))
    }

    /// Take `count` seats out of availability
    pub async fn reserve_seats(&self, trip_id: Uuid, count: i32) -> Result<i32, CatalogError> {
        let remaining = self.trips.adjust_seats(trip_id, -count).await?;
        info!(%trip_id, count, remaining, "seats reserved");
        Ok(remaining)
    }

    /// Return `count` seats to availability
    pub async fn release_seats(&self, trip_id: Uuid, count: i32) -> Result<i32, CatalogError> {
        let remaining = self.trips.adjust_seats(trip_id, count).await?;
        info!(%trip_id, count, remaining, "seats released");
        Ok(remaining)
    }
}
