use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::warn;
use uuid::Uuid;

use rapida_core::ReservationStore;

use crate::BookingError;

/// Computes which seats are held by pending or confirmed reservations on a
/// trip. This is the only occupancy code path; the per-seat check is defined
/// on top of the set query so the two can never diverge.
pub struct SeatOccupancy {
    store: Arc<dyn ReservationStore>,
    fail_open: bool,
}

impl SeatOccupancy {
    /// Fail-closed resolver: a store failure blocks booking rather than
    /// treating the bus as empty
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self {
            store,
            fail_open: false,
        }
    }

    pub fn with_fail_open(store: Arc<dyn ReservationStore>, fail_open: bool) -> Self {
        Self { store, fail_open }
    }

    pub async fn occupied_seats(&self, trip_id: Uuid) -> Result<BTreeSet<String>, BookingError> {
        match self.store.list_active_for_trip(trip_id).await {
            Ok(reservations) => Ok(reservations
                .iter()
                .flat_map(|r| r.passengers.iter().map(|p| p.seat.clone()))
                .collect()),
            Err(e) if self.fail_open => {
                warn!(%trip_id, error = %e, "occupancy lookup failed, configured to fail open");
                Ok(BTreeSet::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn is_seat_occupied(&self, trip_id: Uuid, seat: &str) -> Result<bool, BookingError> {
        Ok(self.occupied_seats(trip_id).await?.contains(seat))
    }
}
