use std::sync::Arc;

use rapida_booking::{ReservationService, SeatOccupancy};
use rapida_catalog::{AvailabilityTracker, TripCatalog};
use rapida_store::app_config::BookingRules;

#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<TripCatalog>,
    pub tracker: Arc<AvailabilityTracker>,
    pub occupancy: Arc<SeatOccupancy>,
    pub reservations: Arc<ReservationService>,
    pub auth: AuthSettings,
    pub rules: BookingRules,
}
