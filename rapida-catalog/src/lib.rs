pub mod trips;
pub mod availability;

pub use availability::AvailabilityTracker;
pub use trips::TripCatalog;

use rapida_core::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("trip not found")]
    NotFound,

    #[error("invalid route: {0}")]
    InvalidRoute(String),

    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for CatalogError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => CatalogError::NotFound,
            StoreError::InsufficientSeats {
                requested,
                available,
            } => CatalogError::InsufficientSeats {
                requested,
                available,
            },
            other => CatalogError::StoreUnavailable(other.to_string()),
        }
    }
}
