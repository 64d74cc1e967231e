pub mod reservations;
pub mod occupancy;
pub mod codes;

pub use occupancy::SeatOccupancy;
pub use reservations::{CreateReservationRequest, ReservationService};

use rapida_core::validation::ValidationError;
use rapida_core::StoreError;

/// Everything the booking flow can answer with. Callers pattern-match; no
/// unstructured errors cross this boundary.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("no authenticated user")]
    Unauthenticated,

    #[error("a reservation must have between 1 and {max} passengers")]
    InvalidPassengerCount { max: i32 },

    #[error("passenger {index}: {source}")]
    InvalidPassengerData {
        index: usize,
        #[source]
        source: ValidationError,
    },

    #[error("total price must be positive")]
    InvalidPrice,

    #[error("seat {seat} is requested twice")]
    DuplicateSeatInRequest { seat: String },

    #[error("seat {seat} is already taken")]
    SeatUnavailable { seat: String },

    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("reservation not found")]
    NotFound,

    #[error("cancellation requires at least {cutoff} hours before departure, {hours_remaining} remain")]
    CancellationWindowExpired { hours_remaining: i64, cutoff: i64 },

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for BookingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(_) => BookingError::NotFound,
            // An already-cancelled or completed reservation behaves as gone
            StoreError::InactiveReservation(_) => BookingError::NotFound,
            StoreError::SeatTaken { seat } => BookingError::SeatUnavailable { seat },
            StoreError::InsufficientSeats {
                requested,
                available,
            } => BookingError::InsufficientSeats {
                requested,
                available,
            },
            StoreError::DuplicateCode(code) => {
                BookingError::StoreUnavailable(format!("booking code collision: {}", code))
            }
            StoreError::Unavailable(msg) => BookingError::StoreUnavailable(msg),
        }
    }
}
