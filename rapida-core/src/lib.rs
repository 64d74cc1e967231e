pub mod store;
pub mod identity;
pub mod validation;

pub use store::{ReservationStore, TripStore};
pub use identity::IdentityProvider;

/// Errors surfaced by the persistence boundary. Conflict variants are produced
/// by the transactional operations so callers can distinguish "the store said
/// no" from "the store is down".
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("seat {seat} is already taken")]
    SeatTaken { seat: String },

    #[error("insufficient seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: i32, available: i32 },

    #[error("booking code already exists: {0}")]
    DuplicateCode(String),

    #[error("reservation is no longer active: {0}")]
    InactiveReservation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
