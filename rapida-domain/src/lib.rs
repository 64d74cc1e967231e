pub mod trip;
pub mod reservation;
pub mod passenger;
pub mod seats;

pub use trip::{ServiceTier, Trip};
pub use reservation::{PaymentMethod, Reservation, ReservationStatus, TripSnapshot};
pub use passenger::Passenger;
