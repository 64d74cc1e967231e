use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

use crate::passenger::Passenger;

/// Reservation status in the lifecycle
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl ReservationStatus {
    /// Active reservations count against trip capacity
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::Confirmed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Confirmed => "CONFIRMED",
            ReservationStatus::Cancelled => "CANCELLED",
            ReservationStatus::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for ReservationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ReservationStatus::Pending),
            "CONFIRMED" => Ok(ReservationStatus::Confirmed),
            "CANCELLED" => Ok(ReservationStatus::Cancelled),
            "COMPLETED" => Ok(ReservationStatus::Completed),
            other => Err(format!("unknown reservation status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Yape,
    Plin,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::Yape => "YAPE",
            PaymentMethod::Plin => "PLIN",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CASH" => Ok(PaymentMethod::Cash),
            "CARD" => Ok(PaymentMethod::Card),
            "YAPE" => Ok(PaymentMethod::Yape),
            "PLIN" => Ok(PaymentMethod::Plin),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Trip fields copied into the reservation at creation time so listings never
/// need a second lookup and later trip edits don't rewrite history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripSnapshot {
    pub origin: String,
    pub destination: String,
    pub company: String,
    pub departure_time: DateTime<Utc>,
}

/// A booking of one or more seats on a trip by one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: String,
    pub trip_id: Uuid,
    pub passengers: Vec<Passenger>,
    pub passenger_count: i32,
    /// Total price in cents, frozen at creation
    pub total_amount: i64,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub payment_method: PaymentMethod,
    /// Human-readable booking code, e.g. "VR482913KQ7M"
    pub code: String,
    pub trip: TripSnapshot,
}

impl Reservation {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.trip.departure_time < now
    }

    /// The set of seat codes this reservation claims
    pub fn seat_codes(&self) -> BTreeSet<String> {
        self.passengers.iter().map(|p| p.seat.clone()).collect()
    }

    /// Whole hours between `now` and departure; negative for past trips
    pub fn hours_until_departure(&self, now: DateTime<Utc>) -> i64 {
        (self.trip.departure_time - now).num_hours()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(status: ReservationStatus, departure: DateTime<Utc>) -> Reservation {
        Reservation {
            id: Uuid::new_v4(),
            user_id: "user-1".to_string(),
            trip_id: Uuid::new_v4(),
            passengers: vec![
                Passenger::new("Rosa", "Quispe", "45678912", "1A"),
                Passenger::new("Luis", "Quispe", "45678913", "1B"),
            ],
            passenger_count: 2,
            total_amount: 6000,
            currency: "PEN".to_string(),
            created_at: Utc::now(),
            status,
            payment_method: PaymentMethod::Yape,
            code: "VR123456ABCD".to_string(),
            trip: TripSnapshot {
                origin: "Ayacucho".to_string(),
                destination: "Lima".to_string(),
                company: "Vía Rápida".to_string(),
                departure_time: departure,
            },
        }
    }

    #[test]
    fn test_active_states() {
        let departure = Utc::now() + chrono::Duration::days(1);
        assert!(reservation(ReservationStatus::Pending, departure).is_active());
        assert!(reservation(ReservationStatus::Confirmed, departure).is_active());
        assert!(!reservation(ReservationStatus::Cancelled, departure).is_active());
        assert!(!reservation(ReservationStatus::Completed, departure).is_active());
    }

    #[test]
    fn test_seat_codes_collapse_to_set() {
        let r = reservation(ReservationStatus::Confirmed, Utc::now());
        let seats = r.seat_codes();
        assert_eq!(seats.len(), 2);
        assert!(seats.contains("1A"));
        assert!(seats.contains("1B"));
    }

    #[test]
    fn test_hours_until_departure_truncates() {
        let now = Utc::now();
        let r = reservation(ReservationStatus::Confirmed, now + chrono::Duration::minutes(90));
        assert_eq!(r.hours_until_departure(now), 1);

        let past = reservation(ReservationStatus::Confirmed, now - chrono::Duration::hours(3));
        assert!(past.hours_until_departure(now) < 0);
        assert!(past.has_departed(now));
    }
}
