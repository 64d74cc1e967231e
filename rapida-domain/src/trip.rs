use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

/// Service tier of a departure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTier {
    Economy,
    Vip,
    Suite,
}

impl ServiceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceTier::Economy => "ECONOMY",
            ServiceTier::Vip => "VIP",
            ServiceTier::Suite => "SUITE",
        }
    }
}

impl std::str::FromStr for ServiceTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ECONOMY" => Ok(ServiceTier::Economy),
            "VIP" => Ok(ServiceTier::Vip),
            "SUITE" => Ok(ServiceTier::Suite),
            other => Err(format!("unknown service tier: {}", other)),
        }
    }
}

/// A scheduled bus departure with fixed seat capacity and price
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: Uuid,
    pub origin: String,
    pub destination: String,
    pub company: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time_label: String,
    pub duration_label: String,
    pub service_tier: ServiceTier,
    /// Price per seat in cents
    pub price_amount: i64,
    pub price_currency: String,
    pub seats_total: i32,
    pub seats_available: i32,
    pub amenities: Vec<String>,
    pub active: bool,
    pub image_url: Option<String>,
}

impl Trip {
    /// Whether the trip can still seat `requested` more passengers
    pub fn has_capacity(&self, requested: i32) -> bool {
        self.seats_available >= requested
    }

    /// Occupied share of the bus, 0-100
    pub fn occupancy_percent(&self) -> i32 {
        if self.seats_total == 0 {
            return 0;
        }
        let occupied = self.seats_total - self.seats_available;
        (occupied * 100) / self.seats_total
    }

    pub fn route(&self) -> String {
        format!("{} → {}", self.origin, self.destination)
    }

    pub fn has_departed(&self, now: DateTime<Utc>) -> bool {
        self.departure_time < now
    }
}
