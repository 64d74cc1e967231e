use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;
use uuid::Uuid;

use rapida_core::TripStore;
use rapida_domain::{ServiceTier, Trip};

use crate::CatalogError;

/// Read-side catalog of departures: search by route and day, plus the
/// in-memory refinements the search screen applies to a result page.
pub struct TripCatalog {
    trips: Arc<dyn TripStore>,
}

impl TripCatalog {
    pub fn new(trips: Arc<dyn TripStore>) -> Self {
        Self { trips }
    }

    /// Active trips on a route for one calendar day, departure ascending
    pub async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Result<Vec<Trip>, CatalogError> {
        if origin.trim().is_empty() {
            return Err(CatalogError::InvalidRoute("origin is required".to_string()));
        }
        if destination.trim().is_empty() {
            return Err(CatalogError::InvalidRoute(
                "destination is required".to_string(),
            ));
        }
        if origin == destination {
            return Err(CatalogError::InvalidRoute(
                "origin and destination must differ".to_string(),
            ));
        }

        let trips = self.trips.search_trips(origin, destination, date).await?;
        info!(origin, destination, %date, results = trips.len(), "trip search");
        Ok(trips)
    }

    pub async fn list_all(&self) -> Result<Vec<Trip>, CatalogError> {
        Ok(self.trips.list_active_trips().await?)
    }

    pub async fn get(&self, trip_id: Uuid) -> Result<Trip, CatalogError> {
        self.trips
            .get_trip(trip_id)
            .await?
            .ok_or(CatalogError::NotFound)
    }

    /// Register a new departure; used by trip-management tooling
    pub async fn insert(&self, trip: &Trip) -> Result<(), CatalogError> {
        self.trips.insert_trip(trip).await?;
        info!(trip_id = %trip.id, origin = %trip.origin, destination = %trip.destination, "trip registered");
        Ok(())
    }

    /// Whether a departure can still be booked: in the future and within the
    /// advance-purchase window
    pub fn is_bookable(departure: DateTime<Utc>, now: DateTime<Utc>, max_advance_days: i64) -> bool {
        let days_until = (departure - now).num_days();
        departure > now && days_until <= max_advance_days
    }
}

/// Narrow a result page to one service tier
pub fn filter_by_tier(trips: &[Trip], tier: ServiceTier) -> Vec<Trip> {
    trips
        .iter()
        .filter(|t| t.service_tier == tier)
        .cloned()
        .collect()
}

pub fn sort_by_price(trips: &mut [Trip], ascending: bool) {
    trips.sort_by_key(|t| t.price_amount);
    if !ascending {
        trips.reverse();
    }
}

pub fn sort_by_departure(trips: &mut [Trip]) {
    trips.sort_by_key(|t| t.departure_time);
}
