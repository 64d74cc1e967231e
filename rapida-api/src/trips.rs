use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rapida_catalog::trips::{filter_by_tier, sort_by_departure, sort_by_price};
use rapida_domain::seats::all_seats;
use rapida_domain::{ServiceTier, Trip};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/trips/search", get(search_trips))
        .route("/v1/trips/{trip_id}", get(get_trip))
        .route("/v1/trips/{trip_id}/seats", get(get_seat_map))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    origin: String,
    destination: String,
    /// Calendar day of departure, YYYY-MM-DD
    date: NaiveDate,
    tier: Option<ServiceTier>,
    sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SortOrder {
    PriceAsc,
    PriceDesc,
    Departure,
}

async fn search_trips(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Trip>>, AppError> {
    let mut trips = state
        .catalog
        .search(&params.origin, &params.destination, params.date)
        .await?;

    if let Some(tier) = params.tier {
        trips = filter_by_tier(&trips, tier);
    }
    match params.sort {
        Some(SortOrder::PriceAsc) => sort_by_price(&mut trips, true),
        Some(SortOrder::PriceDesc) => sort_by_price(&mut trips, false),
        Some(SortOrder::Departure) | None => sort_by_departure(&mut trips),
    }

    Ok(Json(trips))
}

async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<Trip>, AppError> {
    let trip = state.catalog.get(trip_id).await?;
    Ok(Json(trip))
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    trip_id: Uuid,
    seats_total: i32,
    seats_available: i32,
    occupied: Vec<String>,
    free: Vec<String>,
}

/// Occupancy for the seat-selection screen. Fails closed: when the resolver
/// cannot answer, the client gets an error instead of an empty bus.
async fn get_seat_map(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let trip = state.catalog.get(trip_id).await?;
    let occupied = state.occupancy.occupied_seats(trip_id).await?;

    let free: Vec<String> = all_seats()
        .into_iter()
        .filter(|s| !occupied.contains(s))
        .collect();

    Ok(Json(SeatMapResponse {
        trip_id,
        seats_total: trip.seats_total,
        seats_available: trip.seats_available,
        occupied: occupied.into_iter().collect(),
        free,
    }))
}
