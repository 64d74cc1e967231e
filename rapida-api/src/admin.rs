//! Operations surface for trip-management tooling: seed departures, correct
//! seat counters, run the departure sweep.

use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rapida_domain::{ServiceTier, Trip};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/trips", post(create_trip))
        .route("/v1/admin/trips/{trip_id}/seats", post(adjust_seats))
        .route("/v1/admin/sweep", post(run_sweep))
}

#[derive(Debug, Deserialize)]
struct CreateTripBody {
    origin: String,
    destination: String,
    company: String,
    departure_time: DateTime<Utc>,
    arrival_time_label: String,
    duration_label: String,
    service_tier: ServiceTier,
    price_amount: i64,
    price_currency: String,
    seats_total: i32,
    amenities: Vec<String>,
    image_url: Option<String>,
}

async fn create_trip(
    State(state): State<AppState>,
    Json(body): Json<CreateTripBody>,
) -> Result<Json<Trip>, AppError> {
    if body.seats_total <= 0 {
        return Err(AppError::BadRequest("seats_total must be positive".to_string()));
    }
    if body.price_amount < 0 {
        return Err(AppError::BadRequest("price_amount must not be negative".to_string()));
    }

    let trip = Trip {
        id: Uuid::new_v4(),
        origin: body.origin,
        destination: body.destination,
        company: body.company,
        departure_time: body.departure_time,
        arrival_time_label: body.arrival_time_label,
        duration_label: body.duration_label,
        service_tier: body.service_tier,
        price_amount: body.price_amount,
        price_currency: body.price_currency,
        seats_total: body.seats_total,
        seats_available: body.seats_total,
        amenities: body.amenities,
        active: true,
        image_url: body.image_url,
    };

    state.catalog.insert(&trip).await?;
    Ok(Json(trip))
}

#[derive(Debug, Deserialize)]
struct AdjustSeatsBody {
    /// Negative takes seats out of availability, positive returns them
    delta: i32,
}

#[derive(Debug, Serialize)]
struct AdjustSeatsResponse {
    trip_id: Uuid,
    seats_available: i32,
}

async fn adjust_seats(
    State(state): State<AppState>,
    Path(trip_id): Path<Uuid>,
    Json(body): Json<AdjustSeatsBody>,
) -> Result<Json<AdjustSeatsResponse>, AppError> {
    let seats_available = if body.delta < 0 {
        state.tracker.reserve_seats(trip_id, -body.delta).await?
    } else {
        state.tracker.release_seats(trip_id, body.delta).await?
    };

    Ok(Json(AdjustSeatsResponse {
        trip_id,
        seats_available,
    }))
}

#[derive(Debug, Serialize)]
struct SweepResponse {
    completed: usize,
}

async fn run_sweep(State(state): State<AppState>) -> Result<Json<SweepResponse>, AppError> {
    let completed = state.reservations.complete_departed().await?;
    Ok(Json(SweepResponse { completed }))
}
