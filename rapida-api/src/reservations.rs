use axum::{
    extract::{Path, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rapida_booking::{BookingError, CreateReservationRequest};
use rapida_catalog::TripCatalog;
use rapida_core::identity::FixedIdentity;
use rapida_domain::{Passenger, PaymentMethod, Reservation, ReservationStatus, TripSnapshot};

use crate::error::AppError;
use crate::middleware::auth::Claims;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/reservations", post(create_reservation))
        .route("/v1/reservations/active", get(list_active))
        .route("/v1/reservations/history", get(list_history))
        .route("/v1/reservations/code/{code}", get(find_by_code))
        .route("/v1/reservations/{reservation_id}", get(get_reservation))
        .route(
            "/v1/reservations/{reservation_id}/cancel",
            post(cancel_reservation),
        )
}

#[derive(Debug, Deserialize)]
struct CreateReservationBody {
    trip_id: Uuid,
    passengers: Vec<Passenger>,
    payment_method: PaymentMethod,
}

async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(body): Json<CreateReservationBody>,
) -> Result<Json<Reservation>, AppError> {
    // 1. The trip decides price and snapshot; the client only picks it
    let trip = state.catalog.get(body.trip_id).await?;

    if !trip.active {
        return Err(AppError::Catalog(rapida_catalog::CatalogError::NotFound));
    }
    if !TripCatalog::is_bookable(trip.departure_time, chrono::Utc::now(), state.rules.max_advance_days) {
        return Err(AppError::BadRequest(
            "trip is not open for booking".to_string(),
        ));
    }

    // 2. Advisory capacity check for fast feedback; the booking transaction
    //    is what actually guarantees no oversell
    let party = body.passengers.len() as i32;
    if party > 0 && !state.tracker.has_capacity(trip.id, party).await? {
        return Err(AppError::Booking(BookingError::InsufficientSeats {
            requested: party,
            available: trip.seats_available,
        }));
    }

    // 3. Book
    let identity = FixedIdentity::user(&claims.sub);
    let reservation = state
        .reservations
        .create(
            &identity,
            CreateReservationRequest {
                trip_id: trip.id,
                passengers: body.passengers,
                price_amount: trip.price_amount,
                currency: trip.price_currency.clone(),
                payment_method: body.payment_method,
                trip: TripSnapshot {
                    origin: trip.origin.clone(),
                    destination: trip.destination.clone(),
                    company: trip.company.clone(),
                    departure_time: trip.departure_time,
                },
            },
        )
        .await?;

    Ok(Json(reservation))
}

#[derive(Debug, Serialize)]
struct CancelResponse {
    reservation_id: Uuid,
    status: ReservationStatus,
}

async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, AppError> {
    state.reservations.cancel(reservation_id).await?;

    Ok(Json(CancelResponse {
        reservation_id,
        status: ReservationStatus::Cancelled,
    }))
}

async fn list_active(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state.reservations.list_active(&claims.sub).await?;
    Ok(Json(reservations))
}

async fn list_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Reservation>>, AppError> {
    let reservations = state.reservations.list_history(&claims.sub).await?;
    Ok(Json(reservations))
}

async fn get_reservation(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.reservations.get(reservation_id).await?;
    Ok(Json(reservation))
}

async fn find_by_code(
    State(state): State<AppState>,
    Extension(_claims): Extension<Claims>,
    Path(code): Path<String>,
) -> Result<Json<Reservation>, AppError> {
    let reservation = state.reservations.find_by_code(&code).await?;
    Ok(Json(reservation))
}
