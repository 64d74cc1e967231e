use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use rapida_booking::BookingError;
use rapida_catalog::CatalogError;

#[derive(Debug)]
pub enum AppError {
    Booking(BookingError),
    Catalog(CatalogError),
    BadRequest(String),
    InternalServerError(String),
}

impl From<BookingError> for AppError {
    fn from(e: BookingError) -> Self {
        AppError::Booking(e)
    }
}

impl From<CatalogError> for AppError {
    fn from(e: CatalogError) -> Self {
        AppError::Catalog(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Booking(e) => {
                let status = match &e {
                    BookingError::Unauthenticated => StatusCode::UNAUTHORIZED,
                    BookingError::InvalidPassengerCount { .. }
                    | BookingError::InvalidPassengerData { .. }
                    | BookingError::InvalidPrice
                    | BookingError::DuplicateSeatInRequest { .. } => StatusCode::BAD_REQUEST,
                    BookingError::SeatUnavailable { .. }
                    | BookingError::InsufficientSeats { .. }
                    | BookingError::CancellationWindowExpired { .. } => StatusCode::CONFLICT,
                    BookingError::NotFound => StatusCode::NOT_FOUND,
                    BookingError::StoreUnavailable(msg) => {
                        tracing::error!("store failure: {}", msg);
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                (status, e.to_string())
            }
            AppError::Catalog(e) => {
                let status = match &e {
                    CatalogError::NotFound => StatusCode::NOT_FOUND,
                    CatalogError::InvalidRoute(_) => StatusCode::BAD_REQUEST,
                    CatalogError::InsufficientSeats { .. } => StatusCode::CONFLICT,
                    CatalogError::StoreUnavailable(msg) => {
                        tracing::error!("store failure: {}", msg);
                        StatusCode::SERVICE_UNAVAILABLE
                    }
                };
                (status, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
