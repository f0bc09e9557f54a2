use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::models::SeatCode;
use crate::services::layout::LayoutError;
use crate::store::StoreError;

/// Ошибки операций с инвентарём мест.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("show {0} not found")]
    ShowNotFound(i64),
    /// Отмена чужой брони тоже отвечает этой ошибкой.
    #[error("booking {0} not found")]
    NotFound(i64),
    #[error("booking {0} not found")]
    BookingNotFound(i64),
    #[error("booking {0} belongs to another user")]
    BookingNotOwned(i64),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid seat selection: {reason}")]
    InvalidSeatSelection { reason: String, invalid: Vec<String> },
    #[error("seats unavailable: {}", join_seats(.seats))]
    SeatsUnavailable { seats: Vec<SeatCode> },
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn join_seats(seats: &[SeatCode]) -> String {
    seats.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

impl BookingError {
    pub fn code(&self) -> &'static str {
        match self {
            BookingError::ShowNotFound(_) => "SHOW_NOT_FOUND",
            BookingError::NotFound(_) | BookingError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            BookingError::BookingNotOwned(_) => "BOOKING_NOT_OWNED",
            BookingError::InvalidInput(_) => "INVALID_INPUT",
            BookingError::InvalidSeatSelection { .. } => "INVALID_SEAT_SELECTION",
            BookingError::SeatsUnavailable { .. } => "SEATS_UNAVAILABLE",
            BookingError::InvalidState(_) => "INVALID_STATE",
            BookingError::Layout(_) => "INVALID_LAYOUT",
            BookingError::Store(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::ShowNotFound(_)
            | BookingError::NotFound(_)
            | BookingError::BookingNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::BookingNotOwned(_) => StatusCode::FORBIDDEN,
            BookingError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            BookingError::InvalidSeatSelection { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::SeatsUnavailable { .. } | BookingError::InvalidState(_) => {
                StatusCode::CONFLICT
            }
            BookingError::Layout(_) | BookingError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflicting_seats: Option<Vec<SeatCode>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invalid_seats: Option<Vec<String>>,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Детали ошибок хранилища наружу не отдаём
        let message = match &self {
            BookingError::Store(e) => {
                tracing::error!("store failure: {:?}", e);
                "Internal server error".to_string()
            }
            BookingError::Layout(e) => {
                tracing::error!("screen layout misconfigured: {}", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ApiError {
            success: false,
            error: self.code(),
            message,
            conflicting_seats: match &self {
                BookingError::SeatsUnavailable { seats } => Some(seats.clone()),
                _ => None,
            },
            invalid_seats: match self {
                BookingError::InvalidSeatSelection { invalid, .. } => Some(invalid),
                _ => None,
            },
        };

        (status, Json(body)).into_response()
    }
}
