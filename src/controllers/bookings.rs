use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::BookingError,
    middleware::AuthUser,
    services::{booking, cancellation, history, payment},
    AppState,
};

use super::{positive_id, validated};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking).get(get_user_bookings))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/bookings/{id}/payments", get(get_booking_payments))
}

/* ---------- BOOKINGS ---------- */

// POST /api/bookings
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    #[validate(range(min = 1, message = "show_id must be > 0"))]
    pub show_id: i64,
    #[validate(length(min = 1, max = 260, message = "between 1 and 260 seats per booking"))]
    pub seats: Vec<String>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, BookingError> {
    validated(&req)?;

    let receipt = booking::book(state.store.as_ref(), user.user_id, req.show_id, &req.seats).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

// GET /api/bookings
async fn get_user_bookings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<impl IntoResponse, BookingError> {
    let bookings = history::my_bookings(state.store.as_ref(), user.user_id).await?;
    Ok(Json(bookings))
}

// GET /api/bookings/{id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    let id = positive_id(id, "booking id")?;

    let details = history::booking_detail(state.store.as_ref(), user.user_id, id).await?;
    Ok(Json(details))
}

/* ---------- CANCEL ---------- */

// POST /api/bookings/{id}/cancel
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[validate(length(max = 255, message = "reason is too long"))]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct CancelBookingResponse {
    success: bool,
    booking_id: i64,
    outcome: cancellation::CancelOutcome,
}

async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
    body: Bytes,
) -> Result<impl IntoResponse, BookingError> {
    let id = positive_id(id, "booking id")?;

    // Тело необязательное
    let req: CancelBookingRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CancelBookingRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| BookingError::InvalidInput(format!("malformed body: {e}")))?
    };
    validated(&req)?;

    let outcome = cancellation::cancel(
        state.store.as_ref(),
        id,
        user.user_id,
        req.reason.as_deref(),
        Utc::now(),
    )
    .await?;

    Ok(Json(CancelBookingResponse {
        success: true,
        booking_id: id,
        outcome,
    }))
}

/* ---------- PAYMENTS ---------- */

// GET /api/bookings/{id}/payments
async fn get_booking_payments(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    let id = positive_id(id, "booking id")?;

    let payments = payment::payments_for(state.store.as_ref(), user.user_id, id).await?;
    Ok(Json(payments))
}
