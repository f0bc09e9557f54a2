use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::BookingError,
    middleware::AuthUser,
    models::PaymentStatus,
    services::payment::{self, PaymentRequest},
    AppState,
};

use super::validated;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/payments", post(record_payment))
}

// --- Request/Response структуры ---
#[derive(Debug, Deserialize, Validate)]
pub struct RecordPaymentRequest {
    #[validate(range(min = 1, message = "booking_id must be > 0"))]
    pub booking_id: i64,
    pub amount: Decimal,
    #[validate(length(min = 1, max = 32, message = "mode must be 1..=32 characters"))]
    pub mode: String,
    #[serde(default)]
    pub status: PaymentStatus,
}

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    pub success: bool,
    pub payment_id: i64,
}

/// POST /api/payments
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<impl IntoResponse, BookingError> {
    validated(&req)?;

    let payment_id = payment::record_payment(
        state.store.as_ref(),
        user.user_id,
        PaymentRequest {
            booking_id: req.booking_id,
            amount: req.amount,
            mode: req.mode,
            status: req.status,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordPaymentResponse {
            success: true,
            payment_id,
        }),
    ))
}
