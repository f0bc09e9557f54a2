use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::{error::BookingError, services::availability, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/shows/{show_id}/seats", get(get_show_seats))
}

// GET /api/shows/{show_id}/seats
async fn get_show_seats(
    State(state): State<Arc<AppState>>,
    Path(show_id): Path<i64>,
) -> Result<impl IntoResponse, BookingError> {
    if show_id <= 0 {
        return Err(BookingError::InvalidInput("show_id must be > 0".to_string()));
    }

    let seats = availability::resolve(state.store.as_ref(), show_id).await?;
    Ok(Json(seats))
}
