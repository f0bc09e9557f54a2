pub mod bookings;
pub mod payment;
pub mod seats;

use axum::Router;
use std::sync::Arc;
use validator::Validate;

use crate::error::BookingError;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(seats::routes())
        .merge(bookings::routes())
        .merge(payment::routes())
}

// Ошибки валидации DTO -> 400 до обращения к хранилищу
fn validated<T: Validate>(req: &T) -> Result<(), BookingError> {
    req.validate()
        .map_err(|e| BookingError::InvalidInput(e.to_string()))
}

fn positive_id(id: i64, what: &str) -> Result<i64, BookingError> {
    if id <= 0 {
        return Err(BookingError::InvalidInput(format!("{what} must be > 0")));
    }
    Ok(id)
}
