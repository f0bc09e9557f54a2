use crate::error::BookingError;
use crate::models::BookingDetails;
use crate::store::BookingStore;

/// Брони `user_id` во всех статусах, новые первыми.
pub async fn my_bookings(
    store: &dyn BookingStore,
    user_id: i64,
) -> Result<Vec<BookingDetails>, BookingError> {
    Ok(store.user_bookings(user_id).await?)
}

/// Одна бронь с местами. Чужая бронь считается несуществующей.
pub async fn booking_detail(
    store: &dyn BookingStore,
    user_id: i64,
    booking_id: i64,
) -> Result<BookingDetails, BookingError> {
    store
        .booking_details(booking_id)
        .await?
        .filter(|details| details.booking.user_id == user_id)
        .ok_or(BookingError::NotFound(booking_id))
}
