//! Привязка платежей: результат внешнего платёжного авторизатора
//! записывается к подтверждённой брони. Бронь и места не меняются.

use rust_decimal::Decimal;
use tracing::info;

use crate::error::BookingError;
use crate::models::{BookingStatus, NewPayment, Payment, PaymentStatus};
use crate::store::BookingStore;

#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub booking_id: i64,
    pub amount: Decimal,
    pub mode: String,
    pub status: PaymentStatus,
}

pub async fn record_payment(
    store: &dyn BookingStore,
    user_id: i64,
    request: PaymentRequest,
) -> Result<i64, BookingError> {
    if request.amount <= Decimal::ZERO {
        return Err(BookingError::InvalidInput(format!(
            "payment amount must be positive, got {}",
            request.amount
        )));
    }

    let booking_id = request.booking_id;
    let mut lock = store
        .lock_booking(booking_id)
        .await?
        .ok_or(BookingError::BookingNotFound(booking_id))?;

    if lock.booking().user_id != user_id {
        return Err(BookingError::BookingNotOwned(booking_id));
    }
    if lock.booking().status != BookingStatus::Confirmed {
        return Err(BookingError::InvalidState(format!(
            "booking {booking_id} is not confirmed"
        )));
    }

    let status = request.status;
    let payment_id = lock
        .commit_payment(NewPayment {
            booking_id,
            amount: request.amount,
            mode: request.mode,
            status,
        })
        .await?;

    info!(
        "payment {} recorded for booking {} ({:?})",
        payment_id, booking_id, status
    );
    Ok(payment_id)
}

/// Платежи по брони пользователя `user_id`, старые первыми.
pub async fn payments_for(
    store: &dyn BookingStore,
    user_id: i64,
    booking_id: i64,
) -> Result<Vec<Payment>, BookingError> {
    let details = store
        .booking_details(booking_id)
        .await?
        .ok_or(BookingError::BookingNotFound(booking_id))?;
    if details.booking.user_id != user_id {
        return Err(BookingError::BookingNotOwned(booking_id));
    }

    Ok(store.booking_payments(booking_id).await?)
}
