use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::SeatCode;

/// Жизненный цикл брони. Места держат только `confirmed` брони.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn holds_seats(&self) -> bool {
        matches!(self, BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub show_id: i64,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

/// Ответ клиенту на успешное бронирование.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking_id: i64,
    pub total_amount: Decimal,
}

// Данные для вставки: сумма уже посчитана по цене на момент брони
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub user_id: i64,
    pub show_id: i64,
    pub seats: Vec<SeatCode>,
    pub total_amount: Decimal,
}

/// Бронь вместе с местами и данными сеанса: фильм, кинотеатр, зал, начало.
#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub movie_title: String,
    pub theater_name: String,
    pub screen_name: String,
    pub show_starts_at: DateTime<Utc>,
    /// Можно ли отменить бронь прямо сейчас.
    pub can_cancel: bool,
    pub seats: Vec<SeatCode>,
}

/// Отмена возможна только для подтверждённой брони и до начала сеанса.
pub fn can_cancel(
    status: BookingStatus,
    show_starts_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    status == BookingStatus::Confirmed && show_starts_at > now
}
