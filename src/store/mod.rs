//! Слой хранения инвентаря мест.
//!
//! Любая запись идёт через хэндл блокировки из [`BookingStore`]: [`ShowLock`]
//! сериализует всё, что может занять места сеанса, [`BookingLock`] держит одну
//! строку брони. Хэндл коммитит только своим завершающим методом; если его
//! просто дропнуть, единица работы откатывается и блокировка снимается.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::models::{
    Booking, BookingDetails, BookingReceipt, NewBooking, NewPayment, Payment, SeatCode, ShowSeating,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored seat code {0:?} is malformed")]
    CorruptSeatCode(String),
    #[error("lock handle was already consumed")]
    HandleConsumed,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Занятые места сеанса, прочитанные в одной точке времени.
#[derive(Debug, Clone)]
pub struct SeatSnapshot {
    pub total_seats: i32,
    pub booked: HashSet<SeatCode>,
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Вместимость и подтверждённые места сеанса из одной точки чтения.
    /// `None`, если сеанса нет.
    async fn seat_snapshot(&self, show_id: i64) -> StoreResult<Option<SeatSnapshot>>;

    /// Берёт блокировку бронирования сеанса. `None`, если сеанса нет.
    async fn lock_show(&self, show_id: i64) -> StoreResult<Option<Box<dyn ShowLock>>>;

    /// Берёт блокировку строки брони. `None`, если брони нет.
    async fn lock_booking(&self, booking_id: i64) -> StoreResult<Option<Box<dyn BookingLock>>>;

    /// Брони пользователя, новые первыми.
    async fn user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingDetails>>;

    async fn booking_details(&self, booking_id: i64) -> StoreResult<Option<BookingDetails>>;

    async fn booking_payments(&self, booking_id: i64) -> StoreResult<Vec<Payment>>;
}

#[async_trait]
pub trait ShowLock: Send {
    fn show(&self) -> &ShowSeating;

    /// Места, занятые подтверждёнными бронями заблокированного сеанса.
    async fn confirmed_seats(&mut self) -> StoreResult<HashSet<SeatCode>>;

    /// Вставляет подтверждённую бронь, по строке на место, и коммитит.
    async fn commit_booking(&mut self, booking: NewBooking) -> StoreResult<BookingReceipt>;
}

#[async_trait]
pub trait BookingLock: Send {
    fn booking(&self) -> &Booking;

    fn show_starts_at(&self) -> DateTime<Utc>;

    /// Переводит бронь в `cancelled`, пишет журнал отмен и коммитит.
    async fn commit_cancellation(&mut self, user_id: i64, reason: &str) -> StoreResult<()>;

    /// Вставляет платёж по брони и коммитит.
    async fn commit_payment(&mut self, payment: NewPayment) -> StoreResult<i64>;
}

pub(crate) fn parse_stored_seats<I>(raw: I) -> StoreResult<Vec<SeatCode>>
where
    I: IntoIterator<Item = String>,
{
    raw.into_iter()
        .map(|code| code.parse().map_err(|_| StoreError::CorruptSeatCode(code)))
        .collect()
}
