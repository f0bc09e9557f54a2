//! Хранилище броней в памяти процесса.
//!
//! Контракт тот же, что у Postgres: `tokio`-мьютекс на сеанс играет роль
//! блокировки строки сеанса, а коммит применяет все строки единицы работы
//! под одним захватом таблиц, поэтому читатель никогда не видит бронь без мест.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;

use super::{BookingLock, BookingStore, SeatSnapshot, ShowLock, StoreError, StoreResult};
use crate::models::{
    booking::can_cancel, Booking, BookingDetails, BookingReceipt, BookingStatus, NewBooking,
    NewPayment, Payment, SeatCode, ShowSeating,
};

#[derive(Debug, Clone)]
struct ScreenRow {
    theater_id: i64,
    name: String,
    total_seats: i32,
}

#[derive(Debug, Clone)]
struct ShowRow {
    movie_id: i64,
    screen_id: i64,
    price: Decimal,
    starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CancellationEntry {
    pub booking_id: i64,
    pub user_id: i64,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    last_id: i64,
    theaters: HashMap<i64, String>,
    screens: HashMap<i64, ScreenRow>,
    movies: HashMap<i64, String>,
    shows: HashMap<i64, ShowRow>,
    bookings: BTreeMap<i64, Booking>,
    details: Vec<(i64, SeatCode)>,
    payments: Vec<Payment>,
    cancellations: Vec<CancellationEntry>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn show_seating(&self, show_id: i64) -> Option<ShowSeating> {
        let show = self.shows.get(&show_id)?;
        let screen = self.screens.get(&show.screen_id)?;
        Some(ShowSeating {
            show_id,
            total_seats: screen.total_seats,
            price: show.price,
            starts_at: show.starts_at,
        })
    }

    fn confirmed_seats(&self, show_id: i64) -> HashSet<SeatCode> {
        self.details
            .iter()
            .filter(|(booking_id, _)| {
                self.bookings
                    .get(booking_id)
                    .is_some_and(|b| b.show_id == show_id && b.status.holds_seats())
            })
            .map(|(_, seat)| *seat)
            .collect()
    }

    fn details_of(&self, booking: &Booking, now: DateTime<Utc>) -> Option<BookingDetails> {
        let show = self.shows.get(&booking.show_id)?;
        let screen = self.screens.get(&show.screen_id)?;
        let theater_name = self.theaters.get(&screen.theater_id)?;
        let movie_title = self.movies.get(&show.movie_id)?;

        let mut seats: Vec<SeatCode> = self
            .details
            .iter()
            .filter(|(booking_id, _)| *booking_id == booking.id)
            .map(|(_, seat)| *seat)
            .collect();
        seats.sort();

        Some(BookingDetails {
            booking: booking.clone(),
            movie_title: movie_title.clone(),
            theater_name: theater_name.clone(),
            screen_name: screen.name.clone(),
            show_starts_at: show.starts_at,
            can_cancel: can_cancel(booking.status, show.starts_at, now),
            seats,
        })
    }
}

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    show_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl Inner {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn lock_show(&self, show_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.show_locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(show_id).or_default().clone()
        };
        lock.lock_owned().await
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_theater(&self, name: &str) -> i64 {
        let mut tables = self.inner.tables();
        let id = tables.next_id();
        tables.theaters.insert(id, name.to_string());
        id
    }

    /// `None`, если кинотеатра нет.
    pub fn add_screen(&self, theater_id: i64, name: &str, total_seats: i32) -> Option<i64> {
        let mut tables = self.inner.tables();
        if !tables.theaters.contains_key(&theater_id) {
            return None;
        }
        let id = tables.next_id();
        tables.screens.insert(
            id,
            ScreenRow {
                theater_id,
                name: name.to_string(),
                total_seats,
            },
        );
        Some(id)
    }

    pub fn add_movie(&self, title: &str) -> i64 {
        let mut tables = self.inner.tables();
        let id = tables.next_id();
        tables.movies.insert(id, title.to_string());
        id
    }

    /// Ставит сеанс в расписание. `None`, если фильма или зала нет.
    pub fn add_show(
        &self,
        movie_id: i64,
        screen_id: i64,
        price: Decimal,
        starts_at: DateTime<Utc>,
    ) -> Option<i64> {
        let mut tables = self.inner.tables();
        if !tables.movies.contains_key(&movie_id) || !tables.screens.contains_key(&screen_id) {
            return None;
        }
        let id = tables.next_id();
        tables.shows.insert(
            id,
            ShowRow {
                movie_id,
                screen_id,
                price,
                starts_at,
            },
        );
        Some(id)
    }

    pub fn booking(&self, booking_id: i64) -> Option<Booking> {
        self.inner.tables().bookings.get(&booking_id).cloned()
    }

    pub fn booking_count(&self) -> usize {
        self.inner.tables().bookings.len()
    }

    pub fn cancellations(&self) -> Vec<CancellationEntry> {
        self.inner.tables().cancellations.clone()
    }
}

// Хелперы только для юнит-тестов: обходят правила бронирования
#[cfg(test)]
impl MemoryStore {
    /// Кинотеатр, зал на `total_seats` мест, фильм и сеанс одним вызовом.
    pub(crate) fn schedule_show(
        &self,
        total_seats: i32,
        price: Decimal,
        starts_at: DateTime<Utc>,
    ) -> i64 {
        let theater = self.add_theater("Test Cinema");
        let screen = self.add_screen(theater, "Hall 1", total_seats).unwrap();
        let movie = self.add_movie("Test Movie");
        self.add_show(movie, screen, price, starts_at).unwrap()
    }

    pub(crate) fn set_show_price(&self, show_id: i64, price: Decimal) -> bool {
        match self.inner.tables().shows.get_mut(&show_id) {
            Some(show) => {
                show.price = price;
                true
            }
            None => false,
        }
    }

    /// Вставляет бронь как есть. Нужна для состояний вроде `pending`,
    /// которые обычный поток бронирования не создаёт.
    pub(crate) fn insert_raw_booking(
        &self,
        user_id: i64,
        show_id: i64,
        seats: &[SeatCode],
        total_amount: Decimal,
        status: BookingStatus,
    ) -> i64 {
        let mut tables = self.inner.tables();
        let id = tables.next_id();
        tables.bookings.insert(
            id,
            Booking {
                id,
                user_id,
                show_id,
                total_amount,
                status,
                created_at: Utc::now(),
            },
        );
        tables.details.extend(seats.iter().map(|seat| (id, *seat)));
        id
    }

    pub(crate) fn detail_count(&self) -> usize {
        self.inner.tables().details.len()
    }

    /// Подтверждённые брони сеанса вместе с местами.
    pub(crate) fn confirmed_bookings(&self, show_id: i64) -> Vec<BookingDetails> {
        let tables = self.inner.tables();
        let now = Utc::now();
        tables
            .bookings
            .values()
            .filter(|b| b.show_id == show_id && b.status.holds_seats())
            .filter_map(|b| tables.details_of(b, now))
            .collect()
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn seat_snapshot(&self, show_id: i64) -> StoreResult<Option<SeatSnapshot>> {
        let tables = self.inner.tables();
        Ok(tables.show_seating(show_id).map(|show| SeatSnapshot {
            total_seats: show.total_seats,
            booked: tables.confirmed_seats(show_id),
        }))
    }

    async fn lock_show(&self, show_id: i64) -> StoreResult<Option<Box<dyn ShowLock>>> {
        let exists = self.inner.tables().shows.contains_key(&show_id);
        if !exists {
            return Ok(None);
        }

        let guard = self.inner.lock_show(show_id).await;

        // Цена могла измениться, пока ждали блокировку
        let Some(show) = self.inner.tables().show_seating(show_id) else {
            return Ok(None);
        };

        Ok(Some(Box::new(MemoryShowLock {
            _guard: guard,
            inner: self.inner.clone(),
            show,
            consumed: false,
        })))
    }

    async fn lock_booking(&self, booking_id: i64) -> StoreResult<Option<Box<dyn BookingLock>>> {
        let show_id = self.inner.tables().bookings.get(&booking_id).map(|b| b.show_id);
        let Some(show_id) = show_id else {
            return Ok(None);
        };

        let guard = self.inner.lock_show(show_id).await;

        let tables = self.inner.tables();
        let Some(booking) = tables.bookings.get(&booking_id).cloned() else {
            return Ok(None);
        };
        let Some(show_starts_at) = tables.shows.get(&show_id).map(|s| s.starts_at) else {
            return Ok(None);
        };
        drop(tables);

        Ok(Some(Box::new(MemoryBookingLock {
            _guard: guard,
            inner: self.inner.clone(),
            booking,
            show_starts_at,
            consumed: false,
        })))
    }

    async fn user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingDetails>> {
        let now = Utc::now();
        let tables = self.inner.tables();
        let mut bookings: Vec<BookingDetails> = tables
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .filter_map(|b| tables.details_of(b, now))
            .collect();
        bookings.sort_by(|a, b| {
            (b.booking.created_at, b.booking.id).cmp(&(a.booking.created_at, a.booking.id))
        });
        Ok(bookings)
    }

    async fn booking_details(&self, booking_id: i64) -> StoreResult<Option<BookingDetails>> {
        let tables = self.inner.tables();
        Ok(tables
            .bookings
            .get(&booking_id)
            .and_then(|b| tables.details_of(b, Utc::now())))
    }

    async fn booking_payments(&self, booking_id: i64) -> StoreResult<Vec<Payment>> {
        Ok(self
            .inner
            .tables()
            .payments
            .iter()
            .filter(|p| p.booking_id == booking_id)
            .cloned()
            .collect())
    }
}

struct MemoryShowLock {
    _guard: OwnedMutexGuard<()>,
    inner: Arc<Inner>,
    show: ShowSeating,
    consumed: bool,
}

#[async_trait]
impl ShowLock for MemoryShowLock {
    fn show(&self) -> &ShowSeating {
        &self.show
    }

    async fn confirmed_seats(&mut self) -> StoreResult<HashSet<SeatCode>> {
        if self.consumed {
            return Err(StoreError::HandleConsumed);
        }
        Ok(self.inner.tables().confirmed_seats(self.show.show_id))
    }

    async fn commit_booking(&mut self, booking: NewBooking) -> StoreResult<BookingReceipt> {
        if self.consumed {
            return Err(StoreError::HandleConsumed);
        }
        self.consumed = true;

        let mut tables = self.inner.tables();
        let booking_id = tables.next_id();
        tables.bookings.insert(
            booking_id,
            Booking {
                id: booking_id,
                user_id: booking.user_id,
                show_id: booking.show_id,
                total_amount: booking.total_amount,
                status: BookingStatus::Confirmed,
                created_at: Utc::now(),
            },
        );
        tables
            .details
            .extend(booking.seats.iter().map(|seat| (booking_id, *seat)));

        Ok(BookingReceipt {
            booking_id,
            total_amount: booking.total_amount,
        })
    }
}

struct MemoryBookingLock {
    _guard: OwnedMutexGuard<()>,
    inner: Arc<Inner>,
    booking: Booking,
    show_starts_at: DateTime<Utc>,
    consumed: bool,
}

#[async_trait]
impl BookingLock for MemoryBookingLock {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    fn show_starts_at(&self) -> DateTime<Utc> {
        self.show_starts_at
    }

    async fn commit_cancellation(&mut self, user_id: i64, reason: &str) -> StoreResult<()> {
        if self.consumed {
            return Err(StoreError::HandleConsumed);
        }
        self.consumed = true;

        let mut tables = self.inner.tables();
        if let Some(booking) = tables.bookings.get_mut(&self.booking.id) {
            if booking.status == BookingStatus::Confirmed {
                booking.status = BookingStatus::Cancelled;
            }
        }
        tables.cancellations.push(CancellationEntry {
            booking_id: self.booking.id,
            user_id,
            reason: reason.to_string(),
            cancelled_at: Utc::now(),
        });
        Ok(())
    }

    async fn commit_payment(&mut self, payment: NewPayment) -> StoreResult<i64> {
        if self.consumed {
            return Err(StoreError::HandleConsumed);
        }
        self.consumed = true;

        let mut tables = self.inner.tables();
        let payment_id = tables.next_id();
        tables.payments.push(Payment {
            id: payment_id,
            booking_id: payment.booking_id,
            amount: payment.amount,
            mode: payment.mode,
            status: payment.status,
            created_at: Utc::now(),
        });
        Ok(payment_id)
    }
}
