//! Хранилище броней на `PostgreSQL`.
//!
//! Захват мест сериализуется по сеансу: транзакция бронирования берёт
//! `FOR UPDATE` на строку сеанса до чтения подтверждённых мест, поэтому две
//! транзакции на один сеанс выполняют проверку и вставку по очереди. В READ
//! COMMITTED каждый запрос второй транзакции видит всё, что закоммитила первая.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, Transaction};
use std::collections::HashSet;
use tracing::debug;

use super::{
    parse_stored_seats, BookingLock, BookingStore, SeatSnapshot, ShowLock, StoreError, StoreResult,
};
use crate::database::Database;
use crate::models::{
    booking::can_cancel, Booking, BookingDetails, BookingReceipt, NewBooking, NewPayment, Payment,
    SeatCode, ShowSeating,
};

// Один запрос = одна точка чтения: занятые места и вместимость из одного снимка
const SEAT_SNAPSHOT_SQL: &str = r#"
    SELECT sc.total_seats,
           COALESCE(
               ARRAY_AGG(bd.seat_code) FILTER (WHERE bd.seat_code IS NOT NULL),
               '{}'
           ) AS booked
    FROM shows sh
    JOIN screens sc ON sc.id = sh.screen_id
    LEFT JOIN bookings b ON b.show_id = sh.id AND b.status = 'confirmed'
    LEFT JOIN booking_details bd ON bd.booking_id = b.id
    WHERE sh.id = $1
    GROUP BY sc.total_seats
"#;

const BOOKING_DETAILS_SELECT: &str = r#"
    SELECT b.id, b.user_id, b.show_id, b.total_amount, b.status, b.created_at,
           m.title AS movie_title,
           t.name AS theater_name,
           sc.name AS screen_name,
           sh.starts_at AS show_starts_at,
           COALESCE(
               ARRAY_AGG(bd.seat_code) FILTER (WHERE bd.seat_code IS NOT NULL),
               '{}'
           ) AS seats
    FROM bookings b
    JOIN shows sh ON sh.id = b.show_id
    JOIN movies m ON m.id = sh.movie_id
    JOIN screens sc ON sc.id = sh.screen_id
    JOIN theaters t ON t.id = sc.theater_id
    LEFT JOIN booking_details bd ON bd.booking_id = b.id
"#;

const BOOKING_DETAILS_GROUP: &str = "GROUP BY b.id, m.title, t.name, sc.name, sh.starts_at";

#[derive(FromRow)]
struct DetailsRow {
    #[sqlx(flatten)]
    booking: Booking,
    movie_title: String,
    theater_name: String,
    screen_name: String,
    show_starts_at: DateTime<Utc>,
    seats: Vec<String>,
}

impl DetailsRow {
    fn into_details(self, now: DateTime<Utc>) -> StoreResult<BookingDetails> {
        let mut seats = parse_stored_seats(self.seats)?;
        seats.sort();
        Ok(BookingDetails {
            can_cancel: can_cancel(self.booking.status, self.show_starts_at, now),
            booking: self.booking,
            movie_title: self.movie_title,
            theater_name: self.theater_name,
            screen_name: self.screen_name,
            show_starts_at: self.show_starts_at,
            seats,
        })
    }
}

#[derive(FromRow)]
struct LockedBookingRow {
    #[sqlx(flatten)]
    booking: Booking,
    show_starts_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct PgStore {
    db: Database,
}

impl PgStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookingStore for PgStore {
    async fn seat_snapshot(&self, show_id: i64) -> StoreResult<Option<SeatSnapshot>> {
        let row: Option<(i32, Vec<String>)> = sqlx::query_as(SEAT_SNAPSHOT_SQL)
            .bind(show_id)
            .fetch_optional(&self.db.pool)
            .await?;

        let Some((total_seats, booked)) = row else {
            return Ok(None);
        };
        let booked = parse_stored_seats(booked)?.into_iter().collect();
        Ok(Some(SeatSnapshot { total_seats, booked }))
    }

    async fn lock_show(&self, show_id: i64) -> StoreResult<Option<Box<dyn ShowLock>>> {
        let mut tx = self.db.pool.begin().await?;

        let show: Option<ShowSeating> = sqlx::query_as(
            r#"
            SELECT sh.id AS show_id, sc.total_seats, sh.price, sh.starts_at
            FROM shows sh
            JOIN screens sc ON sc.id = sh.screen_id
            WHERE sh.id = $1
            FOR UPDATE OF sh
            "#,
        )
        .bind(show_id)
        .fetch_optional(&mut *tx)
        .await?;

        match show {
            Some(show) => {
                debug!("show {} locked for booking", show_id);
                Ok(Some(Box::new(PgShowLock { tx: Some(tx), show })))
            }
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn lock_booking(&self, booking_id: i64) -> StoreResult<Option<Box<dyn BookingLock>>> {
        let mut tx = self.db.pool.begin().await?;

        let row: Option<LockedBookingRow> = sqlx::query_as(
            r#"
            SELECT b.id, b.user_id, b.show_id, b.total_amount, b.status, b.created_at,
                   sh.starts_at AS show_starts_at
            FROM bookings b
            JOIN shows sh ON sh.id = b.show_id
            WHERE b.id = $1
            FOR UPDATE OF b
            "#,
        )
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await?;

        match row {
            Some(row) => Ok(Some(Box::new(PgBookingLock {
                tx: Some(tx),
                booking: row.booking,
                show_starts_at: row.show_starts_at,
            }))),
            None => {
                tx.rollback().await?;
                Ok(None)
            }
        }
    }

    async fn user_bookings(&self, user_id: i64) -> StoreResult<Vec<BookingDetails>> {
        let sql = format!(
            "{BOOKING_DETAILS_SELECT} WHERE b.user_id = $1 {BOOKING_DETAILS_GROUP} \
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows: Vec<DetailsRow> = sqlx::query_as(&sql)
            .bind(user_id)
            .fetch_all(&self.db.pool)
            .await?;

        let now = Utc::now();
        rows.into_iter().map(|row| row.into_details(now)).collect()
    }

    async fn booking_details(&self, booking_id: i64) -> StoreResult<Option<BookingDetails>> {
        let sql = format!("{BOOKING_DETAILS_SELECT} WHERE b.id = $1 {BOOKING_DETAILS_GROUP}");
        let row: Option<DetailsRow> = sqlx::query_as(&sql)
            .bind(booking_id)
            .fetch_optional(&self.db.pool)
            .await?;

        row.map(|row| row.into_details(Utc::now())).transpose()
    }

    async fn booking_payments(&self, booking_id: i64) -> StoreResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            "SELECT id, booking_id, amount, mode, status, created_at
             FROM payments
             WHERE booking_id = $1
             ORDER BY created_at, id",
        )
        .bind(booking_id)
        .fetch_all(&self.db.pool)
        .await?;

        Ok(payments)
    }
}

/// Открытая транзакция с блокировкой строки сеанса.
struct PgShowLock {
    tx: Option<Transaction<'static, Postgres>>,
    show: ShowSeating,
}

#[async_trait]
impl ShowLock for PgShowLock {
    fn show(&self) -> &ShowSeating {
        &self.show
    }

    async fn confirmed_seats(&mut self) -> StoreResult<HashSet<SeatCode>> {
        let show_id = self.show.show_id;
        let tx = self.tx.as_mut().ok_or(StoreError::HandleConsumed)?;

        let codes: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT bd.seat_code
            FROM booking_details bd
            JOIN bookings b ON b.id = bd.booking_id
            WHERE b.show_id = $1 AND b.status = 'confirmed'
            "#,
        )
        .bind(show_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(parse_stored_seats(codes)?.into_iter().collect())
    }

    async fn commit_booking(&mut self, booking: NewBooking) -> StoreResult<BookingReceipt> {
        let mut tx = self.tx.take().ok_or(StoreError::HandleConsumed)?;

        let booking_id: i64 = sqlx::query_scalar(
            "INSERT INTO bookings (user_id, show_id, total_amount, status)
             VALUES ($1, $2, $3, 'confirmed')
             RETURNING id",
        )
        .bind(booking.user_id)
        .bind(booking.show_id)
        .bind(booking.total_amount)
        .fetch_one(&mut *tx)
        .await?;

        let codes: Vec<String> = booking.seats.iter().map(ToString::to_string).collect();
        sqlx::query(
            "INSERT INTO booking_details (booking_id, seat_code)
             SELECT $1, UNNEST($2::text[])",
        )
        .bind(booking_id)
        .bind(&codes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(BookingReceipt {
            booking_id,
            total_amount: booking.total_amount,
        })
    }
}

/// Открытая транзакция с блокировкой строки брони.
struct PgBookingLock {
    tx: Option<Transaction<'static, Postgres>>,
    booking: Booking,
    show_starts_at: DateTime<Utc>,
}

#[async_trait]
impl BookingLock for PgBookingLock {
    fn booking(&self) -> &Booking {
        &self.booking
    }

    fn show_starts_at(&self) -> DateTime<Utc> {
        self.show_starts_at
    }

    async fn commit_cancellation(&mut self, user_id: i64, reason: &str) -> StoreResult<()> {
        let mut tx = self.tx.take().ok_or(StoreError::HandleConsumed)?;

        sqlx::query(
            "UPDATE bookings SET status = 'cancelled' WHERE id = $1 AND status = 'confirmed'",
        )
        .bind(self.booking.id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO cancellations_log (booking_id, user_id, reason) VALUES ($1, $2, $3)",
        )
        .bind(self.booking.id)
        .bind(user_id)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn commit_payment(&mut self, payment: NewPayment) -> StoreResult<i64> {
        let mut tx = self.tx.take().ok_or(StoreError::HandleConsumed)?;

        let payment_id: i64 = sqlx::query_scalar(
            "INSERT INTO payments (booking_id, amount, mode, status)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(payment.booking_id)
        .bind(payment.amount)
        .bind(&payment.mode)
        .bind(payment.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(payment_id)
    }
}
