use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::BookingError;
use crate::models::BookingStatus;
use crate::store::BookingStore;

pub const DEFAULT_REASON: &str = "User cancelled booking";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled,
    /// Бронь уже была отменена, ничего не изменилось.
    AlreadyCancelled,
}

/// Отменяет подтверждённую бронь пользователя `user_id`.
///
/// Места отдельно не освобождаются: доступность считается только по
/// подтверждённым броням. Повторная отмена успешна и хранилище не трогает.
pub async fn cancel(
    store: &dyn BookingStore,
    booking_id: i64,
    user_id: i64,
    reason: Option<&str>,
    now: DateTime<Utc>,
) -> Result<CancelOutcome, BookingError> {
    let mut lock = store
        .lock_booking(booking_id)
        .await?
        .ok_or(BookingError::NotFound(booking_id))?;

    // Чужая бронь выглядит как несуществующая
    if lock.booking().user_id != user_id {
        return Err(BookingError::NotFound(booking_id));
    }

    match lock.booking().status {
        BookingStatus::Cancelled => return Ok(CancelOutcome::AlreadyCancelled),
        BookingStatus::Pending => {
            return Err(BookingError::InvalidState(format!(
                "booking {booking_id} is pending and holds no seats"
            )))
        }
        BookingStatus::Confirmed => {}
    }

    if lock.show_starts_at() <= now {
        return Err(BookingError::InvalidState(format!(
            "show of booking {booking_id} has already started"
        )));
    }

    let reason = reason
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_REASON);
    lock.commit_cancellation(user_id, reason).await?;

    info!("booking {} cancelled by user {}", booking_id, user_id);
    Ok(CancelOutcome::Cancelled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SeatCode;
    use crate::services::{availability, booking};
    use crate::store::MemoryStore;
    use chrono::Duration;
    use rust_decimal::Decimal;

    fn setup(starts_in: Duration) -> (MemoryStore, i64) {
        let store = MemoryStore::new();
        let show = store.schedule_show(12, Decimal::new(1000, 2), Utc::now() + starts_in);
        (store, show)
    }

    async fn book_b2(store: &MemoryStore, show: i64, user: i64) -> i64 {
        booking::book(store, user, show, &["B2".to_string()])
            .await
            .unwrap()
            .booking_id
    }

    #[tokio::test]
    async fn cancel_releases_the_seats() {
        let (store, show) = setup(Duration::days(1));
        let booking_id = book_b2(&store, show, 1).await;

        let outcome = cancel(&store, booking_id, 1, None, Utc::now()).await.unwrap();
        assert_eq!(outcome, CancelOutcome::Cancelled);
        assert_eq!(store.booking(booking_id).unwrap().status, BookingStatus::Cancelled);

        let map = availability::resolve(&store, show).await.unwrap();
        assert_eq!(map.is_available(&"B2".parse().unwrap()), Some(true));

        // Место снова можно забронировать
        book_b2(&store, show, 2).await;
    }

    #[tokio::test]
    async fn second_cancel_is_a_silent_success() {
        let (store, show) = setup(Duration::days(1));
        let booking_id = book_b2(&store, show, 1).await;

        cancel(&store, booking_id, 1, Some("changed plans"), Utc::now()).await.unwrap();
        let again = cancel(&store, booking_id, 1, None, Utc::now()).await.unwrap();

        assert_eq!(again, CancelOutcome::AlreadyCancelled);
        let log = store.cancellations();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].reason, "changed plans");
        assert_eq!(log[0].user_id, 1);
    }

    #[tokio::test]
    async fn retry_after_rebooking_does_not_release_new_holder() {
        let (store, show) = setup(Duration::days(1));
        let first = book_b2(&store, show, 1).await;
        cancel(&store, first, 1, None, Utc::now()).await.unwrap();
        book_b2(&store, show, 2).await;

        cancel(&store, first, 1, None, Utc::now()).await.unwrap();

        let map = availability::resolve(&store, show).await.unwrap();
        assert_eq!(map.is_available(&"B2".parse().unwrap()), Some(false));
    }

    #[tokio::test]
    async fn foreign_or_missing_booking_is_not_found() {
        let (store, show) = setup(Duration::days(1));
        let booking_id = book_b2(&store, show, 1).await;

        let foreign = cancel(&store, booking_id, 2, None, Utc::now()).await.unwrap_err();
        assert!(matches!(foreign, BookingError::NotFound(id) if id == booking_id));
        assert_eq!(store.booking(booking_id).unwrap().status, BookingStatus::Confirmed);

        let missing = cancel(&store, 4040, 1, None, Utc::now()).await.unwrap_err();
        assert!(matches!(missing, BookingError::NotFound(4040)));
    }

    #[tokio::test]
    async fn pending_booking_cannot_be_cancelled() {
        let (store, show) = setup(Duration::days(1));
        let seat: SeatCode = "A1".parse().unwrap();
        let pending =
            store.insert_raw_booking(1, show, &[seat], Decimal::ONE, BookingStatus::Pending);

        let err = cancel(&store, pending, 1, None, Utc::now()).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
        assert_eq!(store.booking(pending).unwrap().status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn started_show_cannot_be_cancelled() {
        let (store, show) = setup(Duration::hours(2));
        let booking_id = book_b2(&store, show, 1).await;

        let later = Utc::now() + Duration::hours(3);
        let err = cancel(&store, booking_id, 1, None, later).await.unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
        assert!(store.cancellations().is_empty());
    }
}
