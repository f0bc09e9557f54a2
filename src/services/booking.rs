//! Транзакция бронирования: выбор мест превращается в подтверждённую бронь.
//!
//! Проверка конфликтов и вставка идут внутри одной единицы работы [`ShowLock`],
//! поэтому параллельные попытки на один сеанс выполняются по очереди и из двух
//! пересекающихся выборов коммитится не больше одного. Всё, что может упасть,
//! проверяется до коммита; неудачная попытка отпускает блокировку без строк.
//!
//! [`ShowLock`]: crate::store::ShowLock

use rust_decimal::Decimal;
use std::collections::BTreeSet;
use tracing::info;

use crate::error::BookingError;
use crate::models::{BookingReceipt, NewBooking, SeatCode};
use crate::store::BookingStore;

use super::layout;

struct ParsedSelection {
    seats: BTreeSet<SeatCode>,
    malformed: Vec<String>,
    duplicates: Vec<String>,
}

fn parse_selection(requested: &[String]) -> ParsedSelection {
    let mut parsed = ParsedSelection {
        seats: BTreeSet::new(),
        malformed: Vec::new(),
        duplicates: Vec::new(),
    };
    for raw in requested {
        match raw.parse::<SeatCode>() {
            Ok(seat) => {
                if !parsed.seats.insert(seat) {
                    parsed.duplicates.push(raw.clone());
                }
            }
            Err(_) => parsed.malformed.push(raw.clone()),
        }
    }
    parsed
}

fn invalid_selection(reason: &str, invalid: Vec<String>) -> BookingError {
    BookingError::InvalidSeatSelection {
        reason: format!("{reason}: {}", invalid.join(", ")),
        invalid,
    }
}

/// Бронирует места `requested` сеанса `show_id` для `user_id`.
///
/// Проверки по порядку: сеанс существует и цена положительная
/// (`ShowNotFound`); выбор непустой, без повторов и в пределах зала
/// (`InvalidSeatSelection`); ни одно место не занято подтверждённой бронью
/// (`SeatsUnavailable` со списком всех занятых мест).
pub async fn book(
    store: &dyn BookingStore,
    user_id: i64,
    show_id: i64,
    requested: &[String],
) -> Result<BookingReceipt, BookingError> {
    let selection = parse_selection(requested);

    let mut lock = store
        .lock_show(show_id)
        .await?
        .ok_or(BookingError::ShowNotFound(show_id))?;
    let show = lock.show().clone();

    if show.price <= Decimal::ZERO {
        return Err(BookingError::ShowNotFound(show_id));
    }

    if requested.is_empty() {
        return Err(BookingError::InvalidSeatSelection {
            reason: "no seats requested".to_string(),
            invalid: Vec::new(),
        });
    }
    if !selection.malformed.is_empty() {
        return Err(invalid_selection("malformed seat codes", selection.malformed));
    }
    if !selection.duplicates.is_empty() {
        return Err(invalid_selection("seats requested more than once", selection.duplicates));
    }
    let outside: Vec<String> = selection
        .seats
        .iter()
        .filter(|seat| !layout::contains(i64::from(show.total_seats), seat))
        .map(ToString::to_string)
        .collect();
    if !outside.is_empty() {
        return Err(invalid_selection("seats not on this screen", outside));
    }

    let held = lock.confirmed_seats().await?;
    let conflicting: Vec<SeatCode> = selection
        .seats
        .iter()
        .filter(|seat| held.contains(seat))
        .copied()
        .collect();
    if !conflicting.is_empty() {
        info!(
            "booking rejected for user {} on show {}: {} seat(s) already held",
            user_id,
            show_id,
            conflicting.len()
        );
        return Err(BookingError::SeatsUnavailable { seats: conflicting });
    }

    // Сумма фиксируется здесь и больше не пересчитывается
    let total_amount = show.price * Decimal::from(selection.seats.len());
    let receipt = lock
        .commit_booking(NewBooking {
            user_id,
            show_id,
            seats: selection.seats.into_iter().collect(),
            total_amount,
        })
        .await?;

    info!(
        "booking {} confirmed: user {}, show {}, amount {}",
        receipt.booking_id, user_id, show_id, receipt.total_amount
    );
    Ok(receipt)
}
