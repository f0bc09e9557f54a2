use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::BookingError;
use crate::models::SeatCode;
use crate::store::BookingStore;

use super::layout::layout;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAvailability {
    pub code: SeatCode,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShowAvailability {
    pub total_seats: i32,
    pub booked_seat_codes: BTreeSet<SeatCode>,
    pub available_seats: Vec<SeatAvailability>,
}

impl ShowAvailability {
    pub fn is_available(&self, seat: &SeatCode) -> Option<bool> {
        self.available_seats
            .iter()
            .find(|s| s.code == *seat)
            .map(|s| s.available)
    }
}

/// Карта мест сеанса на одну точку чтения хранилища.
pub async fn resolve(
    store: &dyn BookingStore,
    show_id: i64,
) -> Result<ShowAvailability, BookingError> {
    let snapshot = store
        .seat_snapshot(show_id)
        .await?
        .ok_or(BookingError::ShowNotFound(show_id))?;

    let available_seats: Vec<SeatAvailability> = layout(i64::from(snapshot.total_seats))?
        .into_iter()
        .map(|code| SeatAvailability {
            available: !snapshot.booked.contains(&code),
            code,
        })
        .collect();

    debug!(
        "show {}: {} of {} seats booked",
        show_id,
        snapshot.booked.len(),
        snapshot.total_seats
    );

    Ok(ShowAvailability {
        total_seats: snapshot.total_seats,
        booked_seat_codes: snapshot.booked.into_iter().collect(),
        available_seats,
    })
}
