//! Схема зала: позиции 1..=N отображаются в коды мест, по десять мест в ряду,
//! ряды с буквы 'A', последний ряд может быть неполным.

use crate::models::seat::{SeatCode, MAX_SEATS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("total seat count must be positive, got {0}")]
    NonPositive(i64),
    #[error("total seat count {0} exceeds the {max} addressable seats", max = MAX_SEATS)]
    TooLarge(i64),
}

/// Коды мест зала на `total_seats` мест в порядке схемы.
pub fn layout(total_seats: i64) -> Result<Vec<SeatCode>, LayoutError> {
    if total_seats <= 0 {
        return Err(LayoutError::NonPositive(total_seats));
    }
    let total = u16::try_from(total_seats)
        .ok()
        .filter(|total| *total <= MAX_SEATS)
        .ok_or(LayoutError::TooLarge(total_seats))?;

    Ok((1..=total).filter_map(SeatCode::from_ordinal).collect())
}

/// Есть ли место `seat` в зале на `total_seats` мест.
pub fn contains(total_seats: i64, seat: &SeatCode) -> bool {
    i64::from(seat.ordinal()) <= total_seats
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn codes(total: i64) -> Vec<String> {
        layout(total).unwrap().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn twenty_five_seats_fill_two_rows_and_a_half() {
        let expected: Vec<String> = (1..=10)
            .map(|n| format!("A{n}"))
            .chain((1..=10).map(|n| format!("B{n}")))
            .chain((1..=5).map(|n| format!("C{n}")))
            .collect();
        assert_eq!(codes(25), expected);
    }

    #[test]
    fn full_last_row_has_ten_seats() {
        let seats = codes(20);
        assert_eq!(seats.len(), 20);
        assert_eq!(seats.last().map(String::as_str), Some("B10"));
    }

    #[test]
    fn single_seat_screen() {
        assert_eq!(codes(1), vec!["A1".to_string()]);
    }

    #[test]
    fn rejects_non_positive_counts() {
        assert_eq!(layout(0), Err(LayoutError::NonPositive(0)));
        assert_eq!(layout(-3), Err(LayoutError::NonPositive(-3)));
    }

    #[test]
    fn rejects_counts_past_row_z() {
        assert!(layout(i64::from(MAX_SEATS)).is_ok());
        assert_eq!(
            layout(i64::from(MAX_SEATS) + 1),
            Err(LayoutError::TooLarge(i64::from(MAX_SEATS) + 1))
        );
    }

    #[test]
    fn contains_matches_layout_membership() {
        let b2: SeatCode = "B2".parse().unwrap();
        assert!(contains(12, &b2));
        assert!(!contains(11, &b2));
    }

    proptest! {
        #[test]
        fn layout_is_total_and_injective(total in 1i64..=i64::from(MAX_SEATS)) {
            let seats = layout(total).unwrap();
            prop_assert_eq!(seats.len() as i64, total);

            let unique: HashSet<_> = seats.iter().collect();
            prop_assert_eq!(unique.len(), seats.len());

            for (index, seat) in seats.iter().enumerate() {
                prop_assert_eq!(i64::from(seat.ordinal()), index as i64 + 1);
                prop_assert!(contains(total, seat));
            }
            prop_assert!(seats.windows(2).all(|pair| pair[0] < pair[1]));
        }

        #[test]
        fn last_row_holds_the_remainder(total in 1i64..=i64::from(MAX_SEATS)) {
            let seats = layout(total).unwrap();
            let last = seats.last().unwrap();
            let remainder = match total % 10 { 0 => 10, r => r };
            prop_assert_eq!(i64::from(last.number()), remainder);
        }
    }
}
