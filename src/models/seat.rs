use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const SEATS_PER_ROW: u16 = 10;
/// Ряды обозначаются буквами 'A'..='Z'.
pub const MAX_ROWS: u16 = 26;
pub const MAX_SEATS: u16 = SEATS_PER_ROW * MAX_ROWS;

/// Физическое место в зале, например `B7`.
///
/// Порядок как в схеме зала: сначала ряд, потом номер, поэтому `A10 < B1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeatCode {
    row: u8,
    number: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid seat code: {0:?}")]
pub struct ParseSeatCodeError(pub String);

impl SeatCode {
    /// Место на позиции `ordinal` (с единицы). `None` за пределами `MAX_SEATS`.
    pub fn from_ordinal(ordinal: u16) -> Option<Self> {
        if ordinal == 0 || ordinal > MAX_SEATS {
            return None;
        }
        let index = ordinal - 1;
        Some(SeatCode {
            row: (index / SEATS_PER_ROW) as u8,
            number: (index % SEATS_PER_ROW + 1) as u8,
        })
    }

    /// Позиция места в схеме зала, с единицы.
    pub fn ordinal(&self) -> u16 {
        u16::from(self.row) * SEATS_PER_ROW + u16::from(self.number)
    }

    pub fn row_letter(&self) -> char {
        char::from(b'A' + self.row)
    }

    pub fn number(&self) -> u8 {
        self.number
    }
}

impl fmt::Display for SeatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.number)
    }
}

impl FromStr for SeatCode {
    type Err = ParseSeatCodeError;

    /// Принимает только каноническую форму: заглавная буква ряда и номер
    /// 1..=10 без ведущих нулей.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseSeatCodeError(s.to_string());

        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(invalid)?;
        if !letter.is_ascii_uppercase() {
            return Err(invalid());
        }
        let digits = chars.as_str();
        if digits.is_empty()
            || digits.starts_with('0')
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let number: u16 = digits.parse().map_err(|_| invalid())?;
        if number == 0 || number > SEATS_PER_ROW {
            return Err(invalid());
        }

        Ok(SeatCode {
            row: letter as u8 - b'A',
            number: number as u8,
        })
    }
}

impl Serialize for SeatCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeatCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_codes() {
        let code: SeatCode = "B7".parse().unwrap();
        assert_eq!(code.row_letter(), 'B');
        assert_eq!(code.number(), 7);
        assert_eq!(code.to_string(), "B7");

        let last: SeatCode = "Z10".parse().unwrap();
        assert_eq!(last.ordinal(), MAX_SEATS);
    }

    #[test]
    fn rejects_malformed_codes() {
        for raw in ["", "A", "a1", "A0", "A01", "A11", "1A", "AA1", "B 7", "Ä1"] {
            assert!(raw.parse::<SeatCode>().is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn ordinal_round_trips_at_row_edges() {
        for ordinal in [1, 10, 11, 20, 21, MAX_SEATS] {
            let code = SeatCode::from_ordinal(ordinal).unwrap();
            assert_eq!(code.ordinal(), ordinal);
        }
        assert_eq!(SeatCode::from_ordinal(10).unwrap().to_string(), "A10");
        assert_eq!(SeatCode::from_ordinal(11).unwrap().to_string(), "B1");
        assert!(SeatCode::from_ordinal(0).is_none());
        assert!(SeatCode::from_ordinal(MAX_SEATS + 1).is_none());
    }

    #[test]
    fn orders_by_row_then_number() {
        let a10: SeatCode = "A10".parse().unwrap();
        let b1: SeatCode = "B1".parse().unwrap();
        let a2: SeatCode = "A2".parse().unwrap();
        assert!(a2 < a10);
        assert!(a10 < b1);
    }

    #[test]
    fn serializes_as_plain_string() {
        let code: SeatCode = "C5".parse().unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"C5\"");
        let back: SeatCode = serde_json::from_str("\"C5\"").unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<SeatCode>("\"C55\"").is_err());
    }
}
