use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// Сеанс глазами инвентаря мест: вместимость зала, цена места и время начала.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ShowSeating {
    pub show_id: i64,
    pub total_seats: i32,
    pub price: Decimal,
    pub starts_at: DateTime<Utc>,
}
