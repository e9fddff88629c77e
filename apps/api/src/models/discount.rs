use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DiscountCodeRow {
    pub id: Uuid,
    pub code: String,
    /// Product identifier the code applies to, e.g. "cover_letter_pack".
    pub product: String,
    pub percent_off: i32,
    pub bonus_credits: i32,
    pub active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}
