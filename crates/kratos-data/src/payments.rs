use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PaymentFilter {
    pub id: Option<u32>,
    pub member_id: Option<u32>,
    pub membership_id: Option<u32>,
}

/// Append-only ledger row. Written alongside every activation and
/// renewal, never mutated afterwards.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Payment {
    pub id: u32,
    pub member_id: u32,
    pub membership_id: u32,
    pub amount: f64,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
