use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct FeeSlipFilter {
    pub id: Option<u32>,
    pub member_id: Option<u32>,
    pub membership_id: Option<u32>,
}

/// Immutable receipt snapshot of an activation or renewal event.
/// Carries everything needed to render the receipt later, even if
/// the membership row has moved on since.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct FeeSlip {
    pub id: u32,
    pub member_id: u32,
    pub membership_id: u32,
    pub issued_on: NaiveDate,
    pub fee_amount: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_label: String,
    pub gym_name: String,
    pub signed_by: String,
    pub created_at: DateTime<Utc>,
}
