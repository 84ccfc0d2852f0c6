use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct RenewalFilter {
    pub id: Option<u32>,
    pub member_id: Option<u32>,
    pub membership_id: Option<u32>,
}

/// Audit trail row for a renewal event. Written best-effort after
/// the renewal itself; a missing row never invalidates the renewal.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct MembershipRenewal {
    pub id: u32,
    pub membership_id: u32,
    pub member_id: u32,
    pub previous_end_date: NaiveDate,
    pub new_end_date: NaiveDate,
    pub duration_label: String,
    pub fee_amount: f64,
    pub renewed_by: String,
    pub created_at: DateTime<Utc>,
}
