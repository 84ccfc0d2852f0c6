use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Outcome of a single delivery attempt, stored as TEXT.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    #[default]
    Sent,
    Failed,
}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmailStatus::Sent => write!(f, "sent"),
            EmailStatus::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EmailLogFilter {
    pub id: Option<u32>,
    pub member_id: Option<u32>,
    pub email_type: Option<String>,
    pub status: Option<EmailStatus>,
    /// Entries whose delivery timestamp falls on this civil day.
    pub sent_on: Option<NaiveDate>,
}

/// One row per delivery attempt, append-only.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct EmailLogEntry {
    pub id: u32,
    pub member_id: u32,
    pub email_type: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub status: EmailStatus,
    pub error_message: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Log type for expiry and renewal-reminder alerts.
pub const EMAIL_TYPE_EXPIRY_ALERT: &str = "expiry_alert";
