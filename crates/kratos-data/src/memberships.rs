use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Membership lifecycle status, stored as TEXT.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    #[default]
    Active,
    Hold,
    Inactive,
    Expired,
}

impl std::fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MembershipStatus::Active => "active",
            MembershipStatus::Hold => "hold",
            MembershipStatus::Inactive => "inactive",
            MembershipStatus::Expired => "expired",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for MembershipStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(MembershipStatus::Active),
            "hold" => Ok(MembershipStatus::Hold),
            "inactive" => Ok(MembershipStatus::Inactive),
            "expired" => Ok(MembershipStatus::Expired),
            other => Err(anyhow::anyhow!("unknown membership status: {}", other)),
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MembershipFilter {
    pub id: Option<u32>,
    pub member_id: Option<u32>,
    pub status: Option<MembershipStatus>,
}

/// A time-bounded subscription period for a member.
/// Rows are never deleted, only transitioned between statuses.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Membership {
    pub id: u32,
    pub member_id: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_label: String,
    pub fee_amount: f64,
    pub status: MembershipStatus,
    pub paused_at: Option<DateTime<Utc>>,
    pub paused_days: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    /// The end date has passed.
    pub fn has_expired(&self, today: NaiveDate) -> bool {
        self.end_date < today
    }

    /// Days until the end date, negative when already past.
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.end_date - today).num_days()
    }

    /// End date shifted by a number of days, saturating on overflow.
    pub fn end_date_plus_days(&self, days: i64) -> NaiveDate {
        if days <= 0 {
            return self.end_date;
        }
        self.end_date
            .checked_add_days(Days::new(days as u64))
            .unwrap_or(self.end_date)
    }
}

fn status_rank(status: MembershipStatus) -> u8 {
    match status {
        MembershipStatus::Active => 0,
        MembershipStatus::Hold => 1,
        MembershipStatus::Expired => 2,
        MembershipStatus::Inactive => 3,
    }
}

/// Pick the authoritative membership out of a member's history.
/// Priority: active over hold over expired, then first created.
/// Display and renew-target resolution both go through here so the
/// ordering lives in exactly one place.
pub fn current_membership(memberships: &[Membership]) -> Option<&Membership> {
    memberships
        .iter()
        .min_by_key(|m| (status_rank(m.status), m.id))
}

/// Read model for the expiry queries: membership joined with the
/// member's name and email.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExpiryCandidate {
    pub membership_id: u32,
    pub member_id: u32,
    pub member_name: String,
    pub member_email: Option<String>,
    pub end_date: NaiveDate,
    pub duration_label: String,
    pub fee_amount: f64,
}

/// Bulk expiry procedures backing the notification sweep.
#[async_trait]
pub trait ExpiryStore {
    /// Transition every past-due active or held membership to expired.
    /// Returns the number of rows changed.
    async fn mark_expired(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<u64>;

    /// Active memberships ending within the next `days_ahead` days.
    async fn expiring_within(
        &self,
        today: NaiveDate,
        days_ahead: u32,
    ) -> Result<Vec<ExpiryCandidate>>;

    /// All memberships currently marked expired, however old.
    async fn expired(&self) -> Result<Vec<ExpiryCandidate>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(id: u32, status: MembershipStatus) -> Membership {
        Membership {
            id,
            status,
            ..Membership::default()
        }
    }

    #[test]
    fn test_current_membership_priority() {
        let memberships = vec![
            membership(1, MembershipStatus::Expired),
            membership(2, MembershipStatus::Hold),
            membership(3, MembershipStatus::Active),
        ];
        assert_eq!(current_membership(&memberships).unwrap().id, 3);

        let memberships = vec![
            membership(1, MembershipStatus::Expired),
            membership(2, MembershipStatus::Hold),
        ];
        assert_eq!(current_membership(&memberships).unwrap().id, 2);

        let memberships = vec![
            membership(4, MembershipStatus::Inactive),
            membership(5, MembershipStatus::Expired),
        ];
        assert_eq!(current_membership(&memberships).unwrap().id, 5);
    }

    #[test]
    fn test_current_membership_tie_break() {
        // Same status: the first created row wins.
        let memberships = vec![
            membership(7, MembershipStatus::Active),
            membership(2, MembershipStatus::Active),
        ];
        assert_eq!(current_membership(&memberships).unwrap().id, 2);
    }

    #[test]
    fn test_current_membership_empty() {
        assert!(current_membership(&[]).is_none());
    }

    #[test]
    fn test_has_expired() {
        let m = Membership {
            end_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            ..Membership::default()
        };
        assert!(!m.has_expired(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()));
        assert!(m.has_expired(NaiveDate::from_ymd_opt(2024, 2, 16).unwrap()));
    }

    #[test]
    fn test_end_date_plus_days() {
        let m = Membership {
            end_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            ..Membership::default()
        };
        assert_eq!(
            m.end_date_plus_days(5),
            NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()
        );
        assert_eq!(m.end_date_plus_days(0), m.end_date);
    }
}
