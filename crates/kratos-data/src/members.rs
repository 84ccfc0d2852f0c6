use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::{Membership, MembershipFilter, Query};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MemberFilter {
    pub id: Option<u32>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// A gym member. Memberships, payments and fee slips all
/// reference the member by id.
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Member {
    pub id: u32,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

impl Member {
    /// Get all memberships for this member
    pub async fn get_memberships<DB>(&self, db: &DB) -> Result<Vec<Membership>>
    where
        DB: Query<Membership, Filter = MembershipFilter>,
    {
        let memberships = db
            .query(&MembershipFilter {
                member_id: Some(self.id),
                ..Default::default()
            })
            .await?;
        Ok(memberships)
    }

    /// Email address, if one is on file and not blank.
    pub fn contact_email(&self) -> Option<&str> {
        match self.email.as_deref() {
            Some(email) if !email.trim().is_empty() => Some(email),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contact_email() {
        let member = Member {
            email: Some("iron@example.com".to_string()),
            ..Member::default()
        };
        assert_eq!(member.contact_email(), Some("iron@example.com"));

        let member = Member {
            email: Some("  ".to_string()),
            ..Member::default()
        };
        assert_eq!(member.contact_email(), None);

        let member = Member::default();
        assert_eq!(member.contact_email(), None);
    }
}
