use std::collections::HashSet;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kratos_data::{
    EmailLogEntry, EmailLogFilter, EmailStatus, ExpiryCandidate, ExpiryStore, Insert,
    Query, EMAIL_TYPE_EXPIRY_ALERT,
};

use crate::{expiry_alert_email, GymIdentity, Mailer};

/// How far ahead the sweep looks for soon-to-expire memberships.
pub const EXPIRY_WINDOW_DAYS: u32 = 7;

/// Aggregate result of one sweep run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepSummary {
    pub expired_marked: u64,
    pub notifications_found: usize,
    pub emails_sent: u32,
    pub emails_failed: u32,
}

/// Reclassify overdue memberships, then send one expiry alert per
/// qualifying membership. Per-recipient failures are isolated; the
/// only hard failure is not being able to read the candidate sets.
pub async fn run_sweep<DB>(
    db: &DB,
    mailer: &dyn Mailer,
    gym: &GymIdentity,
    now: DateTime<Utc>,
) -> Result<SweepSummary>
where
    DB: ExpiryStore
        + Query<EmailLogEntry, Filter = EmailLogFilter>
        + Insert<EmailLogEntry>
        + Sync,
{
    let today = now.date_naive();

    // Phase one: reclassify. Losing this update only delays the
    // reclassification to the next run, so it is not fatal.
    let expired_marked = match db.mark_expired(today, now).await {
        Ok(count) => {
            tracing::info!(count = count, "Marked memberships as expired");
            count
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to mark expired memberships");
            0
        }
    };

    // Phase two: collect both candidate sets.
    let expiring = db.expiring_within(today, EXPIRY_WINDOW_DAYS).await?;
    let expired = db.expired().await?;

    let mut candidates = expiring;
    candidates.extend(expired);
    let notifications_found = candidates.len();
    tracing::info!(
        count = notifications_found,
        "Memberships requiring notification"
    );

    let mut summary = SweepSummary {
        expired_marked,
        notifications_found,
        ..SweepSummary::default()
    };

    let mut seen = HashSet::new();
    for candidate in candidates {
        let email = match candidate.member_email.as_deref() {
            Some(email) if !email.trim().is_empty() => email.to_string(),
            _ => continue,
        };
        if !seen.insert(candidate.membership_id) {
            continue;
        }
        if already_notified_today(db, &candidate, now).await {
            tracing::debug!(
                member_id = candidate.member_id,
                "Alert already sent today, skipping"
            );
            continue;
        }

        let subject = gym.expiry_alert_subject();
        let html = expiry_alert_email(
            &candidate.member_name,
            candidate.end_date,
            &candidate.duration_label,
            today,
            gym,
        );

        let mut entry = EmailLogEntry {
            member_id: candidate.member_id,
            email_type: EMAIL_TYPE_EXPIRY_ALERT.to_string(),
            recipient: email.clone(),
            subject: subject.clone(),
            body: html.clone(),
            created_at: now,
            ..EmailLogEntry::default()
        };

        match mailer.send(&email, &subject, &html).await {
            Ok(()) => {
                summary.emails_sent += 1;
                entry.status = EmailStatus::Sent;
                entry.sent_at = Some(now);
                tracing::info!(to = %email, "Expiry alert sent");
            }
            Err(err) => {
                summary.emails_failed += 1;
                entry.status = EmailStatus::Failed;
                entry.error_message = Some(err.to_string());
                tracing::error!(to = %email, error = %err, "Expiry alert failed");
            }
        }

        // The log row itself is advisory
        if let Err(err) = db.insert(entry).await {
            tracing::warn!(error = %err, "Failed to append email log entry");
        }
    }

    tracing::info!(
        sent = summary.emails_sent,
        failed = summary.emails_failed,
        "Email notification summary"
    );
    Ok(summary)
}

/// At most one alert per member per civil day, checked against the
/// delivery log.
async fn already_notified_today<DB>(
    db: &DB,
    candidate: &ExpiryCandidate,
    now: DateTime<Utc>,
) -> bool
where
    DB: Query<EmailLogEntry, Filter = EmailLogFilter> + Sync,
{
    let filter = EmailLogFilter {
        member_id: Some(candidate.member_id),
        email_type: Some(EMAIL_TYPE_EXPIRY_ALERT.to_string()),
        status: Some(EmailStatus::Sent),
        sent_on: Some(now.date_naive()),
        ..Default::default()
    };
    match db.query(&filter).await {
        Ok(entries) => !entries.is_empty(),
        Err(err) => {
            // When the log cannot be read, sending twice beats
            // never sending.
            tracing::warn!(error = %err, "Could not check notification log");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Days, NaiveDate};
    use kratos_data::{Member, Membership, MembershipStatus};
    use kratos_db::Connection;

    use crate::RecordingMailer;

    async fn member_with_email(db: &Connection, name: &str, email: &str) -> Member {
        db.insert(Member {
            full_name: name.to_string(),
            email: Some(email.to_string()),
            created_at: Utc::now(),
            ..Member::default()
        })
        .await
        .unwrap()
    }

    async fn active_membership(db: &Connection, member_id: u32, end: NaiveDate) -> Membership {
        db.insert(Membership {
            member_id,
            start_date: end.checked_sub_days(Days::new(30)).unwrap(),
            end_date: end,
            duration_label: "1 month".to_string(),
            fee_amount: 500.0,
            status: MembershipStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Membership::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_sweep_marks_and_notifies() {
        let db = Connection::open_test().await;
        let now = Utc::now();
        let today = now.date_naive();

        let member = member_with_email(&db, "Past Due", "pastdue@kratos.gym").await;
        let overdue = today.checked_sub_days(Days::new(3)).unwrap();
        active_membership(&db, member.id, overdue).await;

        let mailer = RecordingMailer::new();
        let summary = run_sweep(&db, &mailer, &GymIdentity::default(), now)
            .await
            .unwrap();

        assert_eq!(summary.expired_marked, 1);
        assert_eq!(summary.notifications_found, 1);
        assert_eq!(summary.emails_sent, 1);
        assert_eq!(summary.emails_failed, 0);
        assert_eq!(mailer.sent_count(), 1);

        let log: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(member.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].status, EmailStatus::Sent);
        assert!(log[0].sent_at.is_some());
    }

    #[tokio::test]
    async fn test_sweep_idempotent_same_day() {
        let db = Connection::open_test().await;
        let now = Utc::now();
        let today = now.date_naive();

        let member = member_with_email(&db, "Past Due", "pastdue@kratos.gym").await;
        let overdue = today.checked_sub_days(Days::new(3)).unwrap();
        active_membership(&db, member.id, overdue).await;

        let mailer = RecordingMailer::new();
        let gym = GymIdentity::default();
        run_sweep(&db, &mailer, &gym, now).await.unwrap();
        let second = run_sweep(&db, &mailer, &gym, now).await.unwrap();

        // Nothing newly expired, candidate still listed, but the
        // per-day suppression prevents a second alert.
        assert_eq!(second.expired_marked, 0);
        assert_eq!(second.notifications_found, 1);
        assert_eq!(second.emails_sent, 0);
        assert_eq!(second.emails_failed, 0);
        assert_eq!(mailer.sent_count(), 1);

        let log: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(member.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_sweep_failure_isolated_per_recipient() {
        let db = Connection::open_test().await;
        let now = Utc::now();
        let today = now.date_naive();
        let overdue = today.checked_sub_days(Days::new(1)).unwrap();

        let bouncing = member_with_email(&db, "Bouncing", "bounce@kratos.gym").await;
        active_membership(&db, bouncing.id, overdue).await;
        let fine = member_with_email(&db, "Reachable", "fine@kratos.gym").await;
        active_membership(&db, fine.id, overdue).await;

        let mailer = RecordingMailer::failing_for("bounce@kratos.gym");
        let summary = run_sweep(&db, &mailer, &GymIdentity::default(), now)
            .await
            .unwrap();

        assert_eq!(summary.notifications_found, 2);
        assert_eq!(summary.emails_sent, 1);
        assert_eq!(summary.emails_failed, 1);

        let failed: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(bouncing.id),
                status: Some(EmailStatus::Failed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].error_message.is_some());
    }

    #[tokio::test]
    async fn test_sweep_skips_members_without_email() {
        let db = Connection::open_test().await;
        let now = Utc::now();
        let today = now.date_naive();
        let overdue = today.checked_sub_days(Days::new(1)).unwrap();

        let silent = db
            .insert(Member {
                full_name: "No Email".to_string(),
                created_at: now,
                ..Member::default()
            })
            .await
            .unwrap();
        active_membership(&db, silent.id, overdue).await;

        let mailer = RecordingMailer::new();
        let summary = run_sweep(&db, &mailer, &GymIdentity::default(), now)
            .await
            .unwrap();

        assert_eq!(summary.notifications_found, 1);
        assert_eq!(summary.emails_sent, 0);
        assert_eq!(summary.emails_failed, 0);
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_notifies_expiring_soon() {
        let db = Connection::open_test().await;
        let now = Utc::now();
        let today = now.date_naive();

        let member = member_with_email(&db, "Soon", "soon@kratos.gym").await;
        let ends = today.checked_add_days(Days::new(3)).unwrap();
        active_membership(&db, member.id, ends).await;

        let mailer = RecordingMailer::new();
        let summary = run_sweep(&db, &mailer, &GymIdentity::default(), now)
            .await
            .unwrap();

        assert_eq!(summary.expired_marked, 0);
        assert_eq!(summary.notifications_found, 1);
        assert_eq!(summary.emails_sent, 1);
    }
}
