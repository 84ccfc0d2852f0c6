use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use kratos_data::{
    FeeSlip, Insert, Member, Membership, MembershipRenewal, MembershipStatus, Payment,
    Retrieve, Update,
};
use kratos_notify::{fee_slip_email, GymIdentity, Mailer};

use crate::{compute_end_date, EffectQueue, LifecycleError};

/// Attempts for the best-effort renewal audit row.
pub const RENEWAL_WRITE_ATTEMPTS: u32 = 3;
const RENEWAL_WRITE_DELAY: Duration = Duration::from_secs(1);

/// Operator input for activate and renew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationInput {
    pub duration_label: String,
    pub fee_amount: f64,
    pub start_date: NaiveDate,
}

impl ActivationInput {
    fn validate(&self) -> Result<(), LifecycleError> {
        if self.duration_label.trim().is_empty() {
            return Err(LifecycleError::Validation(
                "duration_label is required".to_string(),
            ));
        }
        if !(self.fee_amount > 0.0) {
            return Err(LifecycleError::Validation(
                "fee_amount must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of a successful activate or renew: the membership row and
/// the freshly issued receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activation {
    pub membership: Membership,
    #[serde(rename = "feeSlip")]
    pub fee_slip: FeeSlip,
}

/// Start a new membership cycle for a member. Writes the membership,
/// a payment ledger row and a fee slip; all three are hard. The
/// receipt email is advisory and goes through the effect queue.
pub async fn activate<DB>(
    db: &DB,
    mailer: Arc<dyn Mailer>,
    effects: &EffectQueue,
    gym: &GymIdentity,
    member_id: u32,
    input: ActivationInput,
    now: DateTime<Utc>,
) -> Result<Activation, LifecycleError>
where
    DB: Retrieve<Member, Key = u32>
        + Insert<Membership>
        + Insert<Payment>
        + Insert<FeeSlip>
        + Sync,
{
    input.validate()?;

    let member: Member = db
        .retrieve(member_id)
        .await
        .map_err(|err| LifecycleError::from_store("member", err))?;

    let end_date = compute_end_date(input.start_date, &input.duration_label);

    let membership = db
        .insert(Membership {
            member_id: member.id,
            start_date: input.start_date,
            end_date,
            duration_label: input.duration_label.clone(),
            fee_amount: input.fee_amount,
            status: MembershipStatus::Active,
            paused_at: None,
            paused_days: 0,
            created_at: now,
            updated_at: now,
            ..Membership::default()
        })
        .await?;
    tracing::info!(
        member_id = member.id,
        membership_id = membership.id,
        "Membership activated"
    );

    db.insert(Payment {
        member_id: member.id,
        membership_id: membership.id,
        amount: input.fee_amount,
        note: format!("Payment for {} membership", input.duration_label),
        created_at: now,
        ..Payment::default()
    })
    .await?;

    let fee_slip = issue_fee_slip(db, gym, &membership, now).await?;

    dispatch_receipt_email(
        effects,
        mailer,
        &member,
        &fee_slip,
        gym,
        gym.fee_slip_subject(),
    );

    Ok(Activation {
        membership,
        fee_slip,
    })
}

/// Renew an existing membership into a fresh active cycle. The hold
/// timestamp is cleared; accumulated paused days are kept as history.
/// Audit row and confirmation email are advisory.
pub async fn renew<DB>(
    db: &DB,
    mailer: Arc<dyn Mailer>,
    effects: &EffectQueue,
    gym: &GymIdentity,
    membership_id: u32,
    input: ActivationInput,
    now: DateTime<Utc>,
) -> Result<Activation, LifecycleError>
where
    DB: Retrieve<Membership, Key = u32>
        + Retrieve<Member, Key = u32>
        + Update<Membership>
        + Insert<Payment>
        + Insert<FeeSlip>
        + Insert<MembershipRenewal>
        + Clone
        + Send
        + Sync
        + 'static,
{
    input.validate()?;

    let current: Membership = db
        .retrieve(membership_id)
        .await
        .map_err(|err| LifecycleError::from_store("membership", err))?;
    let previous_end_date = current.end_date;

    let end_date = compute_end_date(input.start_date, &input.duration_label);
    let membership = db
        .update(Membership {
            start_date: input.start_date,
            end_date,
            duration_label: input.duration_label.clone(),
            fee_amount: input.fee_amount,
            status: MembershipStatus::Active,
            paused_at: None,
            updated_at: now,
            ..current
        })
        .await?;
    tracing::info!(membership_id = membership.id, "Membership renewed");

    db.insert(Payment {
        member_id: membership.member_id,
        membership_id: membership.id,
        amount: input.fee_amount,
        note: format!("Renewal payment for {} membership", input.duration_label),
        created_at: now,
        ..Payment::default()
    })
    .await?;

    let fee_slip = issue_fee_slip(db, gym, &membership, now).await?;

    let renewal = MembershipRenewal {
        membership_id: membership.id,
        member_id: membership.member_id,
        previous_end_date,
        new_end_date: end_date,
        duration_label: input.duration_label.clone(),
        fee_amount: input.fee_amount,
        renewed_by: gym.signer.clone(),
        created_at: now,
        ..MembershipRenewal::default()
    };
    let audit_db = db.clone();
    effects.dispatch("renewal audit row", async move {
        record_renewal(&audit_db, renewal).await;
        Ok(())
    });

    // The member lookup only serves the confirmation email
    let member: anyhow::Result<Member> = db.retrieve(membership.member_id).await;
    match member {
        Ok(member) => {
            dispatch_receipt_email(
                effects,
                mailer,
                &member,
                &fee_slip,
                gym,
                gym.renewal_subject(),
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "Could not load member for renewal email");
        }
    }

    Ok(Activation {
        membership,
        fee_slip,
    })
}

async fn issue_fee_slip<DB>(
    db: &DB,
    gym: &GymIdentity,
    membership: &Membership,
    now: DateTime<Utc>,
) -> Result<FeeSlip, LifecycleError>
where
    DB: Insert<FeeSlip> + Sync,
{
    let slip = db
        .insert(FeeSlip {
            member_id: membership.member_id,
            membership_id: membership.id,
            issued_on: now.date_naive(),
            fee_amount: membership.fee_amount,
            start_date: membership.start_date,
            end_date: membership.end_date,
            duration_label: membership.duration_label.clone(),
            gym_name: gym.name.clone(),
            signed_by: gym.signer.clone(),
            created_at: now,
            ..FeeSlip::default()
        })
        .await?;
    Ok(slip)
}

fn dispatch_receipt_email(
    effects: &EffectQueue,
    mailer: Arc<dyn Mailer>,
    member: &Member,
    fee_slip: &FeeSlip,
    gym: &GymIdentity,
    subject: String,
) {
    let Some(email) = member.contact_email() else {
        return;
    };
    let to = email.to_string();
    let html = fee_slip_email(&member.full_name, fee_slip, gym);
    effects.dispatch("fee slip email", async move {
        mailer.send(&to, &subject, &html).await
    });
}

/// Write the renewal audit row, retrying transient store failures.
/// Returns whether a row was written; the renewal itself never
/// depends on the answer.
pub async fn record_renewal<DB>(db: &DB, renewal: MembershipRenewal) -> bool
where
    DB: Insert<MembershipRenewal> + Sync,
{
    for attempt in 1..=RENEWAL_WRITE_ATTEMPTS {
        match db.insert(renewal.clone()).await {
            Ok(_) => {
                tracing::info!(
                    membership_id = renewal.membership_id,
                    "Renewal record created"
                );
                return true;
            }
            Err(err) => {
                tracing::error!(
                    attempt = attempt,
                    error = %err,
                    "Renewal record creation failed"
                );
                if attempt < RENEWAL_WRITE_ATTEMPTS {
                    tokio::time::sleep(RENEWAL_WRITE_DELAY).await;
                }
            }
        }
    }
    tracing::warn!(
        membership_id = renewal.membership_id,
        "No renewal record after {} attempts, continuing without it",
        RENEWAL_WRITE_ATTEMPTS
    );
    false
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use kratos_data::{FeeSlipFilter, PaymentFilter, Query, RenewalFilter};
    use kratos_db::Connection;
    use kratos_notify::RecordingMailer;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn input(label: &str, fee: f64, start: NaiveDate) -> ActivationInput {
        ActivationInput {
            duration_label: label.to_string(),
            fee_amount: fee,
            start_date: start,
        }
    }

    async fn test_member(db: &Connection, email: Option<&str>) -> Member {
        db.insert(Member {
            full_name: "Alex Strong".to_string(),
            email: email.map(|e| e.to_string()),
            created_at: Utc::now(),
            ..Member::default()
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_activate_creates_membership_payment_and_slip() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let mailer = Arc::new(RecordingMailer::new());
        let gym = GymIdentity::default();
        let member = test_member(&db, Some("alex@kratos.gym")).await;

        let activation = activate(
            &db,
            mailer.clone(),
            &effects,
            &gym,
            member.id,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(activation.membership.status, MembershipStatus::Active);
        assert_eq!(activation.membership.start_date, date(2024, 1, 15));
        assert_eq!(activation.membership.end_date, date(2024, 2, 15));
        assert_eq!(activation.membership.paused_days, 0);
        assert_eq!(activation.fee_slip.membership_id, activation.membership.id);
        assert_eq!(activation.fee_slip.gym_name, gym.name);

        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                membership_id: Some(activation.membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, 500.0);

        effects.drain().await;
        assert_eq!(mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_activate_survives_email_failure() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let mailer = Arc::new(RecordingMailer::failing());
        let member = test_member(&db, Some("alex@kratos.gym")).await;

        let activation = activate(
            &db,
            mailer,
            &effects,
            &GymIdentity::default(),
            member.id,
            input("3 months", 1400.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await
        .unwrap();
        effects.drain().await;

        // Membership, payment and slip all exist despite the bounce
        assert_eq!(activation.membership.end_date, date(2024, 4, 15));
        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                membership_id: Some(activation.membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);

        let stored: Membership = db.retrieve(activation.membership.id).await.unwrap();
        assert_eq!(stored.status, MembershipStatus::Active);
    }

    #[tokio::test]
    async fn test_activate_without_email_sends_nothing() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let mailer = Arc::new(RecordingMailer::new());
        let member = test_member(&db, None).await;

        activate(
            &db,
            mailer.clone(),
            &effects,
            &GymIdentity::default(),
            member.id,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await
        .unwrap();
        effects.drain().await;
        assert_eq!(mailer.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_activate_unknown_member() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();

        let result = activate(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &GymIdentity::default(),
            4711,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(LifecycleError::NotFound("member"))));
    }

    #[tokio::test]
    async fn test_activate_rejects_bad_input() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let gym = GymIdentity::default();
        let member = test_member(&db, None).await;

        let result = activate(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &gym,
            member.id,
            input("1 month", 0.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(LifecycleError::Validation(_))));

        let result = activate(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &gym,
            member.id,
            input("  ", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await;
        assert!(matches!(result, Err(LifecycleError::Validation(_))));
    }

    #[tokio::test]
    async fn test_renew_resets_cycle_and_records_audit_row() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let mailer = Arc::new(RecordingMailer::new());
        let gym = GymIdentity::default();
        let member = test_member(&db, Some("alex@kratos.gym")).await;

        let first = activate(
            &db,
            mailer.clone(),
            &effects,
            &gym,
            member.id,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await
        .unwrap();

        let renewed = renew(
            &db,
            mailer.clone(),
            &effects,
            &gym,
            first.membership.id,
            input("3 months", 1400.0, date(2024, 2, 15)),
            Utc::now(),
        )
        .await
        .unwrap();
        effects.drain().await;

        assert_eq!(renewed.membership.id, first.membership.id);
        assert_eq!(renewed.membership.status, MembershipStatus::Active);
        assert_eq!(renewed.membership.start_date, date(2024, 2, 15));
        assert_eq!(renewed.membership.end_date, date(2024, 5, 15));
        assert_eq!(renewed.membership.paused_at, None);

        let renewals: Vec<MembershipRenewal> = db
            .query(&RenewalFilter {
                membership_id: Some(first.membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(renewals.len(), 1);
        assert_eq!(renewals[0].previous_end_date, date(2024, 2, 15));
        assert_eq!(renewals[0].new_end_date, date(2024, 5, 15));

        // Activation receipt plus renewal confirmation
        assert_eq!(mailer.sent_count(), 2);

        // One payment and one slip per cycle
        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                membership_id: Some(first.membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payments.len(), 2);

        let slips: Vec<FeeSlip> = db
            .query(&FeeSlipFilter {
                membership_id: Some(first.membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(slips.len(), 2);
    }

    #[tokio::test]
    async fn test_renew_survives_missing_audit_table() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();
        let gym = GymIdentity::default();
        let member = test_member(&db, None).await;

        let first = activate(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &gym,
            member.id,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await
        .unwrap();

        // Sabotage the audit table; every write attempt will fail
        sqlx::query("DROP TABLE membership_renewals")
            .execute(&mut *db.lock().await)
            .await
            .unwrap();

        let renewed = renew(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &gym,
            first.membership.id,
            input("1 month", 500.0, date(2024, 2, 15)),
            Utc::now(),
        )
        .await
        .unwrap();
        effects.drain().await;

        assert_eq!(renewed.membership.end_date, date(2024, 3, 15));
        assert_eq!(renewed.fee_slip.membership_id, renewed.membership.id);
    }

    #[tokio::test]
    async fn test_renew_unknown_membership() {
        let db = Connection::open_test().await;
        let effects = EffectQueue::new();

        let result = renew(
            &db,
            Arc::new(RecordingMailer::new()),
            &effects,
            &GymIdentity::default(),
            4711,
            input("1 month", 500.0, date(2024, 1, 15)),
            Utc::now(),
        )
        .await;
        assert!(matches!(
            result,
            Err(LifecycleError::NotFound("membership"))
        ));
    }

    /// Insert stub failing a configured number of times.
    struct FlakyRenewalStore {
        failures_left: AtomicU32,
        inserted: AtomicU32,
    }

    impl FlakyRenewalStore {
        fn failing(times: u32) -> Self {
            Self {
                failures_left: AtomicU32::new(times),
                inserted: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl Insert<MembershipRenewal> for FlakyRenewalStore {
        async fn insert(&self, renewal: MembershipRenewal) -> anyhow::Result<MembershipRenewal> {
            if self.failures_left.load(Ordering::SeqCst) > 0 {
                self.failures_left.fetch_sub(1, Ordering::SeqCst);
                return Err(anyhow!("schema cache not ready"));
            }
            self.inserted.fetch_add(1, Ordering::SeqCst);
            Ok(renewal)
        }
    }

    #[tokio::test]
    async fn test_record_renewal_retries_then_succeeds() {
        let store = FlakyRenewalStore::failing(1);
        let written = record_renewal(&store, MembershipRenewal::default()).await;
        assert!(written);
        assert_eq!(store.inserted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_record_renewal_gives_up_after_three_attempts() {
        let store = FlakyRenewalStore::failing(u32::MAX);
        let written = record_renewal(&store, MembershipRenewal::default()).await;
        assert!(!written);
        assert_eq!(store.inserted.load(Ordering::SeqCst), 0);
    }
}
