use chrono::{DateTime, Utc};

use kratos_data::{Membership, MembershipStatus, Retrieve, Update};

use crate::LifecycleError;

/// Pause an active membership. The clock stops now; the end date is
/// extended on resume by however long the pause lasted.
pub async fn hold<DB>(
    db: &DB,
    membership_id: u32,
    now: DateTime<Utc>,
) -> Result<Membership, LifecycleError>
where
    DB: Retrieve<Membership, Key = u32> + Update<Membership> + Sync,
{
    let membership: Membership = db
        .retrieve(membership_id)
        .await
        .map_err(|err| LifecycleError::from_store("membership", err))?;

    if membership.status != MembershipStatus::Active {
        return Err(LifecycleError::InvalidTransition {
            action: "hold",
            status: membership.status,
        });
    }

    let membership = db
        .update(Membership {
            status: MembershipStatus::Hold,
            paused_at: Some(now),
            updated_at: now,
            ..membership
        })
        .await?;
    tracing::info!(membership_id = membership.id, "Membership put on hold");
    Ok(membership)
}

/// Reactivate a held membership, crediting the paused days onto the
/// end date.
pub async fn resume<DB>(
    db: &DB,
    membership_id: u32,
    now: DateTime<Utc>,
) -> Result<Membership, LifecycleError>
where
    DB: Retrieve<Membership, Key = u32> + Update<Membership> + Sync,
{
    let membership: Membership = db
        .retrieve(membership_id)
        .await
        .map_err(|err| LifecycleError::from_store("membership", err))?;

    let paused_at = match (membership.status, membership.paused_at) {
        (MembershipStatus::Hold, Some(paused_at)) => paused_at,
        _ => {
            return Err(LifecycleError::InvalidTransition {
                action: "resume",
                status: membership.status,
            });
        }
    };

    // Whole days only; partial days are not credited
    let elapsed = (now - paused_at).num_days().max(0);

    let membership = db
        .update(Membership {
            status: MembershipStatus::Active,
            end_date: membership.end_date_plus_days(elapsed),
            paused_at: None,
            paused_days: membership.paused_days + elapsed,
            updated_at: now,
            ..membership
        })
        .await?;
    tracing::info!(
        membership_id = membership.id,
        credited_days = elapsed,
        "Membership resumed"
    );
    Ok(membership)
}

/// Retire a membership. Always allowed; clears any leftover hold
/// marker without crediting days.
pub async fn deactivate<DB>(
    db: &DB,
    membership_id: u32,
    now: DateTime<Utc>,
) -> Result<Membership, LifecycleError>
where
    DB: Retrieve<Membership, Key = u32> + Update<Membership> + Sync,
{
    let membership: Membership = db
        .retrieve(membership_id)
        .await
        .map_err(|err| LifecycleError::from_store("membership", err))?;

    let membership = db
        .update(Membership {
            status: MembershipStatus::Inactive,
            paused_at: None,
            updated_at: now,
            ..membership
        })
        .await?;
    tracing::info!(membership_id = membership.id, "Membership deactivated");
    Ok(membership)
}
