use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use kratos_data::{
    current_membership, Insert, Member, MemberFilter, Membership, MembershipStatus,
    Query, Retrieve,
};
use kratos_lifecycle::LifecycleError;

use crate::{error::ApiError, state::AppState};

/// A member with its full membership history and the status the
/// resolver considers authoritative.
#[derive(Debug, Serialize)]
pub struct MemberOverview {
    #[serde(flatten)]
    pub member: Member,
    pub memberships: Vec<Membership>,
    pub current_status: Option<MembershipStatus>,
}

async fn overview(state: &AppState, member: Member) -> Result<MemberOverview, ApiError> {
    let memberships = member
        .get_memberships(&state.db)
        .await
        .map_err(ApiError::Internal)?;
    let current_status = current_membership(&memberships).map(|m| m.status);
    Ok(MemberOverview {
        member,
        memberships,
        current_status,
    })
}

/// Members, newest first, with their membership history.
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<MemberOverview>>, ApiError> {
    let mut members: Vec<Member> = state
        .db
        .query(&MemberFilter::default())
        .await
        .map_err(ApiError::Internal)?;
    members.reverse();

    let mut overviews = Vec::with_capacity(members.len());
    for member in members {
        overviews.push(overview(&state, member).await?);
    }
    Ok(Json(overviews))
}

pub async fn show(
    State(state): State<AppState>,
    Path(member_id): Path<u32>,
) -> Result<Json<MemberOverview>, ApiError> {
    let member: Member = state
        .db
        .retrieve(member_id)
        .await
        .map_err(|err| LifecycleError::from_store("member", err))?;
    Ok(Json(overview(&state, member).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateMemberBody {
    #[serde(default)]
    pub full_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateMemberBody>,
) -> Result<Json<Member>, ApiError> {
    let full_name = body.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(
            LifecycleError::Validation("full_name is required".to_string()).into(),
        );
    }

    let member = state
        .db
        .insert(Member {
            full_name,
            phone: clean(body.phone),
            email: clean(body.email),
            notes: clean(body.notes).unwrap_or_default(),
            created_at: Utc::now(),
            ..Member::default()
        })
        .await
        .map_err(ApiError::Internal)?;
    tracing::info!(member_id = member.id, "Member created");
    Ok(Json(member))
}
