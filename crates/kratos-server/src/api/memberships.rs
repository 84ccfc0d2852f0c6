use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use kratos_data::Membership;
use kratos_lifecycle::{self as lifecycle, Activation, ActivationInput, LifecycleError};
use kratos_notify::run_sweep;

use crate::{error::ApiError, state::AppState};

/// Body shared by activate and renew. Fields arrive optional so a
/// missing one maps to 400 instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct CycleBody {
    pub duration_label: Option<String>,
    pub fee_amount: Option<f64>,
    pub start_date: Option<NaiveDate>,
}

impl CycleBody {
    fn into_input(self) -> Result<ActivationInput, ApiError> {
        match (self.duration_label, self.fee_amount, self.start_date) {
            (Some(duration_label), Some(fee_amount), Some(start_date)) => {
                Ok(ActivationInput {
                    duration_label,
                    fee_amount,
                    start_date,
                })
            }
            _ => Err(LifecycleError::Validation(
                "Missing required fields".to_string(),
            )
            .into()),
        }
    }
}

pub async fn activate(
    State(state): State<AppState>,
    Path(member_id): Path<u32>,
    Json(body): Json<CycleBody>,
) -> Result<Json<Activation>, ApiError> {
    let activation = lifecycle::activate(
        &state.db,
        state.mailer.clone(),
        &state.effects,
        &state.gym,
        member_id,
        body.into_input()?,
        Utc::now(),
    )
    .await?;
    Ok(Json(activation))
}

pub async fn renew(
    State(state): State<AppState>,
    Path(membership_id): Path<u32>,
    Json(body): Json<CycleBody>,
) -> Result<Json<Activation>, ApiError> {
    let activation = lifecycle::renew(
        &state.db,
        state.mailer.clone(),
        &state.effects,
        &state.gym,
        membership_id,
        body.into_input()?,
        Utc::now(),
    )
    .await?;
    Ok(Json(activation))
}

pub async fn hold(
    State(state): State<AppState>,
    Path(membership_id): Path<u32>,
) -> Result<Json<Membership>, ApiError> {
    let membership = lifecycle::hold(&state.db, membership_id, Utc::now()).await?;
    Ok(Json(membership))
}

pub async fn resume(
    State(state): State<AppState>,
    Path(membership_id): Path<u32>,
) -> Result<Json<Membership>, ApiError> {
    let membership = lifecycle::resume(&state.db, membership_id, Utc::now()).await?;
    Ok(Json(membership))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(membership_id): Path<u32>,
) -> Result<Json<Membership>, ApiError> {
    let membership = lifecycle::deactivate(&state.db, membership_id, Utc::now()).await?;
    Ok(Json(membership))
}

/// Run the expiry sweep and report what happened.
pub async fn notify(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let summary = run_sweep(&state.db, state.mailer.as_ref(), &state.gym, Utc::now())
        .await
        .map_err(ApiError::Internal)?;
    Ok(Json(json!({ "success": true, "summary": summary })))
}
