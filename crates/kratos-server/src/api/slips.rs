use axum::{
    extract::{Path, State},
    Json,
};

use kratos_data::{FeeSlip, FeeSlipFilter, Retrieve};
use kratos_lifecycle::LifecycleError;

use crate::{error::ApiError, state::AppState};

/// Latest fee slip issued for a membership.
pub async fn latest(
    State(state): State<AppState>,
    Path(membership_id): Path<u32>,
) -> Result<Json<FeeSlip>, ApiError> {
    let slip: FeeSlip = state
        .db
        .retrieve(FeeSlipFilter {
            membership_id: Some(membership_id),
            ..Default::default()
        })
        .await
        .map_err(|err| LifecycleError::from_store("fee slip", err))?;
    Ok(Json(slip))
}
