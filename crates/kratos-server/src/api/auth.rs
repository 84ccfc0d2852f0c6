use axum::{
    extract::{Request, State},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    auth::{extract_token, SESSION_COOKIE},
    error::ApiError,
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.credentials.verify(&body.username, &body.password) {
        tracing::warn!(username = %body.username, "Rejected login");
        return Err(ApiError::Unauthorized);
    }

    let token = state.sessions.issue(&body.username);
    tracing::info!(username = %body.username, "Admin logged in");

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Strict",
        SESSION_COOKIE, token
    );
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(json!({ "token": token })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Json<serde_json::Value> {
    if let Some(token) = extract_token(&request) {
        state.sessions.revoke(&token);
    }
    // Clearing an unknown token is still a successful logout
    Json(json!({ "success": true }))
}
