use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{api, auth, state::AppState};

/// Everything except the login sits behind the session middleware.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new().route("/api/auth/login", post(api::auth::login));

    let protected = Router::new()
        .route("/api/auth/logout", post(api::auth::logout))
        .route(
            "/api/members",
            get(api::members::list).post(api::members::create),
        )
        .route("/api/members/{id}", get(api::members::show))
        .route("/api/members/{id}/activate", post(api::memberships::activate))
        .route("/api/memberships/{id}/renew", post(api::memberships::renew))
        .route("/api/memberships/{id}/hold", post(api::memberships::hold))
        .route("/api/memberships/{id}/resume", post(api::memberships::resume))
        .route(
            "/api/memberships/{id}/deactivate",
            post(api::memberships::deactivate),
        )
        .route("/api/memberships/notify", post(api::memberships::notify))
        .route("/api/slips/{id}", get(api::slips::latest))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    public
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
