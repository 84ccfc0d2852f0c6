//! kratos-server: gym administration backend
//!
//! Thin HTTP layer over the membership lifecycle: member CRUD,
//! activate/renew/hold/resume/deactivate, fee slips and the expiry
//! notification sweep.

mod api;
mod auth;
mod config;
mod error;
mod routes;
mod state;

use anyhow::Result;
use clap::Parser;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kratos_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::parse();
    let state = AppState::initialize(&config).await?;
    let app = routes::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    tracing::info!("kratos-server listening on {}", config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
