use std::sync::Arc;

use anyhow::Result;

use kratos_db::{schema, Connection};
use kratos_lifecycle::EffectQueue;
use kratos_notify::{GymIdentity, Mailer, NullMailer, SesMailer};

use crate::{
    auth::{AdminCredentials, SessionStore},
    config::Config,
};

#[derive(Clone)]
pub struct AppState {
    pub db: Connection,
    pub mailer: Arc<dyn Mailer>,
    pub effects: Arc<EffectQueue>,
    pub gym: Arc<GymIdentity>,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<AdminCredentials>,
}

impl AppState {
    pub async fn initialize(config: &Config) -> Result<Self> {
        let db = Connection::open(&config.db).await?;
        schema::install(&db).await?;

        let mailer: Arc<dyn Mailer> = match &config.mail_from {
            Some(from) => Arc::new(SesMailer::from_env(from.clone()).await),
            None => {
                tracing::warn!("KRATOS_MAIL_FROM unset, outgoing mail disabled");
                Arc::new(NullMailer)
            }
        };

        Ok(Self {
            db,
            mailer,
            effects: Arc::new(EffectQueue::new()),
            gym: Arc::new(config.gym_identity()),
            sessions: Arc::new(SessionStore::new(config.session_ttl_hours)),
            credentials: Arc::new(AdminCredentials::new(
                &config.admin_user,
                &config.admin_password,
            )),
        })
    }
}
