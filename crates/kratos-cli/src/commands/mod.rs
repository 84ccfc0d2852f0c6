use std::sync::Arc;

use kratos_lifecycle::EffectQueue;
use kratos_notify::{GymIdentity, Mailer, NullMailer, SesMailer};

use crate::cli::Cli;

mod members;
pub use members::*;

mod memberships;
pub use memberships::*;

mod notify;
pub use notify::*;

/// Shared plumbing for commands with side effects.
pub struct OpContext {
    pub mailer: Arc<dyn Mailer>,
    pub gym: GymIdentity,
    pub effects: EffectQueue,
}

impl OpContext {
    pub async fn from_cli(cli: &Cli) -> Self {
        let mailer: Arc<dyn Mailer> = match &cli.mail_from {
            Some(from) => Arc::new(SesMailer::from_env(from.clone()).await),
            None => Arc::new(NullMailer),
        };
        Self {
            mailer,
            gym: GymIdentity {
                name: cli.gym_name.clone(),
                signer: cli.gym_signer.clone(),
                ..GymIdentity::default()
            },
            effects: EffectQueue::new(),
        }
    }
}
