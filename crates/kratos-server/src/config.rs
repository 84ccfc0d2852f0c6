use clap::Parser;

use kratos_notify::GymIdentity;

/// Server configuration, from flags or environment.
#[derive(Parser, Debug, Clone)]
#[clap(name = "kratos-server", version = env!("CARGO_PKG_VERSION"))]
pub struct Config {
    /// SQLite database file
    #[clap(long, env = "KRATOS_DB", default_value = "kratos.sqlite3")]
    pub db: String,

    /// Listen address
    #[clap(long, env = "KRATOS_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: String,

    /// Admin login name
    #[clap(long, env = "KRATOS_ADMIN_USER")]
    pub admin_user: String,

    /// Admin password
    #[clap(long, env = "KRATOS_ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: String,

    /// Session lifetime in hours
    #[clap(long, env = "KRATOS_SESSION_TTL_HOURS", default_value_t = 24)]
    pub session_ttl_hours: i64,

    /// Sender address for outgoing mail; mailing is disabled
    /// when unset
    #[clap(long, env = "KRATOS_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Gym display name on receipts and emails
    #[clap(long, env = "KRATOS_GYM_NAME", default_value = "Kratos Fitness")]
    pub gym_name: String,

    /// Name signing the fee slips
    #[clap(long, env = "KRATOS_GYM_SIGNER", default_value = "Studio Manager")]
    pub gym_signer: String,

    #[clap(long, env = "KRATOS_GYM_ADDRESS", default_value = "")]
    pub gym_address: String,

    #[clap(long, env = "KRATOS_GYM_PHONE", default_value = "")]
    pub gym_phone: String,

    #[clap(long, env = "KRATOS_GYM_EMAIL", default_value = "")]
    pub gym_email: String,
}

impl Config {
    pub fn gym_identity(&self) -> GymIdentity {
        GymIdentity {
            name: self.gym_name.clone(),
            signer: self.gym_signer.clone(),
            address: self.gym_address.clone(),
            phone: self.gym_phone.clone(),
            email: self.gym_email.clone(),
        }
    }
}
