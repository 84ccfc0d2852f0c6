use clap::{Parser, Subcommand};

use crate::commands::{Members, Memberships, RunNotify};

#[derive(Parser, Debug)]
#[clap(name = "kratos", version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[clap(long, env = "KRATOS_DB", default_value = "kratos.sqlite3")]
    pub db: String,

    /// Sender address for advisory emails; mailing is disabled
    /// when unset
    #[clap(long, env = "KRATOS_MAIL_FROM")]
    pub mail_from: Option<String>,

    /// Gym display name on receipts and emails
    #[clap(long, env = "KRATOS_GYM_NAME", default_value = "Kratos Fitness")]
    pub gym_name: String,

    /// Name signing the fee slips
    #[clap(long, env = "KRATOS_GYM_SIGNER", default_value = "Studio Manager")]
    pub gym_signer: String,

    #[clap(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn init() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize the database
    #[clap(name = "init")]
    Init,
    /// Manage members
    #[clap(subcommand, name = "members")]
    Members(Members),
    /// Manage membership lifecycles
    #[clap(subcommand, name = "memberships")]
    Memberships(Memberships),
    /// Mark expired memberships and send expiry alerts
    #[clap(name = "notify")]
    Notify(RunNotify),
}
