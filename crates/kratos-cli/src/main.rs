use anyhow::Result;

use kratos_cli::cli::{Cli, Command};
use kratos_cli::commands::OpContext;
use kratos_db::{schema, Connection};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kratos=warn".into()),
        )
        .init();

    let cli = Cli::init();
    let db = Connection::open(&cli.db).await?;
    let ctx = OpContext::from_cli(&cli).await;

    match cli.command {
        Command::Init => {
            schema::install(&db).await?;
            println!("Database initialized.");
        }
        Command::Members(cmd) => cmd.run(&db).await?,
        Command::Memberships(cmd) => cmd.run(&db, &ctx).await?,
        Command::Notify(cmd) => cmd.run(&db, &ctx).await?,
    }

    // Let advisory emails and audit rows settle before exit
    ctx.effects.drain().await;

    Ok(())
}
