use anyhow::Result;
use chrono::Utc;
use clap::Args;

use kratos_data::{EmailLogEntry, EmailLogFilter, Query};
use kratos_db::Connection;
use kratos_notify::run_sweep;

use crate::formatting::PrintFormatted;

use super::OpContext;

#[derive(Args, Debug)]
pub struct RunNotify {
    /// List logged notification attempts instead of sweeping
    #[clap(long)]
    pub history: bool,
}

impl RunNotify {
    /// Run the expiry sweep and print the summary
    pub async fn run(self, db: &Connection, ctx: &OpContext) -> Result<()> {
        if self.history {
            let entries: Vec<EmailLogEntry> =
                db.query(&EmailLogFilter::default()).await?;
            println!("{} notification attempts.", entries.len());
            entries.print_formatted();
            return Ok(());
        }

        let summary = run_sweep(db, ctx.mailer.as_ref(), &ctx.gym, Utc::now()).await?;
        println!();
        summary.print_formatted();
        Ok(())
    }
}
