use anyhow::Result;
use chrono::{NaiveDate, Utc};
use clap::{Args, Subcommand};
use inquire::Confirm;

use kratos_data::{
    current_membership, FeeSlip, FeeSlipFilter, Member, Membership, MembershipFilter,
    Query, Retrieve,
};
use kratos_db::Connection;
use kratos_lifecycle::{
    activate, deactivate, hold, renew, resume, ActivationInput, DURATION_LABELS,
};

use crate::formatting::PrintFormatted;

use super::OpContext;

fn warn_unknown_duration(duration: &str) {
    if !DURATION_LABELS.contains(&duration.to_lowercase().as_str()) {
        println!(
            "Unknown duration {:?}, a single month will be charged. Known: {}",
            duration,
            DURATION_LABELS.join(", ")
        );
    }
}

#[derive(Subcommand, Debug)]
pub enum Memberships {
    /// Show a member's membership history
    #[clap(name = "show")]
    Show(ShowMemberships),
    /// Start a new membership for a member
    #[clap(name = "activate")]
    Activate(ActivateMembership),
    /// Renew a membership into a fresh cycle
    #[clap(name = "renew")]
    Renew(RenewMembership),
    /// Put a membership on hold
    #[clap(name = "hold")]
    Hold(HoldMembership),
    /// Resume a held membership
    #[clap(name = "resume")]
    Resume(ResumeMembership),
    /// Deactivate a membership
    #[clap(name = "deactivate")]
    Deactivate(DeactivateMembership),
    /// Show the latest fee slip of a membership
    #[clap(name = "slip")]
    Slip(ShowSlip),
}

impl Memberships {
    pub async fn run(self, db: &Connection, ctx: &OpContext) -> Result<()> {
        match self {
            Memberships::Show(cmd) => cmd.run(db).await,
            Memberships::Activate(cmd) => cmd.run(db, ctx).await,
            Memberships::Renew(cmd) => cmd.run(db, ctx).await,
            Memberships::Hold(cmd) => cmd.run(db).await,
            Memberships::Resume(cmd) => cmd.run(db).await,
            Memberships::Deactivate(cmd) => cmd.run(db).await,
            Memberships::Slip(cmd) => cmd.run(db).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowMemberships {
    #[clap(short, long)]
    pub member_id: u32,
}

impl ShowMemberships {
    /// Show all memberships of a member, marking the current one
    pub async fn run(self, db: &Connection) -> Result<()> {
        let member: Member = db.retrieve(self.member_id).await?;
        let memberships: Vec<Membership> = db
            .query(&MembershipFilter {
                member_id: Some(member.id),
                ..Default::default()
            })
            .await?;

        println!();
        member.print_formatted();
        println!();
        println!("{} memberships.", memberships.len());
        memberships.print_formatted();

        if let Some(current) = current_membership(&memberships) {
            println!();
            println!("Current membership: {} ({})", current.id, current.status);
            let today = Utc::now().date_naive();
            if current.has_expired(today) {
                println!(
                    "Ended {} ({} days ago).",
                    current.end_date,
                    -current.days_remaining(today)
                );
            } else {
                println!("{} days remaining.", current.days_remaining(today));
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ActivateMembership {
    #[clap(short, long)]
    pub member_id: u32,
    /// One of "1 month", "3 months", "1 year"
    #[clap(short, long)]
    pub duration: String,
    #[clap(short, long)]
    pub fee: f64,
    /// Defaults to today
    #[clap(short, long)]
    pub start: Option<NaiveDate>,
}

impl ActivateMembership {
    pub async fn run(self, db: &Connection, ctx: &OpContext) -> Result<()> {
        let start = self.start.unwrap_or_else(|| Utc::now().date_naive());
        warn_unknown_duration(&self.duration);

        let prompt = format!(
            "Activate {} membership for member {} at {:.2}?",
            self.duration, self.member_id, self.fee
        );
        let confirm = Confirm::new(&prompt).with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        let activation = activate(
            db,
            ctx.mailer.clone(),
            &ctx.effects,
            &ctx.gym,
            self.member_id,
            ActivationInput {
                duration_label: self.duration,
                fee_amount: self.fee,
                start_date: start,
            },
            Utc::now(),
        )
        .await?;

        println!();
        activation.membership.print_formatted();
        println!();
        activation.fee_slip.print_formatted();

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct RenewMembership {
    #[clap(short, long)]
    pub id: u32,
    #[clap(short, long)]
    pub duration: String,
    #[clap(short, long)]
    pub fee: f64,
    /// Defaults to today
    #[clap(short, long)]
    pub start: Option<NaiveDate>,
}

impl RenewMembership {
    pub async fn run(self, db: &Connection, ctx: &OpContext) -> Result<()> {
        let start = self.start.unwrap_or_else(|| Utc::now().date_naive());
        warn_unknown_duration(&self.duration);

        let prompt = format!(
            "Renew membership {} for {} at {:.2}?",
            self.id, self.duration, self.fee
        );
        let confirm = Confirm::new(&prompt).with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        let activation = renew(
            db,
            ctx.mailer.clone(),
            &ctx.effects,
            &ctx.gym,
            self.id,
            ActivationInput {
                duration_label: self.duration,
                fee_amount: self.fee,
                start_date: start,
            },
            Utc::now(),
        )
        .await?;

        println!();
        activation.membership.print_formatted();
        println!();
        activation.fee_slip.print_formatted();

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct HoldMembership {
    #[clap(short, long)]
    pub id: u32,
}

impl HoldMembership {
    pub async fn run(self, db: &Connection) -> Result<()> {
        let membership = hold(db, self.id, Utc::now()).await?;
        println!();
        membership.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ResumeMembership {
    #[clap(short, long)]
    pub id: u32,
}

impl ResumeMembership {
    pub async fn run(self, db: &Connection) -> Result<()> {
        let membership = resume(db, self.id, Utc::now()).await?;
        println!();
        membership.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeactivateMembership {
    #[clap(short, long)]
    pub id: u32,
}

impl DeactivateMembership {
    pub async fn run(self, db: &Connection) -> Result<()> {
        let membership = deactivate(db, self.id, Utc::now()).await?;
        println!();
        membership.print_formatted();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ShowSlip {
    /// Membership id
    #[clap(short, long)]
    pub id: u32,
}

impl ShowSlip {
    pub async fn run(self, db: &Connection) -> Result<()> {
        let slip: FeeSlip = db
            .retrieve(FeeSlipFilter {
                membership_id: Some(self.id),
                ..Default::default()
            })
            .await?;
        println!();
        slip.print_formatted();
        Ok(())
    }
}
