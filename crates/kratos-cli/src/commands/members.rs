use anyhow::{anyhow, Result};
use chrono::Utc;
use clap::{Args, Subcommand};
use inquire::Confirm;

use kratos_data::{Delete, Insert, Member, MemberFilter, Query, Retrieve, Update};
use kratos_db::Connection;

use crate::formatting::PrintFormatted;

#[derive(Subcommand, Debug)]
pub enum Members {
    /// Show a member
    #[clap(name = "show")]
    Show(ShowMember),
    /// List members
    #[clap(name = "list")]
    List(ListMembers),
    /// Add a member
    #[clap(name = "add")]
    Add(AddMember),
    /// Update a member
    #[clap(name = "set")]
    Update(UpdateMember),
    /// Delete a member
    #[clap(name = "delete")]
    Delete(DeleteMember),
}

impl Members {
    pub async fn run(self, db: &Connection) -> Result<()> {
        match self {
            Members::Show(cmd) => cmd.run(db).await,
            Members::List(cmd) => cmd.run(db).await,
            Members::Add(cmd) => cmd.run(db).await,
            Members::Update(cmd) => cmd.run(db).await,
            Members::Delete(cmd) => cmd.run(db).await,
        }
    }
}

#[derive(Args, Debug)]
pub struct ShowMember {
    #[clap(short, long)]
    pub id: u32,
}

impl ShowMember {
    /// Run the command and show a member
    pub async fn run(self, db: &Connection) -> Result<()> {
        let member: Member = db.retrieve(self.id).await?;
        println!();
        member.print_formatted();
        println!();
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListMembers {
    #[clap(short, long)]
    pub id: Option<u32>,
    #[clap(short, long)]
    pub name: Option<String>,
    #[clap(short, long)]
    pub email: Option<String>,
}

impl ListMembers {
    /// Run the command and list members
    pub async fn run(self, db: &Connection) -> Result<()> {
        let filter = MemberFilter {
            id: self.id,
            name: self.name,
            email: self.email,
            ..Default::default()
        };

        let members: Vec<Member> = db.query(&filter).await?;
        println!("{} members.", members.len());
        members.print_formatted();

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct AddMember {
    #[clap(short, long)]
    pub name: String,
    #[clap(short, long)]
    pub phone: Option<String>,
    #[clap(short, long)]
    pub email: Option<String>,
    #[clap(short = 'c', long)]
    pub notes: Option<String>,
}

impl AddMember {
    /// Run the command and add a member to the database
    pub async fn run(self, db: &Connection) -> Result<()> {
        // Check if a member with this email already exists
        if let Some(email) = &self.email {
            let members: Vec<Member> = db
                .query(&MemberFilter {
                    email: Some(email.clone()),
                    ..Default::default()
                })
                .await?;
            if !members.is_empty() {
                return Err(anyhow!("Member with email {} already exists.", email));
            }
        }

        let member = Member {
            full_name: self.name,
            phone: self.phone,
            email: self.email,
            notes: self.notes.unwrap_or_default(),
            created_at: Utc::now(),
            ..Member::default()
        };

        println!();
        member.print_formatted();
        println!();

        // Confirm adding member
        let confirm = Confirm::new("Add member?").with_default(true);
        if !confirm.prompt()? {
            return Ok(());
        }

        let member = db.insert(member).await?;
        println!("Member added with id {}.", member.id);

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct UpdateMember {
    #[clap(short, long)]
    pub id: u32,
    #[clap(short, long)]
    pub name: Option<String>,
    #[clap(short, long)]
    pub phone: Option<String>,
    #[clap(short, long)]
    pub email: Option<String>,
    #[clap(short = 'c', long)]
    pub notes: Option<String>,
}

impl UpdateMember {
    /// Run the command and update a member
    pub async fn run(self, db: &Connection) -> Result<()> {
        let member: Member = db.retrieve(self.id).await?;
        let member = Member {
            full_name: self.name.unwrap_or(member.full_name),
            phone: self.phone.or(member.phone),
            email: self.email.or(member.email),
            notes: self.notes.unwrap_or(member.notes),
            ..member
        };

        let member = db.update(member).await?;
        println!();
        member.print_formatted();
        println!();

        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteMember {
    #[clap(short, long)]
    pub id: u32,
}

impl DeleteMember {
    /// Run the command and delete a member
    pub async fn run(self, db: &Connection) -> Result<()> {
        let member: Member = db.retrieve(self.id).await?;
        println!();
        member.print_formatted();
        println!();

        let confirm = Confirm::new("Delete member?").with_default(false);
        if !confirm.prompt()? {
            return Ok(());
        }

        db.delete(member).await?;
        println!("Member deleted.");

        Ok(())
    }
}
