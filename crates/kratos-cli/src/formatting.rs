use kratos_data::{EmailLogEntry, FeeSlip, Member, Membership};
use kratos_notify::SweepSummary;

pub trait PrintFormatted {
    fn print_formatted(&self);
}

impl PrintFormatted for Member {
    fn print_formatted(&self) {
        println!("Id:\t\t{}", self.id);
        println!("Name:\t\t{}", self.full_name);
        println!("Phone:\t\t{}", self.phone.as_deref().unwrap_or("None"));
        println!("Email:\t\t{}", self.email.as_deref().unwrap_or("None"));
        println!("Notes:\t\t{}", self.notes);
        println!("Created:\t{}", self.created_at.date_naive());
    }
}

impl PrintFormatted for Vec<Member> {
    fn print_formatted(&self) {
        for member in self {
            println!(
                "{}\t{}\t{}\t{}",
                member.id,
                member.full_name,
                member.phone.as_deref().unwrap_or("-"),
                member.email.as_deref().unwrap_or("-"),
            );
        }
    }
}

impl PrintFormatted for Membership {
    fn print_formatted(&self) {
        let paused_at = match self.paused_at {
            Some(paused_at) => paused_at.to_string(),
            None => "None".to_string(),
        };
        println!("Id:\t\t{}", self.id);
        println!("Member:\t\t{}", self.member_id);
        println!("Status:\t\t{}", self.status);
        println!("Duration:\t{}", self.duration_label);
        println!("Start:\t\t{}", self.start_date);
        println!("End:\t\t{}", self.end_date);
        println!("Fee:\t\t{:.2}", self.fee_amount);
        println!("Paused At:\t{}", paused_at);
        println!("Paused Days:\t{}", self.paused_days);
    }
}

impl PrintFormatted for Vec<Membership> {
    fn print_formatted(&self) {
        for membership in self {
            println!(
                "{}\t{}\t{} .. {}\t{}\t{:.2}",
                membership.id,
                membership.status,
                membership.start_date,
                membership.end_date,
                membership.duration_label,
                membership.fee_amount,
            );
        }
    }
}

impl PrintFormatted for FeeSlip {
    fn print_formatted(&self) {
        println!("Receipt No:\t{}", self.id);
        println!("Issued:\t\t{}", self.issued_on);
        println!("Membership:\t{}", self.membership_id);
        println!("Duration:\t{}", self.duration_label);
        println!("Start:\t\t{}", self.start_date);
        println!("End:\t\t{}", self.end_date);
        println!("Amount:\t\t{:.2}", self.fee_amount);
        println!("Gym:\t\t{}", self.gym_name);
        println!("Signed By:\t{}", self.signed_by);
    }
}

impl PrintFormatted for Vec<EmailLogEntry> {
    fn print_formatted(&self) {
        for entry in self {
            println!(
                "{}\t{}\t{}\t{}\t{}",
                entry.id,
                entry.status,
                entry.recipient,
                entry.subject,
                entry.created_at.date_naive(),
            );
        }
    }
}

impl PrintFormatted for SweepSummary {
    fn print_formatted(&self) {
        println!("Expired Marked:\t\t{}", self.expired_marked);
        println!("Notifications Found:\t{}", self.notifications_found);
        println!("Emails Sent:\t\t{}", self.emails_sent);
        println!("Emails Failed:\t\t{}", self.emails_failed);
    }
}
