use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use kratos_data::FeeSlip;

/// Letterhead data stamped onto receipts and emails. Configured by
/// the operator, never hardcoded into templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GymIdentity {
    pub name: String,
    pub signer: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for GymIdentity {
    fn default() -> Self {
        Self {
            name: "Kratos Fitness".to_string(),
            signer: "Studio Manager".to_string(),
            address: "".to_string(),
            phone: "".to_string(),
            email: "".to_string(),
        }
    }
}

impl GymIdentity {
    pub fn fee_slip_subject(&self) -> String {
        format!("{} - Fee Receipt & Membership Confirmation", self.name)
    }

    pub fn renewal_subject(&self) -> String {
        format!("{} - Membership Renewed Successfully!", self.name)
    }

    pub fn expiry_alert_subject(&self) -> String {
        format!("{} - Membership Expiry Alert", self.name)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn format_currency(amount: f64) -> String {
    format!("₹{:.2}", amount)
}

fn footer(gym: &GymIdentity) -> String {
    format!(
        r#"<div class="footer">
      <p><strong>{name}</strong></p>
      <p>{address}</p>
      <p>Contact: {phone} | Email: {email}</p>
    </div>"#,
        name = gym.name,
        address = gym.address,
        phone = gym.phone,
        email = gym.email,
    )
}

/// Render the fee receipt sent after an activation or renewal.
pub fn fee_slip_email(member_name: &str, slip: &FeeSlip, gym: &GymIdentity) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{gym_name} - Fee Receipt</title></head>
<body>
  <div class="container">
    <div class="header"><h1>{gym_name}</h1><p>Fee Receipt &amp; Membership Confirmation</p></div>
    <div class="content">
      <p>Receipt No: {slip_id}</p>
      <p>Date Issued: {issued}</p>
      <p>Member Name: {member_name}</p>
      <h3>Membership Details</h3>
      <p>Duration: {duration}</p>
      <p>Start Date: {start}</p>
      <p>End Date: {end}</p>
      <h3>Total Amount Paid</h3>
      <p class="amount">{amount}</p>
      <p>Your membership is now active. Welcome to the {gym_name} family!</p>
      <div class="signature"><p>Authorized Signature</p><p>{signer}</p></div>
    </div>
    {footer}
  </div>
</body>
</html>"#,
        gym_name = gym.name,
        slip_id = slip.id,
        issued = format_date(slip.issued_on),
        member_name = member_name,
        duration = slip.duration_label,
        start = format_date(slip.start_date),
        end = format_date(slip.end_date),
        amount = format_currency(slip.fee_amount),
        signer = gym.signer,
        footer = footer(gym),
    )
}

/// Render the expiry alert. Wording depends on whether the end date
/// is already behind us relative to `today`.
pub fn expiry_alert_email(
    member_name: &str,
    end_date: NaiveDate,
    duration_label: &str,
    today: NaiveDate,
    gym: &GymIdentity,
) -> String {
    let expired = end_date < today;
    let days_remaining = (end_date - today).num_days();

    let headline = if expired {
        "Membership Expired!".to_string()
    } else {
        "Membership Expiring Soon!".to_string()
    };
    let detail = if expired {
        format!(
            "Your membership expired on {}. Renew now to continue your fitness journey!",
            format_date(end_date)
        )
    } else {
        format!(
            "Your membership will expire in {} day{} on {}.",
            days_remaining,
            if days_remaining == 1 { "" } else { "s" },
            format_date(end_date)
        )
    };
    let status = if expired { "EXPIRED" } else { "EXPIRING SOON" };

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>{gym_name} - Membership Alert</title></head>
<body>
  <div class="container">
    <div class="header"><h1>{gym_name}</h1><p>Membership Alert</p></div>
    <div class="content">
      <h2>Hello {member_name}!</h2>
      <div class="alert"><h3>{headline}</h3><p>{detail}</p></div>
      <h3>Current Membership Details</h3>
      <p>Duration: {duration}</p>
      <p>End Date: {end}</p>
      <p>Status: {status}</p>
      <p>Renew your membership today and keep your fitness goals on track.</p>
    </div>
    {footer}
  </div>
</body>
</html>"#,
        gym_name = gym.name,
        member_name = member_name,
        headline = headline,
        detail = detail,
        duration = duration_label,
        end = format_date(end_date),
        status = status,
        footer = footer(gym),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gym() -> GymIdentity {
        GymIdentity {
            name: "Test Gym".to_string(),
            signer: "A. Trainer".to_string(),
            ..GymIdentity::default()
        }
    }

    #[test]
    fn test_fee_slip_email() {
        let slip = FeeSlip {
            id: 7,
            issued_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fee_amount: 500.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            duration_label: "1 month".to_string(),
            ..FeeSlip::default()
        };
        let html = fee_slip_email("Alex Strong", &slip, &gym());
        assert!(html.contains("Alex Strong"));
        assert!(html.contains("₹500.00"));
        assert!(html.contains("15/02/2024"));
        assert!(html.contains("A. Trainer"));
    }

    #[test]
    fn test_expiry_alert_expired_wording() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let ended = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let html = expiry_alert_email("Alex Strong", ended, "1 month", today, &gym());
        assert!(html.contains("Membership Expired!"));
        assert!(html.contains("EXPIRED"));
        assert!(html.contains("01/03/2024"));
    }

    #[test]
    fn test_expiry_alert_expiring_wording() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let ends = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        let html = expiry_alert_email("Alex Strong", ends, "1 month", today, &gym());
        assert!(html.contains("Membership Expiring Soon!"));
        assert!(html.contains("expire in 3 days"));

        let tomorrow = NaiveDate::from_ymd_opt(2024, 3, 11).unwrap();
        let html = expiry_alert_email("Alex Strong", tomorrow, "1 month", today, &gym());
        assert!(html.contains("expire in 1 day on"));
    }
}
