use chrono::{Months, NaiveDate};

/// Duration labels offered by the admin UI. Free text is still
/// accepted by the lifecycle operations; anything unrecognized gets
/// the one month fallback.
pub const DURATION_LABELS: [&str; 3] = ["1 month", "3 months", "1 year"];

/// Map a duration label to an end date. Calendar-month addition:
/// Jan 31 + 1 month lands on the last valid day of February.
pub fn compute_end_date(start: NaiveDate, duration_label: &str) -> NaiveDate {
    let months = match duration_label.to_lowercase().as_str() {
        "1 month" => 1,
        "3 months" => 3,
        "1 year" => 12,
        // Unrecognized labels default to a month
        _ => 1,
    };
    // Safe for any date SQLite can hold
    start.checked_add_months(Months::new(months)).unwrap()
}
