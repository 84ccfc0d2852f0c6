use anyhow::Result;

use crate::Connection;

/// Schema statements, executed in order. All idempotent.
const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS members (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        full_name TEXT NOT NULL,
        phone TEXT,
        email TEXT,
        notes TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS memberships (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER NOT NULL REFERENCES members(id),
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        duration_label TEXT NOT NULL,
        fee_amount REAL NOT NULL,
        status TEXT NOT NULL DEFAULT 'active',
        paused_at TEXT,
        paused_days INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER NOT NULL REFERENCES members(id),
        membership_id INTEGER NOT NULL REFERENCES memberships(id),
        amount REAL NOT NULL,
        note TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS fee_slips (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER NOT NULL REFERENCES members(id),
        membership_id INTEGER NOT NULL REFERENCES memberships(id),
        issued_on TEXT NOT NULL,
        fee_amount REAL NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT NOT NULL,
        duration_label TEXT NOT NULL,
        gym_name TEXT NOT NULL,
        signed_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS membership_renewals (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        membership_id INTEGER NOT NULL REFERENCES memberships(id),
        member_id INTEGER NOT NULL REFERENCES members(id),
        previous_end_date TEXT NOT NULL,
        new_end_date TEXT NOT NULL,
        duration_label TEXT NOT NULL,
        fee_amount REAL NOT NULL,
        renewed_by TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS email_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        member_id INTEGER NOT NULL REFERENCES members(id),
        email_type TEXT NOT NULL,
        recipient TEXT NOT NULL,
        subject TEXT NOT NULL,
        body TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL,
        error_message TEXT,
        sent_at TEXT,
        created_at TEXT NOT NULL
    )
    "#,
];

/// Install the schema
pub async fn install(db: &Connection) -> Result<()> {
    let mut conn = db.lock().await;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *conn).await?;
    }
    Ok(())
}
