use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use kratos_data::{EmailLogEntry, EmailLogFilter, Insert, Query};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<EmailLogEntry> for Connection {
    type Filter = EmailLogFilter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<EmailLogEntry>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::new(
            r#"
            SELECT
                id,
                member_id,
                email_type,
                recipient,
                subject,
                body,
                status,
                error_message,
                sent_at,
                created_at
            FROM email_log
            WHERE 1
            "#,
        );

        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(member_id) = filter.member_id {
            qry.push(" AND member_id = ").push_bind(member_id);
        }
        if let Some(email_type) = filter.email_type.clone() {
            qry.push(" AND email_type = ").push_bind(email_type);
        }
        if let Some(status) = filter.status {
            qry.push(" AND status = ").push_bind(status);
        }
        if let Some(sent_on) = filter.sent_on {
            qry.push(" AND date(sent_at) = ").push_bind(sent_on);
        }
        qry.push(" ORDER BY id ");

        let entries: Vec<EmailLogEntry> =
            qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(entries)
    }
}

#[async_trait]
impl Insert<EmailLogEntry> for Connection {
    async fn insert(&self, entry: EmailLogEntry) -> Result<EmailLogEntry> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO email_log (
                    member_id,
                    email_type,
                    recipient,
                    subject,
                    body,
                    status,
                    error_message,
                    sent_at,
                    created_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(entry.member_id)
                .push_bind(&entry.email_type)
                .push_bind(&entry.recipient)
                .push_bind(&entry.subject)
                .push_bind(&entry.body)
                .push_bind(entry.status)
                .push_bind(&entry.error_message)
                .push_bind(entry.sent_at)
                .push_bind(entry.created_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };

        let entries: Vec<EmailLogEntry> = self
            .query(&EmailLogFilter {
                id: Some(insert.id),
                ..Default::default()
            })
            .await?;
        entries
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use kratos_data::{EmailStatus, Member, EMAIL_TYPE_EXPIRY_ALERT};

    #[tokio::test]
    async fn test_email_log_sent_on_filter() {
        let db = Connection::open_test().await;

        let member = db
            .insert(Member {
                full_name: "Notified Member".to_string(),
                email: Some("notify@kratos.gym".to_string()),
                created_at: Utc::now(),
                ..Member::default()
            })
            .await
            .unwrap();

        let morning = Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap();
        db.insert(EmailLogEntry {
            member_id: member.id,
            email_type: EMAIL_TYPE_EXPIRY_ALERT.to_string(),
            recipient: "notify@kratos.gym".to_string(),
            subject: "Membership Expiry Alert".to_string(),
            body: "<html></html>".to_string(),
            status: EmailStatus::Sent,
            sent_at: Some(morning),
            created_at: morning,
            ..EmailLogEntry::default()
        })
        .await
        .unwrap();

        // Same day matches, next day does not
        let same_day: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(member.id),
                email_type: Some(EMAIL_TYPE_EXPIRY_ALERT.to_string()),
                status: Some(EmailStatus::Sent),
                sent_on: Some(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(same_day.len(), 1);

        let next_day: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(member.id),
                sent_on: Some(NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(next_day.is_empty());

        // Failed attempts carry no sent_at and never match a day filter
        db.insert(EmailLogEntry {
            member_id: member.id,
            email_type: EMAIL_TYPE_EXPIRY_ALERT.to_string(),
            recipient: "notify@kratos.gym".to_string(),
            subject: "Membership Expiry Alert".to_string(),
            status: EmailStatus::Failed,
            error_message: Some("mailbox over quota".to_string()),
            created_at: morning,
            ..EmailLogEntry::default()
        })
        .await
        .unwrap();

        let failed: Vec<EmailLogEntry> = db
            .query(&EmailLogFilter {
                member_id: Some(member.id),
                status: Some(EmailStatus::Failed),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].error_message.as_deref(), Some("mailbox over quota"));
    }
}
