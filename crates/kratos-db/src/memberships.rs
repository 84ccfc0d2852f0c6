use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite};

use kratos_data::{
    ExpiryCandidate, ExpiryStore, Insert, Membership, MembershipFilter, MembershipStatus,
    Query, Retrieve, Update,
};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<Membership> for Connection {
    type Filter = MembershipFilter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Membership>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::new(
            r#"
            SELECT
                id,
                member_id,
                start_date,
                end_date,
                duration_label,
                ROUND(fee_amount, 10) AS fee_amount,
                status,
                paused_at,
                paused_days,
                created_at,
                updated_at
            FROM memberships
            WHERE 1
            "#,
        );

        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(member_id) = filter.member_id {
            qry.push(" AND member_id = ").push_bind(member_id);
        }
        if let Some(status) = filter.status {
            qry.push(" AND status = ").push_bind(status);
        }
        qry.push(" ORDER BY id ");

        let memberships: Vec<Membership> =
            qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(memberships)
    }
}

#[async_trait]
impl Retrieve<Membership> for Connection {
    type Key = u32;
    async fn retrieve(&self, membership_id: Self::Key) -> Result<Membership> {
        let filter = MembershipFilter {
            id: Some(membership_id),
            ..Default::default()
        };
        let membership = self
            .query(&filter)
            .await?
            .pop()
            .ok_or(QueryError::NotFound)?;
        Ok(membership)
    }
}

#[async_trait]
impl Insert<Membership> for Connection {
    async fn insert(&self, membership: Membership) -> Result<Membership> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO memberships (
                    member_id,
                    start_date,
                    end_date,
                    duration_label,
                    fee_amount,
                    status,
                    paused_at,
                    paused_days,
                    created_at,
                    updated_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(membership.member_id)
                .push_bind(membership.start_date)
                .push_bind(membership.end_date)
                .push_bind(&membership.duration_label)
                .push_bind(membership.fee_amount)
                .push_bind(membership.status)
                .push_bind(membership.paused_at)
                .push_bind(membership.paused_days)
                .push_bind(membership.created_at)
                .push_bind(membership.updated_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        self.retrieve(insert.id).await
    }
}

#[async_trait]
impl Update<Membership> for Connection {
    /// Update membership
    async fn update(&self, membership: Membership) -> Result<Membership> {
        {
            let mut conn = self.lock().await;
            QueryBuilder::<Sqlite>::new("UPDATE memberships SET")
                .push(" start_date = ")
                .push_bind(membership.start_date)
                .push(", end_date = ")
                .push_bind(membership.end_date)
                .push(", duration_label = ")
                .push_bind(&membership.duration_label)
                .push(", fee_amount = ")
                .push_bind(membership.fee_amount)
                .push(", status = ")
                .push_bind(membership.status)
                .push(", paused_at = ")
                .push_bind(membership.paused_at)
                .push(", paused_days = ")
                .push_bind(membership.paused_days)
                .push(", updated_at = ")
                .push_bind(membership.updated_at)
                .push(" WHERE id = ")
                .push_bind(membership.id)
                .build()
                .execute(&mut *conn)
                .await?;
        }
        self.retrieve(membership.id).await
    }
}

const CANDIDATE_SELECT: &str = r#"
    SELECT
        m.id AS membership_id,
        m.member_id AS member_id,
        mb.full_name AS member_name,
        mb.email AS member_email,
        m.end_date AS end_date,
        m.duration_label AS duration_label,
        ROUND(m.fee_amount, 10) AS fee_amount
    FROM memberships m
    JOIN members mb ON mb.id = m.member_id
    WHERE 1
"#;

#[async_trait]
impl ExpiryStore for Connection {
    async fn mark_expired(&self, today: NaiveDate, now: DateTime<Utc>) -> Result<u64> {
        let mut conn = self.lock().await;
        let result = QueryBuilder::<Sqlite>::new("UPDATE memberships SET")
            .push(" status = ")
            .push_bind(MembershipStatus::Expired)
            .push(", paused_at = NULL ")
            .push(", updated_at = ")
            .push_bind(now)
            .push(" WHERE status IN (")
            .push_bind(MembershipStatus::Active)
            .push(", ")
            .push_bind(MembershipStatus::Hold)
            .push(") AND end_date < ")
            .push_bind(today)
            .build()
            .execute(&mut *conn)
            .await?;
        Ok(result.rows_affected())
    }

    async fn expiring_within(
        &self,
        today: NaiveDate,
        days_ahead: u32,
    ) -> Result<Vec<ExpiryCandidate>> {
        let horizon = today
            .checked_add_days(Days::new(days_ahead as u64))
            .unwrap_or(today);

        let mut conn = self.lock().await;
        let candidates: Vec<ExpiryCandidate> = QueryBuilder::new(CANDIDATE_SELECT)
            .push(" AND m.status = ")
            .push_bind(MembershipStatus::Active)
            .push(" AND m.end_date >= ")
            .push_bind(today)
            .push(" AND m.end_date < ")
            .push_bind(horizon)
            .push(" ORDER BY m.end_date ")
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        Ok(candidates)
    }

    async fn expired(&self) -> Result<Vec<ExpiryCandidate>> {
        let mut conn = self.lock().await;
        let candidates: Vec<ExpiryCandidate> = QueryBuilder::new(CANDIDATE_SELECT)
            .push(" AND m.status = ")
            .push_bind(MembershipStatus::Expired)
            .push(" ORDER BY m.end_date ")
            .build_query_as()
            .fetch_all(&mut *conn)
            .await?;
        Ok(candidates)
    }
}
