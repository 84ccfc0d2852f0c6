use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use kratos_data::{Insert, MembershipRenewal, Query, RenewalFilter};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<MembershipRenewal> for Connection {
    type Filter = RenewalFilter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<MembershipRenewal>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::new(
            r#"
            SELECT
                id,
                membership_id,
                member_id,
                previous_end_date,
                new_end_date,
                duration_label,
                ROUND(fee_amount, 10) AS fee_amount,
                renewed_by,
                created_at
            FROM membership_renewals
            WHERE 1
            "#,
        );

        if let Some(id) = filter.id {
            qry.push(" AND id = ").push_bind(id);
        }
        if let Some(member_id) = filter.member_id {
            qry.push(" AND member_id = ").push_bind(member_id);
        }
        if let Some(membership_id) = filter.membership_id {
            qry.push(" AND membership_id = ").push_bind(membership_id);
        }
        qry.push(" ORDER BY id ");

        let renewals: Vec<MembershipRenewal> =
            qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(renewals)
    }
}

#[async_trait]
impl Insert<MembershipRenewal> for Connection {
    async fn insert(&self, renewal: MembershipRenewal) -> Result<MembershipRenewal> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO membership_renewals (
                    membership_id,
                    member_id,
                    previous_end_date,
                    new_end_date,
                    duration_label,
                    fee_amount,
                    renewed_by,
                    created_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(renewal.membership_id)
                .push_bind(renewal.member_id)
                .push_bind(renewal.previous_end_date)
                .push_bind(renewal.new_end_date)
                .push_bind(&renewal.duration_label)
                .push_bind(renewal.fee_amount)
                .push_bind(&renewal.renewed_by)
                .push_bind(renewal.created_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };

        let renewals: Vec<MembershipRenewal> = self
            .query(&RenewalFilter {
                id: Some(insert.id),
                ..Default::default()
            })
            .await?;
        renewals
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::NotFound.into())
    }
}
