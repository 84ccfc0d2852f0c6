use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use kratos_data::{FeeSlip, FeeSlipFilter, Insert, Query, Retrieve};

use crate::{
    results::{Id, QueryError},
    Connection,
};

#[async_trait]
impl Query<FeeSlip> for Connection {
    type Filter = FeeSlipFilter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<FeeSlip>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::new(
            r#"
            SELECT
                id,
                member_id,
                membership_id,
                issued_on,
                ROUND(fee_amount, 10) AS fee_amount,
                start_date,
                end_date,
                duration_label,
                gym_name,
                signed_by,
                created_at
            FROM fee_slips
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

        let slips: Vec<FeeSlip> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(slips)
    }
}

#[async_trait]
impl Retrieve<FeeSlip> for Connection {
    type Key = FeeSlipFilter;
    /// Retrieve the latest slip matching the filter.
    async fn retrieve(&self, filter: Self::Key) -> Result<FeeSlip> {
        let slip = self.query(&filter).await?.pop().ok_or(QueryError::NotFound)?;
        Ok(slip)
    }
}

#[async_trait]
impl Insert<FeeSlip> for Connection {
    async fn insert(&self, slip: FeeSlip) -> Result<FeeSlip> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO fee_slips (
                    member_id,
                    membership_id,
                    issued_on,
                    fee_amount,
                    start_date,
                    end_date,
                    duration_label,
                    gym_name,
                    signed_by,
                    created_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(slip.member_id)
                .push_bind(slip.membership_id)
                .push_bind(slip.issued_on)
                .push_bind(slip.fee_amount)
                .push_bind(slip.start_date)
                .push_bind(slip.end_date)
                .push_bind(&slip.duration_label)
                .push_bind(&slip.gym_name)
                .push_bind(&slip.signed_by)
                .push_bind(slip.created_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };
        self.retrieve(FeeSlipFilter {
            id: Some(insert.id),
            ..Default::default()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;
    use kratos_data::{Member, Membership};

    #[tokio::test]
    async fn test_latest_slip_per_membership() {
        let db = Connection::open_test().await;

        let member = db
            .insert(Member {
                full_name: "Receipt Holder".to_string(),
                created_at: Utc::now(),
                ..Member::default()
            })
            .await
            .unwrap();
        let membership = db
            .insert(Membership {
                member_id: member.id,
                duration_label: "1 month".to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..Default::default()
            })
            .await
            .unwrap();

        let slip = FeeSlip {
            member_id: member.id,
            membership_id: membership.id,
            issued_on: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            fee_amount: 500.0,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            duration_label: "1 month".to_string(),
            gym_name: "Kratos Fitness".to_string(),
            signed_by: "Studio Manager".to_string(),
            created_at: Utc::now(),
            ..FeeSlip::default()
        };
        db.insert(slip.clone()).await.unwrap();

        // A renewal writes a second slip for the same membership
        let renewal_slip = FeeSlip {
            issued_on: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            fee_amount: 1400.0,
            duration_label: "3 months".to_string(),
            ..slip
        };
        db.insert(renewal_slip).await.unwrap();

        let latest: FeeSlip = db
            .retrieve(FeeSlipFilter {
                membership_id: Some(membership.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(latest.duration_label, "3 months");
        assert_eq!(latest.fee_amount, 1400.0);
    }
}
