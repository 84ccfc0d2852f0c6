use anyhow::Result;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

use kratos_data::{Insert, Payment, PaymentFilter, Query};

use crate::{results::Id, Connection};

#[async_trait]
impl Query<Payment> for Connection {
    type Filter = PaymentFilter;
    async fn query(&self, filter: &Self::Filter) -> Result<Vec<Payment>> {
        let mut conn = self.lock().await;
        let mut qry = QueryBuilder::new(
            r#"
            SELECT
                id,
                member_id,
                membership_id,
                ROUND(amount, 10) AS amount,
                note,
                created_at
            FROM payments
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

        let payments: Vec<Payment> = qry.build_query_as().fetch_all(&mut *conn).await?;
        Ok(payments)
    }
}

#[async_trait]
impl Insert<Payment> for Connection {
    async fn insert(&self, payment: Payment) -> Result<Payment> {
        let insert: Id<u32> = {
            let mut conn = self.lock().await;
            let mut qry = QueryBuilder::<Sqlite>::new(
                r#"INSERT INTO payments (
                    member_id,
                    membership_id,
                    amount,
                    note,
                    created_at
                ) VALUES (
                "#,
            );
            qry.separated(", ")
                .push_bind(payment.member_id)
                .push_bind(payment.membership_id)
                .push_bind(payment.amount)
                .push_bind(&payment.note)
                .push_bind(payment.created_at);

            qry.push(") RETURNING id ")
                .build_query_as()
                .fetch_one(&mut *conn)
                .await?
        };

        let payments: Vec<Payment> = self
            .query(&PaymentFilter {
                id: Some(insert.id),
                ..Default::default()
            })
            .await?;
        payments
            .into_iter()
            .next()
            .ok_or_else(|| crate::results::QueryError::NotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use kratos_data::Member;

    #[tokio::test]
    async fn test_payment_insert() {
        let db = Connection::open_test().await;

        let member = db
            .insert(Member {
                full_name: "Paying Member".to_string(),
                created_at: Utc::now(),
                ..Member::default()
            })
            .await
            .unwrap();

        let membership = db
            .insert(kratos_data::Membership {
                member_id: member.id,
                duration_label: "1 month".to_string(),
                fee_amount: 500.0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
                ..Default::default()
            })
            .await
            .unwrap();

        let payment = db
            .insert(Payment {
                member_id: member.id,
                membership_id: membership.id,
                amount: 500.0,
                note: "Payment for 1 month membership".to_string(),
                created_at: Utc::now(),
                ..Payment::default()
            })
            .await
            .unwrap();

        assert_eq!(payment.amount, 500.0);
        assert_eq!(payment.membership_id, membership.id);

        let payments: Vec<Payment> = db
            .query(&PaymentFilter {
                member_id: Some(member.id),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
    }
}
