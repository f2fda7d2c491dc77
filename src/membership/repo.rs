use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

/// Quota payment belonging to exactly one account.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub method: String,
    pub paid_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

pub async fn record_payment(
    db: &PgPool,
    user_id: i64,
    amount: Decimal,
    method: &str,
) -> anyhow::Result<Payment> {
    let payment = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (user_id, amount, method)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, amount, method, paid_at, created_at
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(method)
    .fetch_one(db)
    .await?;
    Ok(payment)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Payment>> {
    let rows = sqlx::query_as::<_, Payment>(
        r#"
        SELECT id, user_id, amount, method, paid_at, created_at
        FROM payments
        WHERE user_id = $1
        ORDER BY paid_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
