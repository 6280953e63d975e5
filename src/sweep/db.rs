use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::product::pricing::{after_failure, FailureStreak};
use crate::product::types::AlertRow;

/// Bump the failure streak under a row lock and store the resulting availability.
pub async fn record_failure(pool: &PgPool, product_id: i64, threshold: i32) -> Result<FailureStreak> {
    let mut tx = pool.begin().await?;

    let (failures, is_available): (i32, bool) = sqlx::query_as(
        "SELECT consecutive_failures, is_available FROM pricewatch.product WHERE product_id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("load product {}", product_id))?;

    let streak = after_failure(failures, is_available, threshold);

    sqlx::query(
        r#"
        UPDATE pricewatch.product
           SET consecutive_failures = $2,
               is_available         = $3,
               last_checked         = now()
         WHERE product_id = $1
        "#,
    )
    .bind(product_id)
    .bind(streak.failures)
    .bind(streak.is_available)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("record failure for product {}", product_id))?;

    tx.commit().await?;
    Ok(streak)
}

/// Active alerts whose target is at or above `price`.
pub async fn triggered_alerts(pool: &PgPool, product_id: i64, price: f64) -> Result<Vec<AlertRow>> {
    let rows = sqlx::query_as::<_, AlertRow>(
        r#"
        SELECT alert_id, product_id, target_price, is_active
        FROM pricewatch.price_alert
        WHERE product_id = $1 AND is_active AND target_price >= $2
        ORDER BY alert_id
        "#,
    )
    .bind(product_id)
    .bind(price)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
