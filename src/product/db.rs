use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::extract::ExtractionResult;

use super::pricing::{price_change_pct, PriceBounds};
use super::types::{HistoryRow, PriceUpdate, ProductRow};

const PRODUCT_COLUMNS: &str = "product_id, url, name, image_url, platform, current_price, lowest_price, highest_price, \
     price_change_pct, is_available, consecutive_failures, created_at, last_checked";

/// Insert or refresh the descriptive columns. Returns (product_id, inserted).
pub async fn upsert_product(pool: &PgPool, url: &str, r: &ExtractionResult) -> Result<(i64, bool)> {
    let row: (i64, bool) = sqlx::query_as(
        r#"
        INSERT INTO pricewatch.product (url, name, image_url, platform)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (url) DO UPDATE
          SET name         = EXCLUDED.name,
              image_url    = CASE WHEN EXCLUDED.image_url = '' THEN pricewatch.product.image_url ELSE EXCLUDED.image_url END,
              platform     = EXCLUDED.platform,
              is_available = TRUE
        RETURNING product_id, (xmax = 0) AS inserted
        "#,
    )
    .bind(url)
    .bind(&r.title)
    .bind(&r.image_url)
    .bind(r.platform.as_str())
    .fetch_one(pool)
    .await
    .context("upsert product")?;
    Ok(row)
}

/// Append a history row and roll the price columns forward.
pub async fn record_success(pool: &PgPool, product_id: i64, r: &ExtractionResult) -> Result<PriceUpdate> {
    let mut tx = pool.begin().await?;

    let (previous, lowest, highest): (f64, f64, f64) = sqlx::query_as(
        "SELECT current_price, lowest_price, highest_price FROM pricewatch.product WHERE product_id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_one(&mut *tx)
    .await
    .with_context(|| format!("load product {}", product_id))?;

    let change_pct = price_change_pct(previous, r.price);
    let bounds = PriceBounds { lowest, highest }.update(r.price);

    sqlx::query("INSERT INTO pricewatch.price_history (product_id, price) VALUES ($1, $2)")
        .bind(product_id)
        .bind(r.price)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE pricewatch.product
           SET current_price        = $2,
               price_change_pct     = $3,
               lowest_price         = $4,
               highest_price        = $5,
               image_url            = CASE WHEN $6 = '' THEN image_url ELSE $6 END,
               consecutive_failures = 0,
               is_available         = TRUE,
               last_checked         = now()
         WHERE product_id = $1
        "#,
    )
    .bind(product_id)
    .bind(r.price)
    .bind(change_pct)
    .bind(bounds.lowest)
    .bind(bounds.highest)
    .bind(&r.image_url)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(PriceUpdate { previous, current: r.price, change_pct, lowest: bounds.lowest, highest: bounds.highest })
}

pub async fn list_products(pool: &PgPool, available: Option<bool>) -> Result<Vec<ProductRow>> {
    let sql = format!(
        "SELECT {} FROM pricewatch.product WHERE ($1::bool IS NULL OR is_available = $1) ORDER BY product_id",
        PRODUCT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql).bind(available).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn get_product(pool: &PgPool, product_id: i64) -> Result<Option<ProductRow>> {
    let sql = format!("SELECT {} FROM pricewatch.product WHERE product_id = $1", PRODUCT_COLUMNS);
    let row = sqlx::query_as::<_, ProductRow>(&sql).bind(product_id).fetch_optional(pool).await?;
    Ok(row)
}

/// Oldest-checked available products first.
pub async fn select_due(pool: &PgPool, limit: i64) -> Result<Vec<ProductRow>> {
    let sql = format!(
        "SELECT {} FROM pricewatch.product WHERE is_available ORDER BY last_checked ASC, product_id LIMIT $1",
        PRODUCT_COLUMNS
    );
    let rows = sqlx::query_as::<_, ProductRow>(&sql).bind(limit).fetch_all(pool).await?;
    Ok(rows)
}

pub async fn delete_product(pool: &PgPool, product_id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM pricewatch.product WHERE product_id = $1")
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(res.rows_affected() == 1)
}

pub async fn history(pool: &PgPool, product_id: i64, since: Option<DateTime<Utc>>, limit: i64) -> Result<Vec<HistoryRow>> {
    let rows = sqlx::query_as::<_, HistoryRow>(
        r#"
        SELECT history_id, price, recorded_at
        FROM pricewatch.price_history
        WHERE product_id = $1
          AND ($2::timestamptz IS NULL OR recorded_at >= $2)
        ORDER BY recorded_at DESC
        LIMIT $3
        "#,
    )
    .bind(product_id)
    .bind(since)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn insert_alert(pool: &PgPool, product_id: i64, target_price: f64) -> Result<i64> {
    let (alert_id,): (i64,) = sqlx::query_as(
        "INSERT INTO pricewatch.price_alert (product_id, target_price) VALUES ($1, $2) RETURNING alert_id",
    )
    .bind(product_id)
    .bind(target_price)
    .fetch_one(pool)
    .await
    .context("insert price alert")?;
    Ok(alert_id)
}
