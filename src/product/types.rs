use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extract::ExtractionResult;
use super::pricing::HistoryStats;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductRow {
    pub product_id: i64,
    pub url: String,
    pub name: String,
    pub image_url: String,
    pub platform: String,
    pub current_price: f64,
    pub lowest_price: f64,
    pub highest_price: f64,
    pub price_change_pct: f64,
    pub is_available: bool,
    pub consecutive_failures: i32,
    pub created_at: DateTime<Utc>,
    pub last_checked: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct HistoryRow { pub history_id: i64, pub price: f64, pub recorded_at: DateTime<Utc> }

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AlertRow { pub alert_id: i64, pub product_id: i64, pub target_price: f64, pub is_active: bool }

/// Outcome of appending one successful check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PriceUpdate { pub previous: f64, pub current: f64, pub change_pct: f64, pub lowest: f64, pub highest: f64 }

#[derive(Serialize)]
pub struct ProductAddPlan<'a> {
    pub action: &'static str,
    pub url: &'a str,
    pub target_price: Option<f64>,
    pub would_store: bool,
    pub extracted: &'a ExtractionResult,
}

#[derive(Serialize)]
pub struct ProductAddResult { pub product_id: i64, pub inserted: bool, pub update: PriceUpdate, pub alert_id: Option<i64> }

#[derive(Serialize)]
pub struct ProductList { pub products: Vec<ProductRow> }

#[derive(Serialize)]
pub struct ProductRemovePlan { pub action: &'static str, pub product: ProductRow }

#[derive(Serialize)]
pub struct ProductRemoveResult { pub product_id: i64, pub deleted: bool }

#[derive(Serialize)]
pub struct ProductHistory { pub product: ProductRow, pub stats: Option<HistoryStats>, pub history: Vec<HistoryRow> }

#[derive(Serialize)]
pub struct AlertPlan { pub action: &'static str, pub product_id: i64, pub target_price: f64, pub current_price: f64 }

#[derive(Serialize)]
pub struct AlertResult { pub alert_id: i64, pub product_id: i64, pub target_price: f64 }
