//! Seed data helpers for integration tests.
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use tps_common::Rupiah;

use crate::db_types::{DiscountType, Role};

pub async fn seed_user(pool: &SqlitePool, id: &str, role: Role, balance: Rupiah) {
    sqlx::query("INSERT INTO users (id, name, username, role, whatsapp, balance) VALUES ($1, $1, $1, $2, '628111', $3)")
        .bind(id)
        .bind(role.to_string())
        .bind(balance)
        .execute(pool)
        .await
        .expect("Error seeding user");
}

pub async fn seed_category(pool: &SqlitePool, name: &str) -> i64 {
    let (id,): (i64,) = sqlx::query_as("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(name)
        .fetch_one(pool)
        .await
        .expect("Error seeding category");
    id
}

pub async fn seed_item(pool: &SqlitePool, name: &str, category_id: i64, base_price: Rupiah) -> i64 {
    let platinum = Rupiah::from(base_price.value() - 1_000);
    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO catalog_items (name, category_id, base_price, platinum_price, provider_code, cost_price, profit)
           VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id"#,
    )
    .bind(name)
    .bind(category_id)
    .bind(base_price)
    .bind(platinum)
    .bind(format!("PC-{name}"))
    .bind(Rupiah::from(base_price.value() - 2_000))
    .bind(Rupiah::from(2_000))
    .fetch_one(pool)
    .await
    .expect("Error seeding catalog item");
    id
}

/// Seeds a currently-valid percentage voucher that applies to all categories.
pub async fn seed_voucher(pool: &SqlitePool, code: &str, percent: f64, usage_limit: Option<i64>) -> i64 {
    let now = Utc::now();
    let (id,): (i64,) = sqlx::query_as(
        r#"INSERT INTO vouchers
             (code, discount_type, discount_value, start_date, expiry_date, is_active, usage_limit,
              is_for_all_categories)
           VALUES ($1, $2, $3, $4, $5, 1, $6, 1) RETURNING id"#,
    )
    .bind(code)
    .bind(DiscountType::Percentage)
    .bind(percent)
    .bind(now - Duration::hours(1))
    .bind(now + Duration::days(7))
    .bind(usage_limit)
    .fetch_one(pool)
    .await
    .expect("Error seeding voucher");
    id
}
