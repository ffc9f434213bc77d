use log::debug;
use sqlx::SqliteConnection;
use tps_common::Rupiah;

use crate::{
    db_types::{OrderId, User},
    traits::StorefrontError,
};

pub async fn fetch_user(id: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

/// Advisory balance check. The authoritative check is the conditional update in [`debit`].
pub async fn balance_covers(
    user_id: &str,
    amount: Rupiah,
    conn: &mut SqliteConnection,
) -> Result<bool, StorefrontError> {
    let user = fetch_user(user_id, conn).await?.ok_or_else(|| StorefrontError::UserNotFound(user_id.to_string()))?;
    Ok(user.balance >= amount)
}

/// Atomically debits the user's balance. The `balance >= amount` predicate on the update is what guarantees the
/// balance never goes negative: of N concurrent debits, only those the balance actually covers will match.
pub async fn debit(user_id: &str, amount: Rupiah, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    let result = sqlx::query(
        "UPDATE users SET balance = balance - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND balance >= $1",
    )
    .bind(amount)
    .bind(user_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        debug!("🗃️ Could not debit {amount} from {user_id}. Balance does not cover it.");
        return Err(StorefrontError::InsufficientBalance);
    }
    Ok(())
}

pub async fn credit(user_id: &str, amount: Rupiah, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    let result =
        sqlx::query("UPDATE users SET balance = balance + $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(amount)
            .bind(user_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(StorefrontError::UserNotFound(user_id.to_string()));
    }
    debug!("🗃️ {amount} credited to {user_id}");
    Ok(())
}

/// Creates (or returns) the deterministic guest user for an order: id `guest_{order_id}`. The upsert makes this
/// idempotent under concurrent callback delivery; both callers get the same row.
pub async fn ensure_guest_user(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<User, StorefrontError> {
    let guest_id = format!("guest_{order_id}");
    sqlx::query(
        r#"INSERT INTO users (id, name, username, role, whatsapp, balance)
           VALUES ($1, 'Guest', $2, 'Member', '', 0)
           ON CONFLICT (id) DO NOTHING"#,
    )
    .bind(&guest_id)
    .bind(&guest_id)
    .execute(&mut *conn)
    .await?;
    let user = fetch_user(&guest_id, conn).await?.ok_or(StorefrontError::UserNotFound(guest_id))?;
    Ok(user)
}
