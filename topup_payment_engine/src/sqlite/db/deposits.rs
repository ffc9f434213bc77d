use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Deposit, OrderId, PaymentStatus},
    traits::{DepositSettlement, NewDeposit, StorefrontError},
};

pub async fn insert_deposit(deposit: NewDeposit, conn: &mut SqliteConnection) -> Result<Deposit, StorefrontError> {
    let deposit = sqlx::query_as(
        r#"
            INSERT INTO deposits (user_id, username, method, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(&deposit.user_id)
    .bind(&deposit.username)
    .bind(&deposit.method)
    .bind(deposit.amount)
    .fetch_one(conn)
    .await?;
    Ok(deposit)
}

/// Links the deposit to the transaction that pays for it. The reconciler correlates through this column; nothing
/// ever parses the order id itself.
pub async fn attach_order_id(
    deposit_id: i64,
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    let result =
        sqlx::query("UPDATE deposits SET merchant_order_id = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(order_id)
            .bind(deposit_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(StorefrontError::DatabaseError(format!("Deposit {deposit_id} does not exist")));
    }
    Ok(())
}

pub async fn mark_failed(deposit_id: i64, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    sqlx::query(
        "UPDATE deposits SET status = 'FAILED', updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND status = 'PENDING'",
    )
    .bind(deposit_id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Deposit>, sqlx::Error> {
    let deposit = sqlx::query_as("SELECT * FROM deposits WHERE merchant_order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(deposit)
}

/// Moves the deposit linked to `order_id` out of PENDING. The conditional update matches at most once per deposit,
/// which is what makes redelivered callbacks settle (and credit) at most once. The caller is responsible for
/// crediting the balance in the same atomic unit when the outcome warrants it.
pub async fn settle(
    order_id: &OrderId,
    outcome: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<DepositSettlement, StorefrontError> {
    // Drain the RETURNING stream fully, or SQLite can roll the update back on statement reset.
    let updated = sqlx::query_as::<_, Deposit>(
        r#"UPDATE deposits
           SET status = $1, updated_at = CURRENT_TIMESTAMP
           WHERE merchant_order_id = $2 AND status = 'PENDING'
           RETURNING *"#,
    )
    .bind(outcome)
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?
    .pop();
    match updated {
        Some(deposit) => {
            debug!("🗃️ Deposit #{} settled as {outcome}", deposit.id);
            Ok(DepositSettlement::Applied { deposit, credited: false })
        },
        None => {
            let current = fetch_by_order_id(order_id, conn)
                .await?
                .ok_or_else(|| StorefrontError::DepositNotFound(order_id.clone()))?;
            Ok(DepositSettlement::Duplicate(current))
        },
    }
}
