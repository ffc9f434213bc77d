use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, OrderId, PaymentStatus, Transaction},
    traits::{StatusTransition, StorefrontError},
};

/// Inserts a new transaction row. The UNIQUE constraint on `merchant_order_id` is the final arbiter against
/// duplicate order ids.
pub async fn insert_transaction(
    transaction: NewTransaction,
    conn: &mut SqliteConnection,
) -> Result<Transaction, StorefrontError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO transactions (
                merchant_order_id,
                user_id,
                voucher_id,
                original_amount,
                discount_amount,
                final_amount,
                payment_status,
                payment_code,
                payment_reference,
                status_message,
                transaction_type,
                phone_number
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(&transaction.merchant_order_id)
    .bind(&transaction.user_id)
    .bind(transaction.voucher_id)
    .bind(transaction.original_amount)
    .bind(transaction.discount_amount)
    .bind(transaction.final_amount)
    .bind(transaction.payment_status)
    .bind(&transaction.payment_code)
    .bind(&transaction.payment_reference)
    .bind(&transaction.status_message)
    .bind(transaction.transaction_type)
    .bind(&transaction.phone_number)
    .fetch_one(conn)
    .await;
    match result {
        Ok(t) => {
            debug!("🗃️ Transaction {} inserted", transaction.merchant_order_id);
            Ok(t)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StorefrontError::OrderAlreadyExists(transaction.merchant_order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_transaction_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Transaction>, sqlx::Error> {
    let transaction = sqlx::query_as("SELECT * FROM transactions WHERE merchant_order_id = $1")
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(transaction)
}

/// Records the gateway's acceptance of the payment request. The status is left alone; only the reference and URL
/// are filled in.
pub async fn record_gateway_acceptance(
    order_id: &OrderId,
    reference: &str,
    payment_url: &str,
    conn: &mut SqliteConnection,
) -> Result<Transaction, StorefrontError> {
    // The RETURNING stream must be drained to completion; dropping it after the first row lets SQLite
    // roll the update back when the statement is reset.
    let result = sqlx::query_as::<_, Transaction>(
        r#"UPDATE transactions
           SET payment_reference = $1, payment_url = $2, updated_at = CURRENT_TIMESTAMP
           WHERE merchant_order_id = $3
           RETURNING *"#,
    )
    .bind(reference)
    .bind(payment_url)
    .bind(order_id)
    .fetch_all(conn)
    .await?
    .pop();
    result.ok_or_else(|| StorefrontError::TransactionNotFound(order_id.clone()))
}

/// Applies a conditional status transition. The `payment_status IN (...)` predicate, derived from
/// [`PaymentStatus::allowed_sources`], is the per-order mutual-exclusion point: the update matches at most once per
/// transition, no matter how many concurrent callers attempt it.
pub async fn transition_status(
    order_id: &OrderId,
    target: PaymentStatus,
    message: &str,
    reference: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<StatusTransition, StorefrontError> {
    let sources =
        target.allowed_sources().iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
    let sql = format!(
        r#"UPDATE transactions
           SET payment_status = $1,
               status_message = $2,
               payment_reference = COALESCE($3, payment_reference),
               updated_at = CURRENT_TIMESTAMP
           WHERE merchant_order_id = $4 AND payment_status IN ({sources})
           RETURNING *"#
    );
    trace!("🗃️ Executing query: {sql}");
    // Drain the RETURNING stream fully, or SQLite can roll the update back on statement reset.
    let updated = sqlx::query_as::<_, Transaction>(&sql)
        .bind(target)
        .bind(message)
        .bind(reference)
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?
        .pop();
    match updated {
        Some(t) => Ok(StatusTransition::Applied(t)),
        None => {
            let current = fetch_transaction_by_order_id(order_id, conn)
                .await?
                .ok_or_else(|| StorefrontError::TransactionNotFound(order_id.clone()))?;
            Ok(StatusTransition::Duplicate(current))
        },
    }
}
