use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPurchase, OrderId, Purchase},
    traits::StorefrontError,
};

/// Inserts the provisioning-side record for a top-up order. `transaction_id` ties it 1:1 to the financial record;
/// the purchase status starts out mirroring the transaction's.
pub async fn insert_purchase(
    purchase: NewPurchase,
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Purchase, StorefrontError> {
    let result = sqlx::query_as(
        r#"
            INSERT INTO purchases (
                order_id,
                transaction_id,
                item_name,
                game,
                account_id,
                zone,
                nickname,
                username,
                user_id,
                provider_code,
                price,
                profit
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *;
        "#,
    )
    .bind(&purchase.order_id)
    .bind(transaction_id)
    .bind(&purchase.item_name)
    .bind(&purchase.game)
    .bind(&purchase.account_id)
    .bind(&purchase.zone)
    .bind(&purchase.nickname)
    .bind(&purchase.username)
    .bind(&purchase.user_id)
    .bind(&purchase.provider_code)
    .bind(purchase.price)
    .bind(purchase.profit)
    .fetch_one(conn)
    .await;
    match result {
        Ok(p) => Ok(p),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(StorefrontError::OrderAlreadyExists(purchase.order_id))
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn fetch_purchase_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Purchase>, sqlx::Error> {
    let purchase =
        sqlx::query_as("SELECT * FROM purchases WHERE order_id = $1").bind(order_id).fetch_optional(conn).await?;
    Ok(purchase)
}

/// Records the provisioning provider's acceptance on the purchase: the provider's reference plus PROCESS status.
pub async fn record_provisioning_accepted(
    order_id: &OrderId,
    ref_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    let result = sqlx::query(
        r#"UPDATE purchases
           SET ref_id = $1, status = 'PROCESS', updated_at = CURRENT_TIMESTAMP
           WHERE order_id = $2"#,
    )
    .bind(ref_id)
    .bind(order_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        return Err(StorefrontError::TransactionNotFound(order_id.clone()));
    }
    debug!("🗃️ Purchase {order_id} accepted by the provider as {ref_id}");
    Ok(())
}
