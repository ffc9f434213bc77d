use chrono::Utc;
use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{Invoice, Transaction};

/// Creates the immutable invoice snapshot for a settled transaction, exactly once. The UNIQUE constraint on
/// `transaction_id` plus `ON CONFLICT DO NOTHING` makes redelivered callbacks a no-op; `None` is returned when the
/// invoice already existed.
pub async fn insert_invoice_once(
    transaction: &Transaction,
    user_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, sqlx::Error> {
    let invoice_number = format!("INV-{}-{}", Utc::now().timestamp_millis(), transaction.id);
    // Drain the RETURNING stream fully, or SQLite can roll the insert back on statement reset.
    let invoice = sqlx::query_as::<_, Invoice>(
        r#"
            INSERT INTO invoices (
                invoice_number,
                transaction_id,
                user_id,
                subtotal,
                discount_amount,
                total_amount,
                status,
                due_date,
                payment_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
            ON CONFLICT (transaction_id) DO NOTHING
            RETURNING *;
        "#,
    )
    .bind(&invoice_number)
    .bind(transaction.id)
    .bind(user_id)
    .bind(transaction.original_amount)
    .bind(transaction.discount_amount)
    .bind(transaction.final_amount)
    .bind(transaction.payment_status)
    .fetch_all(conn)
    .await?
    .pop();
    if let Some(inv) = &invoice {
        debug!("🗃️ Invoice {} created for transaction {}", inv.invoice_number, transaction.merchant_order_id);
    }
    Ok(invoice)
}
