use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::Voucher, traits::StorefrontError};

/// Fetches a voucher by code along with its category links. Validity is judged by the pricing engine; this function
/// only loads state.
pub async fn fetch_voucher_by_code(
    code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Voucher>, sqlx::Error> {
    let voucher: Option<Voucher> =
        sqlx::query_as("SELECT * FROM vouchers WHERE code = $1").bind(code).fetch_optional(&mut *conn).await?;
    let Some(mut voucher) = voucher else {
        return Ok(None);
    };
    let ids: Vec<(i64,)> = sqlx::query_as("SELECT category_id FROM voucher_categories WHERE voucher_id = $1")
        .bind(voucher.id)
        .fetch_all(conn)
        .await?;
    voucher.category_ids = ids.into_iter().map(|(id,)| id).collect();
    Ok(Some(voucher))
}

/// Atomically redeems one use of the voucher. The conditional update is the arbiter for the usage limit: of N
/// concurrent redemptions racing for the last slot, exactly one matches.
pub async fn redeem(voucher_id: i64, conn: &mut SqliteConnection) -> Result<(), StorefrontError> {
    let result = sqlx::query(
        r#"UPDATE vouchers
           SET usage_count = usage_count + 1
           WHERE id = $1 AND (usage_limit IS NULL OR usage_count < usage_limit)"#,
    )
    .bind(voucher_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        debug!("🗃️ Voucher {voucher_id} could not be redeemed. The usage limit has been reached.");
        return Err(StorefrontError::VoucherExhausted);
    }
    Ok(())
}
