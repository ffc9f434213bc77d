//! Small, stateless helpers shared by the orchestrator, the reconciler and the server-side gateway client.
use chrono::Utc;
use md5::{Digest, Md5};
use rand::{distributions::Alphanumeric, Rng};
use tps_common::Rupiah;

use crate::db_types::{OrderId, PaymentStatus};

/// Generates a fresh merchant order id for a top-up order: `ORD-{unix_millis}-{random}`.
/// The random suffix makes collisions within the same millisecond a non-issue; the UNIQUE constraint on the
/// transactions table is the final arbiter.
pub fn new_order_id() -> OrderId {
    OrderId(format!("ORD-{}-{}", Utc::now().timestamp_millis(), random_suffix()))
}

/// Generates the merchant order id for a deposit: `DEP-{deposit_id}-{unix_millis}`. The prefix is a human-readable
/// convention only; correlation back to the deposit goes through the `merchant_order_id` column on the deposits
/// table.
pub fn new_deposit_order_id(deposit_id: i64) -> OrderId {
    OrderId(format!("DEP-{deposit_id}-{}", Utc::now().timestamp_millis()))
}

fn random_suffix() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(6).map(char::from).collect::<String>().to_lowercase()
}

/// The MD5 signature attached to an outbound payment-creation request:
/// `md5(merchantCode + merchantOrderId + amount + apiKey)`.
pub fn create_signature(merchant_code: &str, order_id: &OrderId, amount: Rupiah, api_key: &str) -> String {
    md5_hex(&format!("{merchant_code}{order_id}{}{api_key}", amount.value()))
}

/// The MD5 signature the gateway attaches to a callback: `md5(merchantCode + amount + merchantOrderId + apiKey)`.
/// Note the different field order from [`create_signature`]; both are fixed by the gateway contract.
pub fn callback_signature(merchant_code: &str, amount: &str, order_id: &str, api_key: &str) -> String {
    md5_hex(&format!("{merchant_code}{amount}{order_id}{api_key}"))
}

pub fn md5_hex(input: &str) -> String {
    let digest = Md5::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Maps a gateway result code onto the internal payment status. `00`/`0` mean the payment cleared; `01` means the
/// payment is still pending (the callback may be redelivered later); everything else is a failure.
pub fn status_for_result_code(result_code: &str) -> PaymentStatus {
    match result_code {
        "00" | "0" => PaymentStatus::Paid,
        "01" => PaymentStatus::Pending,
        _ => PaymentStatus::Failed,
    }
}

/// A human-readable status message for a gateway result code.
pub fn status_message(result_code: &str) -> &'static str {
    match result_code {
        "00" | "0" => "Pembayaran Berhasil",
        "01" => "Pembayaran Pending",
        "02" => "Pembayaran Gagal",
        "03" => "Pembayaran Expired",
        _ => "Status Tidak Diketahui",
    }
}

#[cfg(test)]
mod test {
    use tps_common::Rupiah;

    use super::{callback_signature, create_signature, new_deposit_order_id, new_order_id, status_for_result_code};
    use crate::db_types::{OrderId, PaymentStatus};

    #[test]
    fn order_ids_have_the_expected_shape() {
        let oid = new_order_id();
        assert!(oid.as_str().starts_with("ORD-"));
        let did = new_deposit_order_id(42);
        assert!(did.as_str().starts_with("DEP-42-"));
    }

    #[test]
    fn signatures_are_stable() {
        let oid = OrderId("ORD-1-abc".to_string());
        let a = create_signature("D1234", &oid, Rupiah::from(95_000), "secret");
        let b = create_signature("D1234", &oid, Rupiah::from(95_000), "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        // field order matters: the two signature forms differ for the same inputs
        let c = callback_signature("D1234", "95000", "ORD-1-abc", "secret");
        assert_ne!(a, c);
    }

    #[test]
    fn result_codes_map_to_statuses() {
        assert_eq!(status_for_result_code("00"), PaymentStatus::Paid);
        assert_eq!(status_for_result_code("0"), PaymentStatus::Paid);
        assert_eq!(status_for_result_code("01"), PaymentStatus::Pending);
        assert_eq!(status_for_result_code("02"), PaymentStatus::Failed);
        assert_eq!(status_for_result_code("wat"), PaymentStatus::Failed);
    }
}
