use sqlx::SqlitePool;
use topup_payment_engine::{
    db_types::{OrderId, PaymentStatus, Role},
    helpers,
    test_utils::{prepare_test_env, seed, CountingProvider, HappyGateway, NullNotifier},
    CallbackPayload,
    MerchantConfig,
    NewOrderRequest,
    OrderFlowApi,
    ReconcilerApi,
    SqliteDatabase,
};
use tps_common::Rupiah;

pub const MERCHANT_CODE: &str = "D0001";
pub const API_KEY: &str = "test-api-key";

pub async fn new_db(url: &str) -> SqliteDatabase {
    prepare_test_env(url).await;
    SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database")
}

pub fn merchant() -> MerchantConfig {
    MerchantConfig::new(MERCHANT_CODE, API_KEY)
}

pub fn order_api(db: SqliteDatabase) -> OrderFlowApi<SqliteDatabase, HappyGateway, CountingProvider, NullNotifier> {
    OrderFlowApi::new(db, HappyGateway::new(), CountingProvider::new(), NullNotifier)
}

pub fn reconciler(db: SqliteDatabase) -> ReconcilerApi<SqliteDatabase, CountingProvider, NullNotifier> {
    ReconcilerApi::new(db, CountingProvider::new(), NullNotifier, merchant())
}

/// Seeds the standard catalog every test starts from: one category, one 100k item, one 50k item.
pub async fn seed_catalog(pool: &SqlitePool) -> i64 {
    let cat = seed::seed_category(pool, "Mobile Legends").await;
    seed::seed_item(pool, "100 Diamonds", cat, Rupiah::from(100_000)).await;
    seed::seed_item(pool, "50 Diamonds", cat, Rupiah::from(50_000)).await;
    cat
}

pub async fn seed_member(pool: &SqlitePool, id: &str, balance: i64) {
    seed::seed_user(pool, id, Role::Member, Rupiah::from(balance)).await;
}

pub fn order_request(item: &str, payment_code: &str) -> NewOrderRequest {
    NewOrderRequest {
        item_name: item.to_string(),
        payment_code: payment_code.to_string(),
        phone_number: "6281122334455".to_string(),
        account_id: "12345678".to_string(),
        server_id: Some("1234".to_string()),
        voucher_code: None,
        game: "Mobile Legends".to_string(),
        nickname: "player_one".to_string(),
    }
}

/// A correctly signed callback for the given order and amount.
pub fn signed_callback(order_id: &OrderId, amount: i64, result_code: &str) -> CallbackPayload {
    let amount = amount.to_string();
    let signature = helpers::callback_signature(MERCHANT_CODE, &amount, order_id.as_str(), API_KEY);
    CallbackPayload {
        merchant_code: Some(MERCHANT_CODE.to_string()),
        merchant_order_id: Some(order_id.to_string()),
        amount: Some(amount),
        signature: Some(signature),
        result_code: Some(result_code.to_string()),
        reference: Some("GW-REF-1".to_string()),
        product_details: None,
        phone_number: None,
    }
}

pub async fn transaction_status(db: &SqliteDatabase, order_id: &OrderId) -> PaymentStatus {
    use topup_payment_engine::traits::StorefrontDatabase;
    db.fetch_transaction(order_id).await.expect("Error fetching transaction").expect("Transaction not found").payment_status
}
