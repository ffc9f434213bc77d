use actix_web::{
    body::MessageBody,
    http::StatusCode,
    test,
    test::TestRequest,
    web,
    App,
};
use serde_json::Value;
use topup_payment_engine::{
    db_types::Role,
    test_utils::{prepare_test_env, seed, CountingProvider, HappyGateway, NullNotifier},
    MerchantConfig,
    OrderFlowApi,
    ReconcilerApi,
    SqliteDatabase,
};
use tps_common::Rupiah;

use crate::routes::{health, initiate_deposit, initiate_order, manual_order, payment_callback};

pub const MERCHANT_CODE: &str = "D0001";
pub const API_KEY: &str = "test-api-key";

pub async fn test_db(url: &str) -> SqliteDatabase {
    let _ = env_logger::try_init();
    prepare_test_env(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating database");
    let cat = seed::seed_category(db.pool(), "Mobile Legends").await;
    seed::seed_item(db.pool(), "100 Diamonds", cat, Rupiah::from(100_000)).await;
    seed::seed_user(db.pool(), "alice", Role::Member, Rupiah::from(250_000)).await;
    seed::seed_user(db.pool(), "root", Role::Admin, Rupiah::from(0)).await;
    db
}

/// Posts `body` to `path` against a freshly wired app and returns the status and parsed body.
pub async fn post_request(db: &SqliteDatabase, path: &str, body: Value, actor: Option<&str>) -> (StatusCode, Value) {
    let order_api =
        OrderFlowApi::new(db.clone(), HappyGateway::new(), CountingProvider::new(), NullNotifier);
    let reconciler_api = ReconcilerApi::new(
        db.clone(),
        CountingProvider::new(),
        NullNotifier,
        MerchantConfig::new(MERCHANT_CODE, API_KEY),
    );
    let app = App::new()
        .app_data(web::Data::new(order_api))
        .app_data(web::Data::new(reconciler_api))
        .service(health)
        .service(
            web::scope("/api")
                .route(
                    "/payment/initiate",
                    web::post().to(initiate_order::<SqliteDatabase, HappyGateway, CountingProvider, NullNotifier>),
                )
                .route(
                    "/payment/deposit",
                    web::post().to(initiate_deposit::<SqliteDatabase, HappyGateway, CountingProvider, NullNotifier>),
                )
                .route(
                    "/payment/callback",
                    web::post().to(payment_callback::<SqliteDatabase, CountingProvider, NullNotifier>),
                )
                .route(
                    "/order/manual",
                    web::post().to(manual_order::<SqliteDatabase, HappyGateway, CountingProvider, NullNotifier>),
                ),
        );
    let service = test::init_service(app).await;
    let mut req = TestRequest::post().uri(path).set_json(&body);
    if let Some(actor) = actor {
        req = req.insert_header(("X-Actor-Id", actor));
    }
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let bytes = res.into_body().try_into_bytes().expect("Could not read response body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}
