use actix_web::http::StatusCode;
use serde_json::json;

use super::helpers::{post_request, test_db};

fn order_body(item: &str, payment_code: &str) -> serde_json::Value {
    json!({
        "itemName": item,
        "paymentCode": payment_code,
        "phoneNumber": "6281122334455",
        "accountId": "12345678",
        "serverId": "1234",
        "game": "Mobile Legends",
        "nickname": "player_one",
    })
}

#[actix_web::test]
async fn guest_order_returns_payment_session() {
    let db = test_db("sqlite://../data/test_ep_order.db").await;
    let (status, body) = post_request(&db, "/api/payment/initiate", order_body("100 Diamonds", "VA"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PENDING");
    assert_eq!(body["finalAmount"], 100_000);
    assert!(body["paymentUrl"].as_str().unwrap().starts_with("https://pay.example.com/"));
}

#[actix_web::test]
async fn unknown_item_is_404() {
    let db = test_db("sqlite://../data/test_ep_order_404.db").await;
    let (status, body) = post_request(&db, "/api/payment/initiate", order_body("9999 Diamonds", "VA"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn wallet_order_without_actor_is_403() {
    let db = test_db("sqlite://../data/test_ep_order_saldo.db").await;
    let (status, _) = post_request(&db, "/api/payment/initiate", order_body("100 Diamonds", "SALDO"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn wallet_order_with_actor_succeeds() {
    let db = test_db("sqlite://../data/test_ep_order_saldo_ok.db").await;
    let (status, body) =
        post_request(&db, "/api/payment/initiate", order_body("100 Diamonds", "SALDO"), Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "PROCESS");
    assert!(body["paymentUrl"].is_null());
}

#[actix_web::test]
async fn unknown_actor_is_404() {
    let db = test_db("sqlite://../data/test_ep_order_actor.db").await;
    let (status, _) =
        post_request(&db, "/api/payment/initiate", order_body("100 Diamonds", "VA"), Some("nobody")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deposit_requires_actor() {
    let db = test_db("sqlite://../data/test_ep_deposit_noauth.db").await;
    let body = json!({ "amount": 50_000, "paymentCode": "QRIS" });
    let (status, _) = post_request(&db, "/api/payment/deposit", body, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn deposit_returns_payment_session() {
    let db = test_db("sqlite://../data/test_ep_deposit.db").await;
    let body = json!({ "amount": 50_000, "paymentCode": "QRIS" });
    let (status, body) = post_request(&db, "/api/payment/deposit", body, Some("alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["merchantOrderId"].as_str().unwrap().starts_with("DEP-"));
    assert_eq!(body["amount"], 50_000);
}

#[actix_web::test]
async fn zero_amount_deposit_is_a_bad_request() {
    let db = test_db("sqlite://../data/test_ep_deposit_zero.db").await;
    let body = json!({ "amount": 0, "paymentCode": "QRIS" });
    let (status, body) = post_request(&db, "/api/payment/deposit", body, Some("alice")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn manual_order_needs_the_admin_role() {
    let db = test_db("sqlite://../data/test_ep_manual.db").await;
    let body = json!({ "itemId": 1, "accountId": "111", "whatsapp": "628000" });
    let (status, _) = post_request(&db, "/api/order/manual", body.clone(), Some("alice")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = post_request(&db, "/api/order/manual", body, Some("root")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transaction_type"], "MANUAL");
}
