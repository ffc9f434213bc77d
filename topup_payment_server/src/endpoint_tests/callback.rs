use actix_web::http::StatusCode;
use serde_json::json;
use topup_payment_engine::helpers::callback_signature;

use super::helpers::{post_request, test_db, API_KEY, MERCHANT_CODE};

fn signed_callback(order_id: &str, amount: i64, result_code: &str) -> serde_json::Value {
    let amount = amount.to_string();
    let signature = callback_signature(MERCHANT_CODE, &amount, order_id, API_KEY);
    json!({
        "merchantCode": MERCHANT_CODE,
        "merchantOrderId": order_id,
        "amount": amount,
        "signature": signature,
        "resultCode": result_code,
        "reference": "GW-REF-1",
    })
}

#[actix_web::test]
async fn callback_settles_a_pending_order() {
    let db = test_db("sqlite://../data/test_ep_cb.db").await;
    let order = json!({
        "itemName": "100 Diamonds",
        "paymentCode": "VA",
        "phoneNumber": "6281122334455",
        "accountId": "12345678",
        "game": "Mobile Legends",
    });
    let (_, created) = post_request(&db, "/api/payment/initiate", order, None).await;
    let oid = created["merchantOrderId"].as_str().unwrap().to_string();

    let (status, body) = post_request(&db, "/api/payment/callback", signed_callback(&oid, 100_000, "00"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
}

#[actix_web::test]
async fn callback_with_bad_signature_is_400() {
    let db = test_db("sqlite://../data/test_ep_cb_sig.db").await;
    let mut payload = signed_callback("ORD-1-abcdef", 100_000, "00");
    payload["signature"] = json!("0000");
    let (status, body) = post_request(&db, "/api/payment/callback", payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn callback_for_unknown_order_is_404() {
    let db = test_db("sqlite://../data/test_ep_cb_404.db").await;
    let (status, _) =
        post_request(&db, "/api/payment/callback", signed_callback("ORD-404-zzzzzz", 100_000, "00"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn callback_with_missing_fields_is_400() {
    let db = test_db("sqlite://../data/test_ep_cb_fields.db").await;
    let payload = json!({ "merchantCode": MERCHANT_CODE });
    let (status, _) = post_request(&db, "/api/payment/callback", payload, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
