mod common;

use common::*;
use topup_payment_engine::{
    db_types::{PaymentStatus, Role, TransactionType},
    pricing::PricingError,
    test_utils::{seed, CountingProvider, FailingGateway, HappyGateway, NullNotifier, RejectingProvider},
    traits::StorefrontDatabase,
    ManualOrderRequest,
    OrderFlowApi,
    OrderFlowError,
};
use tps_common::Rupiah;

#[tokio::test]
async fn gateway_order_happy_path() {
    let db = new_db("sqlite://../data/test_order_happy.db").await;
    seed_catalog(db.pool()).await;
    let api = order_api(db.clone());

    let receipt = api.initiate_order(order_request("100 Diamonds", "VA"), None).await.expect("Order failed");
    assert_eq!(receipt.status, PaymentStatus::Pending);
    assert_eq!(receipt.final_amount, Rupiah::from(100_000));
    assert!(receipt.payment_url.is_some());
    assert!(receipt.merchant_order_id.as_str().starts_with("ORD-"));

    let t = db.fetch_transaction(&receipt.merchant_order_id).await.unwrap().expect("No transaction");
    assert_eq!(t.transaction_type, TransactionType::TopUp);
    assert_eq!(t.payment_reference.as_deref(), Some(format!("REF-{}", receipt.merchant_order_id).as_str()));
    let p = db.fetch_purchase(&receipt.merchant_order_id).await.unwrap().expect("No purchase");
    assert_eq!(p.item_name, "100 Diamonds");
    assert_eq!(p.provider_code, "PC-100 Diamonds");
}

#[tokio::test]
async fn unknown_item_is_rejected() {
    let db = new_db("sqlite://../data/test_order_unknown_item.db").await;
    seed_catalog(db.pool()).await;
    let api = order_api(db);
    let err = api.initiate_order(order_request("9999 Diamonds", "VA"), None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::ItemNotFound));
}

#[tokio::test]
async fn invalid_voucher_code_is_rejected() {
    let db = new_db("sqlite://../data/test_order_bad_voucher.db").await;
    seed_catalog(db.pool()).await;
    let api = order_api(db);
    let mut req = order_request("100 Diamonds", "VA");
    req.voucher_code = Some("NOPE".to_string());
    let err = api.initiate_order(req, None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Pricing(PricingError::VoucherInvalid)));
}

#[tokio::test]
async fn voucher_discount_is_applied_and_redeemed() {
    let db = new_db("sqlite://../data/test_order_voucher.db").await;
    seed_catalog(db.pool()).await;
    seed::seed_voucher(db.pool(), "HEMAT10", 10.0, Some(5)).await;
    let api = order_api(db.clone());

    let mut req = order_request("100 Diamonds", "VA");
    req.voucher_code = Some("HEMAT10".to_string());
    let receipt = api.initiate_order(req, None).await.expect("Order failed");
    assert_eq!(receipt.discount_amount, Rupiah::from(10_000));
    assert_eq!(receipt.final_amount, Rupiah::from(90_000));

    let voucher = db.fetch_voucher("HEMAT10").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count, 1);
}

#[tokio::test]
async fn last_voucher_slot_is_redeemed_at_most_once() {
    let db = new_db("sqlite://../data/test_order_voucher_race.db").await;
    seed_catalog(db.pool()).await;
    seed::seed_voucher(db.pool(), "LAST1", 10.0, Some(1)).await;
    let api = std::sync::Arc::new(order_api(db.clone()));

    let handles = (0..4)
        .map(|_| {
            let api = api.clone();
            tokio::spawn(async move {
                let mut req = order_request("50 Diamonds", "VA");
                req.voucher_code = Some("LAST1".to_string());
                api.initiate_order(req, None).await
            })
        })
        .collect::<Vec<_>>();
    let mut ok = 0;
    let mut exhausted = 0;
    for h in handles {
        match h.await.unwrap() {
            Ok(_) => ok += 1,
            Err(OrderFlowError::Pricing(PricingError::VoucherExhausted)) => exhausted += 1,
            Err(e) => panic!("Unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1, "exactly one order may redeem the last voucher slot");
    assert_eq!(exhausted, 3);
    let voucher = db.fetch_voucher("LAST1").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count, 1);
    // the losers rolled back their whole atomic unit
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions").fetch_one(db.pool()).await.unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn gateway_rejection_fails_the_order() {
    let db = new_db("sqlite://../data/test_order_gw_reject.db").await;
    seed_catalog(db.pool()).await;
    let api = OrderFlowApi::new(
        db.clone(),
        FailingGateway::new("EX", "payment channel unavailable"),
        CountingProvider::new(),
        NullNotifier,
    );
    let err = api.initiate_order(order_request("100 Diamonds", "VA"), None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::GatewayRejected(_)));

    // The transaction survives as the FAILED audit record
    let (status,): (String,) =
        sqlx::query_as("SELECT payment_status FROM transactions ORDER BY id DESC LIMIT 1")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(status, "FAILED");
}

#[tokio::test]
async fn wallet_order_debits_and_provisions() {
    let db = new_db("sqlite://../data/test_order_wallet.db").await;
    seed_catalog(db.pool()).await;
    seed_member(db.pool(), "alice", 150_000).await;
    let provider = CountingProvider::new();
    let api = OrderFlowApi::new(db.clone(), HappyGateway::new(), provider.clone(), NullNotifier);
    let user = db.fetch_user("alice").await.unwrap().unwrap();

    let receipt = api.initiate_order(order_request("100 Diamonds", "SALDO"), Some(&user)).await.expect("Order failed");
    assert_eq!(receipt.status, PaymentStatus::Process);
    assert_eq!(provider.call_count(), 1);

    let user = db.fetch_user("alice").await.unwrap().unwrap();
    assert_eq!(user.balance, Rupiah::from(50_000));
    // invoice snapshot exists
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM invoices").fetch_one(db.pool()).await.unwrap();
    assert_eq!(n, 1);
}

#[tokio::test]
async fn wallet_order_without_actor_is_unauthorized() {
    let db = new_db("sqlite://../data/test_order_wallet_guest.db").await;
    seed_catalog(db.pool()).await;
    let api = order_api(db);
    let err = api.initiate_order(order_request("100 Diamonds", "SALDO"), None).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Unauthorized));
}

#[tokio::test]
async fn wallet_order_with_insufficient_balance_is_rejected() {
    let db = new_db("sqlite://../data/test_order_wallet_poor.db").await;
    seed_catalog(db.pool()).await;
    seed_member(db.pool(), "bob", 10_000).await;
    let api = order_api(db.clone());
    let user = db.fetch_user("bob").await.unwrap().unwrap();
    let err = api.initiate_order(order_request("100 Diamonds", "SALDO"), Some(&user)).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::InsufficientBalance));
    // the balance is untouched and no transaction was recorded
    assert_eq!(db.fetch_user("bob").await.unwrap().unwrap().balance, Rupiah::from(10_000));
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM transactions").fetch_one(db.pool()).await.unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn concurrent_wallet_orders_never_overdraw() {
    let db = new_db("sqlite://../data/test_order_wallet_race.db").await;
    seed_catalog(db.pool()).await;
    // Covers one 100k order, not two
    seed_member(db.pool(), "carol", 150_000).await;
    let api = std::sync::Arc::new(order_api(db.clone()));
    let user = db.fetch_user("carol").await.unwrap().unwrap();

    let handles = (0..4)
        .map(|_| {
            let api = api.clone();
            let user = user.clone();
            tokio::spawn(async move { api.initiate_order(order_request("100 Diamonds", "SALDO"), Some(&user)).await })
        })
        .collect::<Vec<_>>();
    let mut ok = 0;
    for h in handles {
        if h.await.unwrap().is_ok() {
            ok += 1;
        }
    }
    assert_eq!(ok, 1, "only one order can be funded from a 150k balance");
    let user = db.fetch_user("carol").await.unwrap().unwrap();
    assert_eq!(user.balance, Rupiah::from(50_000));
}

#[tokio::test]
async fn wallet_order_survives_provider_rejection() {
    let db = new_db("sqlite://../data/test_order_wallet_prov_fail.db").await;
    seed_catalog(db.pool()).await;
    seed_member(db.pool(), "dave", 200_000).await;
    let api = OrderFlowApi::new(db.clone(), HappyGateway::new(), RejectingProvider::new(), NullNotifier);
    let user = db.fetch_user("dave").await.unwrap().unwrap();

    // The money has been taken, so the order must stay PAID rather than fail
    let receipt = api.initiate_order(order_request("100 Diamonds", "SALDO"), Some(&user)).await.expect("Order failed");
    assert_eq!(receipt.status, PaymentStatus::Paid);
    assert_eq!(db.fetch_user("dave").await.unwrap().unwrap().balance, Rupiah::from(100_000));
}

#[tokio::test]
async fn deposit_initiation_creates_linked_records() {
    let db = new_db("sqlite://../data/test_deposit_init.db").await;
    seed_member(db.pool(), "erin", 0).await;
    let api = order_api(db.clone());
    let user = db.fetch_user("erin").await.unwrap().unwrap();

    let receipt = api.initiate_deposit(&user, Rupiah::from(50_000), "QRIS").await.expect("Deposit failed");
    assert!(receipt.merchant_order_id.as_str().starts_with("DEP-"));

    let t = db.fetch_transaction(&receipt.merchant_order_id).await.unwrap().expect("No transaction");
    assert_eq!(t.transaction_type, TransactionType::Deposit);
    assert_eq!(t.user_id.as_deref(), Some("erin"));
    let (oid,): (String,) = sqlx::query_as("SELECT merchant_order_id FROM deposits WHERE user_id = 'erin'")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(oid, receipt.merchant_order_id.to_string());
    // No credit until the callback settles it
    assert_eq!(db.fetch_user("erin").await.unwrap().unwrap().balance, Rupiah::from(0));
}

#[tokio::test]
async fn non_positive_deposit_amount_is_rejected() {
    let db = new_db("sqlite://../data/test_deposit_zero.db").await;
    seed_member(db.pool(), "zed", 0).await;
    let api = order_api(db.clone());
    let user = db.fetch_user("zed").await.unwrap().unwrap();

    for amount in [0, -5_000] {
        let err = api.initiate_deposit(&user, Rupiah::from(amount), "QRIS").await.unwrap_err();
        assert!(matches!(err, OrderFlowError::InvalidDepositAmount(_)), "got {err:?}");
    }
    let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM deposits").fetch_one(db.pool()).await.unwrap();
    assert_eq!(n, 0, "nothing may be recorded for a rejected deposit");
}

#[tokio::test]
async fn manual_order_requires_admin() {
    let db = new_db("sqlite://../data/test_manual_member.db").await;
    seed_catalog(db.pool()).await;
    seed_member(db.pool(), "frank", 0).await;
    let api = order_api(db.clone());
    let user = db.fetch_user("frank").await.unwrap().unwrap();
    let req = ManualOrderRequest {
        item_id: 1,
        account_id: "111".to_string(),
        server_id: None,
        whatsapp: "628000".to_string(),
    };
    let err = api.create_manual_order(&user, req).await.unwrap_err();
    assert!(matches!(err, OrderFlowError::Unauthorized));
}

#[tokio::test]
async fn manual_order_records_provider_status() {
    let db = new_db("sqlite://../data/test_manual_admin.db").await;
    let cat = seed_catalog(db.pool()).await;
    let item_id = seed::seed_item(db.pool(), "Weekly Pass", cat, Rupiah::from(28_000)).await;
    seed::seed_user(db.pool(), "root", Role::Admin, Rupiah::from(0)).await;
    let api = order_api(db.clone());
    let admin = db.fetch_user("root").await.unwrap().unwrap();

    let req = ManualOrderRequest {
        item_id,
        account_id: "222".to_string(),
        server_id: Some("9".to_string()),
        whatsapp: "628000".to_string(),
    };
    let t = api.create_manual_order(&admin, req).await.expect("Manual order failed");
    assert_eq!(t.transaction_type, TransactionType::Manual);
    // CountingProvider answers "Pending", which maps to PROCESS
    assert_eq!(t.payment_status, PaymentStatus::Process);
    assert!(t.merchant_order_id.as_str().starts_with("DF-"));
}
