//! Request and response payloads for the HTTP surface.
use serde::{Deserialize, Serialize};
use topup_payment_engine::{db_types::PaymentStatus, DepositReceipt, OrderReceipt};

#[derive(Debug, Clone, Serialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Into<String>>(message: S) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// The storefront's order-initiation payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequestBody {
    pub item_name: String,
    pub payment_code: String,
    pub phone_number: String,
    pub account_id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    #[serde(default)]
    pub voucher_code: Option<String>,
    pub game: String,
    #[serde(default)]
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponseBody {
    pub merchant_order_id: String,
    pub status: PaymentStatus,
    pub payment_url: Option<String>,
    pub reference: Option<String>,
    pub original_amount: i64,
    pub discount_amount: i64,
    pub final_amount: i64,
}

impl From<OrderReceipt> for OrderResponseBody {
    fn from(r: OrderReceipt) -> Self {
        Self {
            merchant_order_id: r.merchant_order_id.to_string(),
            status: r.status,
            payment_url: r.payment_url,
            reference: r.reference,
            original_amount: r.original_amount.value(),
            discount_amount: r.discount_amount.value(),
            final_amount: r.final_amount.value(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequestBody {
    pub amount: i64,
    pub payment_code: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositResponseBody {
    pub merchant_order_id: String,
    pub payment_url: String,
    pub reference: String,
    pub amount: i64,
}

impl From<DepositReceipt> for DepositResponseBody {
    fn from(r: DepositReceipt) -> Self {
        Self {
            merchant_order_id: r.merchant_order_id.to_string(),
            payment_url: r.payment_url,
            reference: r.reference,
            amount: r.amount.value(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualOrderBody {
    pub item_id: i64,
    pub account_id: String,
    #[serde(default)]
    pub server_id: Option<String>,
    pub whatsapp: String,
}
