//! The Duitku payment-gateway client.
use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use topup_payment_engine::{
    helpers::create_signature,
    traits::{GatewayClientError, PaymentGatewayClient, PaymentRequest, PaymentSession},
};

use crate::config::GatewayConfig;

/// How long a created payment session remains payable, in minutes.
const EXPIRY_PERIOD_MINUTES: u32 = 60;

#[derive(Clone)]
pub struct DuitkuClient {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl DuitkuClient {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayClientError::Network(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn inquiry_url(&self) -> String {
        format!("{}/v2/inquiry", self.config.base_url)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InquiryResponse {
    status_code: String,
    status_message: String,
    #[serde(default)]
    reference: Option<String>,
    #[serde(default)]
    payment_url: Option<String>,
}

impl PaymentGatewayClient for DuitkuClient {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayClientError> {
        let merchant = &self.config.merchant;
        let signature =
            create_signature(&merchant.merchant_code, &request.merchant_order_id, request.amount, merchant.api_key.reveal());
        let body = json!({
            "merchantCode": merchant.merchant_code,
            "paymentAmount": request.amount.value(),
            "paymentMethod": request.payment_method,
            "merchantOrderId": request.merchant_order_id.as_str(),
            "productDetails": request.product_details,
            "customerVaName": request.customer_name,
            "phoneNumber": request.phone_number,
            "callbackUrl": self.config.callback_url,
            "returnUrl": self.config.return_url,
            "signature": signature,
            "expiryPeriod": EXPIRY_PERIOD_MINUTES,
        });
        trace!("💳️ Creating payment session for {}", request.merchant_order_id);
        let response = self.client.post(self.inquiry_url()).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                warn!("💳️ Gateway timed out for {}", request.merchant_order_id);
                GatewayClientError::Timeout(e.to_string())
            } else {
                GatewayClientError::Network(e.to_string())
            }
        })?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(GatewayClientError::Rejected { code: status.as_str().to_string(), message });
        }
        let inquiry: InquiryResponse =
            response.json().await.map_err(|e| GatewayClientError::InvalidResponse(e.to_string()))?;
        match inquiry.status_code.as_str() {
            "00" => {
                let reference = inquiry
                    .reference
                    .ok_or_else(|| GatewayClientError::InvalidResponse("Missing reference".to_string()))?;
                let payment_url = inquiry
                    .payment_url
                    .ok_or_else(|| GatewayClientError::InvalidResponse("Missing paymentUrl".to_string()))?;
                debug!("💳️ Payment session {reference} created for {}", request.merchant_order_id);
                Ok(PaymentSession {
                    reference,
                    payment_url,
                    status_code: inquiry.status_code,
                    status_message: inquiry.status_message,
                })
            },
            code => {
                Err(GatewayClientError::Rejected { code: code.to_string(), message: inquiry.status_message })
            },
        }
    }
}
