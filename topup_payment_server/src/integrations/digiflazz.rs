//! The Digiflazz provisioning-provider client.
use std::sync::Arc;

use log::*;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use topup_payment_engine::{
    helpers::md5_hex,
    traits::{ProviderError, ProvisioningProvider, ProvisionReceipt, ProvisionRequest},
};

use crate::config::ProviderConfig;

#[derive(Clone)]
pub struct DigiflazzClient {
    config: ProviderConfig,
    client: Arc<Client>,
}

impl DigiflazzClient {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().build().map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn new_ref_id(&self) -> String {
        let suffix: u32 = rand::thread_rng().gen_range(100_000..1_000_000);
        format!("DF-{suffix}")
    }
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    data: TransactionData,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    ref_id: String,
    status: String,
    #[serde(default)]
    message: String,
}

impl ProvisioningProvider for DigiflazzClient {
    async fn top_up(&self, request: &ProvisionRequest) -> Result<ProvisionReceipt, ProviderError> {
        let ref_id = self.new_ref_id();
        // Digiflazz signs with md5(username + apiKey + refId)
        let sign = md5_hex(&format!("{}{}{ref_id}", self.config.username, self.config.api_key.reveal()));
        let customer_no = match &request.server_id {
            Some(server) => format!("{}{server}", request.account_id),
            None => request.account_id.clone(),
        };
        let body = json!({
            "username": self.config.username,
            "buyer_sku_code": request.product_code,
            "customer_no": customer_no,
            "ref_id": ref_id,
            "sign": sign,
        });
        trace!("📦️ Submitting fulfilment job {ref_id} for {}", request.product_code);
        let response = self
            .client
            .post(format!("{}/transaction", self.config.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout(e.to_string())
                } else {
                    ProviderError::Network(e.to_string())
                }
            })?;
        if !response.status().is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Rejected(message));
        }
        let result: TransactionResponse =
            response.json().await.map_err(|e| ProviderError::Network(format!("Unintelligible response: {e}")))?;
        let data = result.data;
        if data.status == "Gagal" {
            warn!("📦️ Fulfilment job {} was rejected: {}", data.ref_id, data.message);
            return Err(ProviderError::Rejected(data.message));
        }
        debug!("📦️ Fulfilment job {} accepted with status {}", data.ref_id, data.status);
        Ok(ProvisionReceipt { ref_id: data.ref_id, status: data.status })
    }
}
