//! WhatsApp notification delivery.
//!
//! Delivery is best-effort by contract: the engine logs failures and carries on, so this client never retries and
//! treats a missing configuration as "log and drop" rather than an error.
use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde_json::json;
use topup_payment_engine::traits::{Notifier, NotifyError, OrderNotification};

use crate::config::WhatsAppConfig;

#[derive(Clone)]
pub struct WhatsAppNotifier {
    config: WhatsAppConfig,
    client: Arc<Client>,
}

impl WhatsAppNotifier {
    pub fn new(config: WhatsAppConfig) -> Result<Self, NotifyError> {
        let client = Client::builder().build().map_err(|e| NotifyError(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    async fn send(&self, number: &str, message: String) -> Result<(), NotifyError> {
        if self.config.api_url.is_empty() {
            debug!("📣️ WhatsApp is not configured. Dropping message for {number}.");
            return Ok(());
        }
        let body = json!({
            "api_key": self.config.api_key.reveal(),
            "number": number,
            "message": message,
        });
        let response =
            self.client.post(&self.config.api_url).json(&body).send().await.map_err(|e| NotifyError(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError(format!("WhatsApp API answered {}", response.status())));
        }
        Ok(())
    }

    fn order_summary(note: &OrderNotification) -> String {
        let mut lines = vec![
            format!("Pesanan: {}", note.order_id),
            format!("Produk: {}", note.product_name),
            format!("Total: {}", note.amount),
            format!("Metode: {}", note.method),
            format!("Status: {}", note.status),
        ];
        if let Some(url) = &note.payment_url {
            lines.push(format!("Bayar di: {url}"));
        }
        lines.join("\n")
    }
}

impl Notifier for WhatsAppNotifier {
    async fn notify_admin(&self, note: &OrderNotification) -> Result<(), NotifyError> {
        if self.config.admin_number.is_empty() {
            debug!("📣️ No admin number configured. Dropping admin notification for {}.", note.order_id);
            return Ok(());
        }
        let message = format!("Pesanan baru dari {}\n{}", note.customer_name, Self::order_summary(note));
        self.send(&self.config.admin_number, message).await
    }

    async fn notify_customer(&self, note: &OrderNotification) -> Result<(), NotifyError> {
        let message = format!("Terima kasih, {}!\n{}", note.customer_name, Self::order_summary(note));
        self.send(&note.recipient, message).await
    }
}
