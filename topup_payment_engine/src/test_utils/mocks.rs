//! In-memory doubles for the external collaborators. Call counts use atomics so tests can assert how many times a
//! collaborator was actually hit, including across concurrent tasks.
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::traits::{
    GatewayClientError,
    Notifier,
    NotifyError,
    OrderNotification,
    PaymentGatewayClient,
    PaymentRequest,
    PaymentSession,
    ProviderError,
    ProvisioningProvider,
    ProvisionReceipt,
    ProvisionRequest,
};

/// A gateway that accepts everything and hands out predictable references.
#[derive(Clone, Default)]
pub struct HappyGateway {
    calls: Arc<AtomicUsize>,
}

impl HappyGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PaymentGatewayClient for HappyGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentSession {
            reference: format!("REF-{}", request.merchant_order_id),
            payment_url: format!("https://pay.example.com/{}", request.merchant_order_id),
            status_code: "00".to_string(),
            status_message: "SUCCESS".to_string(),
        })
    }
}

/// A gateway that rejects everything with the configured code and message.
#[derive(Clone)]
pub struct FailingGateway {
    pub code: String,
    pub message: String,
}

impl FailingGateway {
    pub fn new(code: &str, message: &str) -> Self {
        Self { code: code.to_string(), message: message.to_string() }
    }
}

impl PaymentGatewayClient for FailingGateway {
    async fn create_payment(&self, _request: &PaymentRequest) -> Result<PaymentSession, GatewayClientError> {
        Err(GatewayClientError::Rejected { code: self.code.clone(), message: self.message.clone() })
    }
}

/// A provider that accepts every job and counts how many it received.
#[derive(Clone, Default)]
pub struct CountingProvider {
    calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProvisioningProvider for CountingProvider {
    async fn top_up(&self, request: &ProvisionRequest) -> Result<ProvisionReceipt, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ProvisionReceipt { ref_id: format!("DF-{}-{n}", request.product_code), status: "Pending".to_string() })
    }
}

/// A provider that rejects every job, still counting them.
#[derive(Clone, Default)]
pub struct RejectingProvider {
    calls: Arc<AtomicUsize>,
}

impl RejectingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProvisioningProvider for RejectingProvider {
    async fn top_up(&self, _request: &ProvisionRequest) -> Result<ProvisionReceipt, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Rejected("Produk sedang gangguan".to_string()))
    }
}

/// A notifier that swallows everything.
#[derive(Clone, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    async fn notify_admin(&self, _note: &OrderNotification) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_customer(&self, _note: &OrderNotification) -> Result<(), NotifyError> {
        Ok(())
    }
}
