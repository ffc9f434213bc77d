use thiserror::Error;
use tps_common::Rupiah;

use crate::db_types::{OrderId, PaymentStatus};

//--------------------------------------   Payment gateway   ----------------------------------------------------------
/// An outbound payment-creation request. The client implementation owns the merchant identity and secret and is
/// responsible for signing the request.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub merchant_order_id: OrderId,
    pub amount: Rupiah,
    /// The gateway payment-method channel code chosen by the customer.
    pub payment_method: String,
    pub product_details: String,
    pub customer_name: String,
    pub phone_number: String,
}

/// A successfully created gateway payment session.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    /// The gateway-assigned payment reference.
    pub reference: String,
    /// Where the customer completes the payment.
    pub payment_url: String,
    pub status_code: String,
    pub status_message: String,
}

#[derive(Debug, Clone, Error)]
pub enum GatewayClientError {
    /// The gateway answered with a non-success status code. The message is surfaced to the caller and recorded on
    /// the transaction.
    #[error("Payment gateway rejected the request ({code}): {message}")]
    Rejected { code: String, message: String },
    #[error("Payment gateway did not respond in time: {0}")]
    Timeout(String),
    #[error("Could not reach the payment gateway: {0}")]
    Network(String),
    #[error("Unintelligible response from the payment gateway: {0}")]
    InvalidResponse(String),
}

/// The outbound interface to the external payment gateway.
#[allow(async_fn_in_trait)]
pub trait PaymentGatewayClient: Clone {
    /// Creates a payment session for the given order and returns the payable reference and URL.
    async fn create_payment(&self, request: &PaymentRequest) -> Result<PaymentSession, GatewayClientError>;
}

//-------------------------------------- Provisioning provider --------------------------------------------------------
/// A fulfilment job for the external top-up provider.
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub product_code: String,
    /// The target account at the game/service being topped up.
    pub account_id: String,
    pub server_id: Option<String>,
    pub whatsapp: String,
}

/// The provider's immediate answer to a fulfilment job.
#[derive(Debug, Clone)]
pub struct ProvisionReceipt {
    /// The provider's own order reference.
    pub ref_id: String,
    /// The provider's status string, verbatim.
    pub status: String,
}

impl ProvisionReceipt {
    /// Maps the provider's immediate status string onto the internal payment status. Used by the manual order path,
    /// where the transaction status is taken from this response.
    pub fn payment_status(&self) -> PaymentStatus {
        match self.status.as_str() {
            "Sukses" | "Success" => PaymentStatus::Success,
            "Pending" => PaymentStatus::Process,
            _ => PaymentStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("Provisioning provider rejected the job: {0}")]
    Rejected(String),
    #[error("Provisioning provider did not respond in time: {0}")]
    Timeout(String),
    #[error("Could not reach the provisioning provider: {0}")]
    Network(String),
}

/// The outbound interface to the external top-up provider.
#[allow(async_fn_in_trait)]
pub trait ProvisioningProvider: Clone {
    async fn top_up(&self, request: &ProvisionRequest) -> Result<ProvisionReceipt, ProviderError>;
}

//--------------------------------------       Notifier        --------------------------------------------------------
/// The payload for an order-status notification. Delivery is fire-and-forget: failures are logged by the caller and
/// never affect order state.
#[derive(Debug, Clone)]
pub struct OrderNotification {
    pub order_id: OrderId,
    pub product_name: String,
    pub amount: Rupiah,
    pub status: PaymentStatus,
    pub method: String,
    pub payment_url: Option<String>,
    pub customer_name: String,
    /// The customer's WhatsApp number; the admin recipient is configured on the notifier itself.
    pub recipient: String,
}

#[derive(Debug, Clone, Error)]
#[error("Notification could not be delivered: {0}")]
pub struct NotifyError(pub String);

#[allow(async_fn_in_trait)]
pub trait Notifier: Clone {
    async fn notify_admin(&self, note: &OrderNotification) -> Result<(), NotifyError>;
    async fn notify_customer(&self, note: &OrderNotification) -> Result<(), NotifyError>;
}
