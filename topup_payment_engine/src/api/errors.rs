use thiserror::Error;
use tps_common::Rupiah;

use crate::{db_types::OrderId, pricing::PricingError, traits::StorefrontError};

/// Failures of the order orchestrator. Everything except `Internal` is user-visible with its specific reason;
/// `Internal` carries detail for the logs and surfaces as a generic message.
#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Product not found")]
    ItemNotFound,
    #[error("Category not found")]
    CategoryNotFound,
    #[error("{0}")]
    Pricing(#[from] PricingError),
    #[error("Insufficient balance")]
    InsufficientBalance,
    #[error("Invalid deposit amount: {0}")]
    InvalidDepositAmount(Rupiah),
    #[error("Payment gateway error: {0}")]
    GatewayRejected(String),
    #[error("Provisioning provider error: {0}")]
    ProviderFailed(String),
    #[error("Not authorized to perform this operation")]
    Unauthorized,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StorefrontError> for OrderFlowError {
    fn from(e: StorefrontError) -> Self {
        match e {
            StorefrontError::VoucherExhausted => OrderFlowError::Pricing(PricingError::VoucherExhausted),
            StorefrontError::InsufficientBalance => OrderFlowError::InsufficientBalance,
            other => OrderFlowError::Internal(other.to_string()),
        }
    }
}

/// Failures of callback reconciliation. The server maps the validation variants to 400/404 responses; `Internal`
/// is always acknowledged with a 200 so the gateway does not retry-storm a callback we can never process.
#[derive(Debug, Clone, Error)]
pub enum CallbackError {
    #[error("Missing required field: {0}")]
    MissingFields(&'static str),
    #[error("Invalid merchant code")]
    MerchantMismatch,
    #[error("Invalid callback signature")]
    InvalidSignature,
    #[error("Transaction not found: {0}")]
    TransactionNotFound(OrderId),
    #[error("Error processing callback: {0}")]
    Internal(String),
}

impl From<StorefrontError> for CallbackError {
    fn from(e: StorefrontError) -> Self {
        match e {
            StorefrontError::TransactionNotFound(oid) => CallbackError::TransactionNotFound(oid),
            other => CallbackError::Internal(other.to_string()),
        }
    }
}
