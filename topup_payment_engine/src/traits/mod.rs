//! The trait definitions for the engine's seams.
//!
//! [`StorefrontDatabase`] is the Data Store interface: everything the orchestrator and reconciler need from durable
//! storage, including the atomic multi-row units that carry the system's consistency guarantees. The collaborator
//! traits ([`PaymentGatewayClient`], [`ProvisioningProvider`], [`Notifier`]) model the external services; the server
//! crate provides the HTTP implementations and the test suite provides in-memory ones.
mod collaborators;
mod data_objects;
mod storefront_database;

pub use collaborators::{
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
pub use data_objects::{DepositSettlement, NewDeposit, StatusTransition};
pub use storefront_database::{StorefrontDatabase, StorefrontError};
