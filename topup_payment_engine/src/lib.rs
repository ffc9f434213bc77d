//! Top-up Payment Engine
//!
//! The engine contains the money-moving core of the top-up storefront: pricing, the stored-balance ledger, order
//! orchestration and the reconciliation of asynchronous payment-gateway callbacks. It is HTTP-framework agnostic;
//! the server crate supplies the actual gateway, provisioning and notification integrations.
//!
//! The library is divided into three main sections:
//! 1. Database management ([`mod@sqlite`]). SQLite is the supported backend. You should never need to access the
//!    database directly; use the APIs instead. The exception is the data types used in the database, which are
//!    defined in [`mod@db_types`] and are public.
//! 2. The storefront and collaborator traits ([`mod@traits`]). Backends implement [`traits::StorefrontDatabase`],
//!    while payment gateways, provisioning providers and notifiers implement the collaborator traits.
//! 3. The public API ([`OrderFlowApi`] and [`ReconcilerApi`]). `OrderFlowApi` owns order and deposit initiation and
//!    the manual/admin order path; `ReconcilerApi` converts inbound gateway callbacks into durable state
//!    transitions, exactly once.
pub mod db_types;
pub mod helpers;
pub mod pricing;
pub mod traits;

mod api;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use api::{
    errors::{CallbackError, OrderFlowError},
    order_flow_api::{DepositReceipt, ManualOrderRequest, NewOrderRequest, OrderFlowApi, OrderReceipt},
    reconciler_api::{CallbackOutcome, CallbackPayload, ReconcilerApi},
    MerchantConfig,
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
