pub mod errors;
pub mod order_flow_api;
pub mod reconciler_api;

use tps_common::Secret;

/// The merchant's identity at the payment gateway. Injected explicitly into the gateway client and the reconciler;
/// nothing in the engine reads it from ambient/global state.
#[derive(Debug, Clone, Default)]
pub struct MerchantConfig {
    pub merchant_code: String,
    pub api_key: Secret<String>,
}

impl MerchantConfig {
    pub fn new(merchant_code: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { merchant_code: merchant_code.into(), api_key: Secret::new(api_key.into()) }
    }
}
