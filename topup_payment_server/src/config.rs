use std::{env, time::Duration};

use log::*;
use topup_payment_engine::MerchantConfig;
use tps_common::Secret;

const DEFAULT_TPS_HOST: &str = "127.0.0.1";
const DEFAULT_TPS_PORT: u16 = 8360;
const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_DUITKU_URL: &str = "https://passport.duitku.com/webapi/api/merchant";
const DEFAULT_DIGIFLAZZ_URL: &str = "https://api.digiflazz.com/v1";

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Payment gateway (Duitku) configuration.
    pub gateway: GatewayConfig,
    /// Provisioning provider (Digiflazz) configuration.
    pub provider: ProviderConfig,
    /// WhatsApp notification configuration.
    pub whatsapp: WhatsAppConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_TPS_HOST.to_string(),
            port: DEFAULT_TPS_PORT,
            database_url: String::default(),
            gateway: GatewayConfig::default(),
            provider: ProviderConfig::default(),
            whatsapp: WhatsAppConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("TPS_HOST").ok().unwrap_or_else(|| DEFAULT_TPS_HOST.into());
        let port = env::var("TPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for TPS_PORT. {e} Using the default, {DEFAULT_TPS_PORT}, instead."
                    );
                    DEFAULT_TPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_TPS_PORT);
        let database_url = env::var("TPS_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ TPS_DATABASE_URL is not set. Please set it to the URL for the storefront database.");
            String::default()
        });
        let gateway = GatewayConfig::from_env_or_default();
        let provider = ProviderConfig::from_env_or_default();
        let whatsapp = WhatsAppConfig::from_env_or_default();
        Self { host, port, database_url, gateway, provider, whatsapp }
    }
}

//-------------------------------------------------  GatewayConfig  ---------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    /// The merchant's identity at the gateway: merchant code plus the signing key.
    pub merchant: MerchantConfig,
    pub base_url: String,
    /// The URL the gateway will deliver payment callbacks to.
    pub callback_url: String,
    /// Where the customer lands after completing (or abandoning) a payment.
    pub return_url: String,
    /// How long to wait for the gateway before failing the payment attempt.
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let merchant_code = env::var("TPS_DUITKU_MERCHANT_CODE").ok().unwrap_or_else(|| {
            error!("🪛️ TPS_DUITKU_MERCHANT_CODE is not set. Please set it to your Duitku merchant code.");
            String::default()
        });
        let api_key = env::var("TPS_DUITKU_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ TPS_DUITKU_API_KEY is not set. Please set it to your Duitku API key.");
            String::default()
        });
        let base_url = env::var("TPS_DUITKU_BASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ TPS_DUITKU_BASE_URL is not set. Using the default.");
            DEFAULT_DUITKU_URL.to_string()
        });
        let callback_url = env::var("TPS_CALLBACK_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TPS_CALLBACK_URL is not set. The gateway will not be able to deliver payment callbacks.");
            String::default()
        });
        let return_url = env::var("TPS_RETURN_URL").ok().unwrap_or_default();
        let timeout = env::var("TPS_GATEWAY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("🪛️ Invalid configuration value for TPS_GATEWAY_TIMEOUT_SECS. {e}"))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { merchant: MerchantConfig::new(merchant_code, api_key), base_url, callback_url, return_url, timeout }
    }
}

//-------------------------------------------------  ProviderConfig  --------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct ProviderConfig {
    pub username: String,
    pub api_key: Secret<String>,
    pub base_url: String,
}

impl ProviderConfig {
    pub fn from_env_or_default() -> Self {
        let username = env::var("TPS_DIGIFLAZZ_USERNAME").ok().unwrap_or_else(|| {
            error!("🪛️ TPS_DIGIFLAZZ_USERNAME is not set. Please set it to your Digiflazz username.");
            String::default()
        });
        let api_key = env::var("TPS_DIGIFLAZZ_API_KEY").ok().unwrap_or_else(|| {
            error!("🪛️ TPS_DIGIFLAZZ_API_KEY is not set. Please set it to your Digiflazz API key.");
            String::default()
        });
        let base_url = env::var("TPS_DIGIFLAZZ_BASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ TPS_DIGIFLAZZ_BASE_URL is not set. Using the default.");
            DEFAULT_DIGIFLAZZ_URL.to_string()
        });
        Self { username, api_key: Secret::new(api_key), base_url }
    }
}

//-------------------------------------------------  WhatsAppConfig  --------------------------------------------------
#[derive(Clone, Debug, Default)]
pub struct WhatsAppConfig {
    pub api_url: String,
    pub api_key: Secret<String>,
    /// The operator number that receives new-order notifications.
    pub admin_number: String,
}

impl WhatsAppConfig {
    pub fn from_env_or_default() -> Self {
        let api_url = env::var("TPS_WHATSAPP_API_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ TPS_WHATSAPP_API_URL is not set. Notifications will be logged and dropped.");
            String::default()
        });
        let api_key = Secret::new(env::var("TPS_WHATSAPP_API_KEY").ok().unwrap_or_default());
        let admin_number = env::var("TPS_WHATSAPP_ADMIN_NUMBER").ok().unwrap_or_default();
        Self { api_url, api_key, admin_number }
    }
}
