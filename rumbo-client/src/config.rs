use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Publishable key for the card gateway. Absence is not a load
    /// failure; it is surfaced as a configuration error when the payment
    /// step mounts.
    #[serde(default)]
    pub publishable_key: Option<String>,
    #[serde(default = "default_gateway_base_url")]
    pub base_url: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            publishable_key: None,
            base_url: default_gateway_base_url(),
        }
    }
}

fn default_gateway_base_url() -> String {
    "https://api.stripe.com".to_string()
}

impl Config {
    /// Load from optional config files plus the environment.
    /// E.g. `RUMBO__API__BASE_URL`, `RUMBO__GATEWAY__PUBLISHABLE_KEY`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("RUMBO").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
