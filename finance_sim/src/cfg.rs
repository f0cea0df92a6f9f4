use config::{ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub quote: QuoteConfig,
    pub account: AccountConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub addr: String,
    pub max_request_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub session_ttl_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteSource {
    Http,
    Static,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteConfig {
    pub provider: QuoteSource,
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountConfig {
    pub default_cash: Decimal,
}

impl Config {
    /// Defaults, then `config/default.toml` if present, then `APP__SECTION__KEY`
    /// environment variables. `auth.jwt_secret` has no default.
    pub fn load() -> Result<Self, ConfigError> {
        config::Config::builder()
            .set_default("server.addr", "127.0.0.1:7878")?
            .set_default("server.max_request_bytes", 16 * 1024)?
            .set_default("database.url", "sqlite://finance.db")?
            .set_default("database.max_connections", 5)?
            .set_default("auth.session_ttl_secs", 24 * 60 * 60)?
            .set_default("quote.provider", "http")?
            .set_default("quote.base_url", "https://cloud.iexapis.com/stable")?
            .set_default("account.default_cash", "10000.00")?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}
