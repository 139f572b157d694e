use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Dashboard period when the request does not specify one ("7d",
    /// "30d" or "90d").
    #[serde(default = "default_period")]
    pub default_period: String,
    #[serde(default = "default_top_offers")]
    pub top_offers_limit: usize,
}

fn default_period() -> String {
    "30d".to_string()
}

fn default_top_offers() -> usize {
    5
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // SMARTOFFERS_DATABASE__URL etc.
            .add_source(config::Environment::with_prefix("SMARTOFFERS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
