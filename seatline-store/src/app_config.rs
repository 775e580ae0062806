use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub inventory: InventoryConfig,
    pub business_rules: BusinessRules,
    pub storage: StorageConfig,
    pub sweeper: SweeperConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InventoryConfig {
    pub seat_count: u32,
    pub label_prefix: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub seat_hold_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    pub redis_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SweeperConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(None)
    }

    /// `load` with the environment variables taken from `vars` instead of the
    /// process environment when given.
    fn load_with(vars: Option<config::Map<String, String>>) -> Result<Self, config::ConfigError> {
        let lookup = |name: &str| match &vars {
            Some(vars) => vars.get(name).cloned(),
            None => env::var(name).ok(),
        };
        let run_mode = lookup("RUN_MODE").unwrap_or_else(|| "development".into());
        let port = lookup("PORT");

        let s = Self::defaults()?
            .add_source(config::File::with_name("config/default").required(false))
            // Per-environment overrides, e.g. config/production.toml
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SEATLINE__BUSINESS_RULES__SEAT_HOLD_SECONDS=60`
            .add_source(
                config::Environment::with_prefix("SEATLINE")
                    .separator("__")
                    .source(vars.clone()),
            )
            // Hosting platforms hand out the listen port as plain PORT
            .set_override_option("server.port", port)?
            .build()?;

        s.try_deserialize()
    }

    /// Built-in defaults only, no files or environment.
    pub fn default_settings() -> Result<Self, config::ConfigError> {
        Self::defaults()?.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000_i64)?
            .set_default("inventory.seat_count", 200_i64)?
            .set_default("inventory.label_prefix", "A")?
            .set_default("business_rules.seat_hold_seconds", 30_i64)?
            .set_default("storage.backend", "memory")?
            .set_default("sweeper.enabled", false)?
            .set_default("sweeper.interval_seconds", 5_i64)
    }
}
