use crate::domain::{DomainPolicy, ReservedWords};
use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct TenantConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub domain: DomainConfig,
    pub store: StoreConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DomainConfig {
    pub root_domain: String,
    /// Comma separated; `None` uses the built-in list.
    pub reserved_words: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub mongodb_uri: String,
    pub mongodb_database: String,
    pub seed_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub tenant_limit: u32,
    pub tenant_window_seconds: u64,
    pub reserved_scan_limit: u32,
    pub reserved_scan_window_seconds: u64,
    pub global_ip_limit: u32,
    pub global_ip_window_seconds: u64,
    /// Reserved-subdomain requests within `scanner_ban_find_time_seconds`
    /// that get a fingerprint banned.
    pub scanner_ban_max_retry: u32,
    pub scanner_ban_find_time_seconds: u64,
    pub scanner_ban_seconds: u64,
    /// How often stale limiter keys and lapsed bans are evicted.
    pub cleanup_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            tenant_limit: 300,
            tenant_window_seconds: 60,
            reserved_scan_limit: 5,
            reserved_scan_window_seconds: 60,
            global_ip_limit: 100,
            global_ip_window_seconds: 60,
            scanner_ban_max_retry: 10,
            scanner_ban_find_time_seconds: 60,
            scanner_ban_seconds: 24 * 60 * 60,
            cleanup_interval_seconds: 60,
        }
    }
}

impl TenantConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let environment: Environment = env::var("ENVIRONMENT")
            .unwrap_or_else(|_| "dev".to_string())
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let is_prod = environment == Environment::Prod;

        let backend: StoreBackend = get_env("TENANT_STORE", Some("mongo"), is_prod)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;
        let mongo_default = |value| (backend == StoreBackend::Memory).then_some(value);

        let defaults = RateLimitConfig::default();

        let config = TenantConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("tenant-service"), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|v| !v.trim().is_empty()),
            domain: DomainConfig {
                root_domain: get_env("ROOT_DOMAIN", Some("localhost"), is_prod)?,
                reserved_words: env::var("RESERVED_WORDS").ok(),
            },
            store: StoreConfig {
                mongodb_uri: get_env("MONGODB_URI", mongo_default(""), is_prod)?,
                mongodb_database: get_env("MONGODB_DATABASE", Some("tenant_db"), is_prod)?,
                seed_path: env::var("TENANT_SEED_PATH").ok(),
                backend,
            },
            rate_limit: RateLimitConfig {
                tenant_limit: get_parsed("TENANT_RATE_LIMIT", defaults.tenant_limit)?,
                tenant_window_seconds: get_parsed(
                    "TENANT_RATE_WINDOW_SECONDS",
                    defaults.tenant_window_seconds,
                )?,
                reserved_scan_limit: get_parsed("RESERVED_SCAN_LIMIT", defaults.reserved_scan_limit)?,
                reserved_scan_window_seconds: get_parsed(
                    "RESERVED_SCAN_WINDOW_SECONDS",
                    defaults.reserved_scan_window_seconds,
                )?,
                global_ip_limit: get_parsed("GLOBAL_IP_LIMIT", defaults.global_ip_limit)?,
                global_ip_window_seconds: get_parsed(
                    "GLOBAL_IP_WINDOW_SECONDS",
                    defaults.global_ip_window_seconds,
                )?,
                scanner_ban_max_retry: get_parsed(
                    "SCANNER_BAN_MAX_RETRY",
                    defaults.scanner_ban_max_retry,
                )?,
                scanner_ban_find_time_seconds: get_parsed(
                    "SCANNER_BAN_FIND_TIME_SECONDS",
                    defaults.scanner_ban_find_time_seconds,
                )?,
                scanner_ban_seconds: get_parsed("SCANNER_BAN_SECONDS", defaults.scanner_ban_seconds)?,
                cleanup_interval_seconds: get_parsed(
                    "RATE_LIMIT_CLEANUP_INTERVAL_SECONDS",
                    defaults.cleanup_interval_seconds,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Dev
    }

    /// Builds the process-wide domain policy. The `.localhost` exception is
    /// only honoured in development.
    pub fn domain_policy(&self) -> Result<DomainPolicy, AppError> {
        let reserved = self
            .domain
            .reserved_words
            .as_deref()
            .map(ReservedWords::from_csv)
            .unwrap_or_default();

        DomainPolicy::new(&self.domain.root_domain, self.is_development(), reserved).ok_or_else(
            || {
                AppError::ConfigError(anyhow::anyhow!(
                    "ROOT_DOMAIN '{}' is not a usable domain",
                    self.domain.root_domain
                ))
            },
        )
    }

    fn validate(&self) -> Result<(), AppError> {
        self.domain_policy()?;

        if self.store.backend == StoreBackend::Mongo && self.store.mongodb_uri.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "MONGODB_URI is required when TENANT_STORE=mongo"
            )));
        }

        if self.environment == Environment::Prod {
            if self.store.backend == StoreBackend::Memory {
                tracing::warn!("In-memory tenant store selected in production");
            }
            if self.domain.root_domain == "localhost" {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "ROOT_DOMAIN must be set to the platform domain in production"
                )));
            }
        }

        Ok(())
    }
}

/// Reads `key`, falling back to `default`. A key without a default is
/// required; in production every key without a default must be set.
fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => match default {
            Some(def) => Ok(def.to_string()),
            None if is_prod => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required in production but not set",
                key
            ))),
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "{} is required but not set",
                key
            ))),
        },
    }
}

fn get_parsed<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val.trim().parse().map_err(|e: T::Err| {
            AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Environment::Dev),
            "prod" | "production" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(StoreBackend::Mongo),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(format!("Invalid tenant store: {}", s)),
        }
    }
}
