use crate::utils::RetryPolicy;
use anyhow::{Context, Result, anyhow};
use std::{str::FromStr, time::Duration};

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(anyhow!("{key} must be 'true' or 'false', got '{other}'")),
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool> {
    match std::env::var(key) {
        Ok(value) => parse_flag(key, &value),
        Err(_) => Ok(default),
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{value}'")),
        Err(_) => Ok(default),
    }
}

/// Saga tuning: retries and timeouts around store calls and the
/// reconciliation schedule.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    pub max_retries: u32,
    pub store_timeout_ms: u64,
    pub reconcile_interval_secs: u64,
    pub reconcile_after_secs: i64,
}

impl CheckoutConfig {
    pub fn init() -> Result<Self> {
        Ok(Self {
            max_retries: env_or("CHECKOUT_MAX_RETRIES", 3)?,
            store_timeout_ms: env_or("STORE_TIMEOUT_MS", 5000)?,
            reconcile_interval_secs: env_or("RECONCILE_INTERVAL_SECS", 60)?,
            reconcile_after_secs: env_or("RECONCILE_AFTER_SECS", 300)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.store_timeout_ms),
        )
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            store_timeout_ms: 5000,
            reconcile_interval_secs: 60,
            reconcile_after_secs: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub run_migrations: bool,
    pub port: u16,
    pub db_max_conn: u32,
    pub otel_endpoint: String,
    pub is_dev: bool,
    pub enable_file_log: bool,
    pub checkout: CheckoutConfig,
}

impl Config {
    pub fn init() -> Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").context("Missing environment variable: DATABASE_URL")?;
        let jwt_secret =
            std::env::var("JWT_SECRET").context("Missing environment variable: JWT_SECRET")?;

        let run_migrations = env_flag("RUN_MIGRATIONS", true)?;
        let port = env_or::<u16>("PORT", 5000).context("PORT must be a valid u16 integer")?;
        let db_max_conn = env_or("DB_MAX_CONN", 10)?;

        let otel_endpoint = std::env::var("OTEL_ENDPOINT")
            .unwrap_or_else(|_| "http://otel-collector:4317".to_string());

        let is_dev = env_flag("DEV_MODE", false)?;
        let enable_file_log = env_flag("ENABLE_FILE_LOG", false)?;

        let checkout = CheckoutConfig::init().context("failed checkout config")?;

        Ok(Self {
            database_url,
            jwt_secret,
            run_migrations,
            port,
            db_max_conn,
            otel_endpoint,
            is_dev,
            enable_file_log,
            checkout,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accept_only_true_or_false() {
        assert!(parse_flag("RUN_MIGRATIONS", "true").unwrap());
        assert!(!parse_flag("RUN_MIGRATIONS", "false").unwrap());
        assert!(parse_flag("RUN_MIGRATIONS", "yes").is_err());
    }

    #[test]
    fn retry_policy_follows_checkout_settings() {
        let checkout = CheckoutConfig {
            max_retries: 5,
            store_timeout_ms: 250,
            ..CheckoutConfig::default()
        };
        let policy = checkout.retry_policy();

        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.timeout, Duration::from_millis(250));
    }
}
