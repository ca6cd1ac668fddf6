use crate::error::{Error, Result};
use chrono::Duration;
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub webhook_secret: String,
    pub notification_webhook_url: Option<String>,
    pub payment_webhook_url: Option<String>,
    pub integration_rps: u32,
    pub public_rps: u32,
    pub sweep_cron: String,
    pub cors_allowed_origins: Vec<String>,
    pub log_format: LogFormat,
    pub policy: LifecyclePolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Knobs of the hiring and timecard lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecyclePolicy {
    pub review_window: Duration,
    pub platform_fee_rate: Decimal,
    pub max_shift_hours: i64,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            review_window: Duration::hours(72),
            platform_fee_rate: Decimal::new(15, 2),
            max_shift_hours: 24,
        }
    }
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let platform_fee_rate: Decimal = get_env_or("PLATFORM_FEE_RATE", Decimal::new(15, 2))?;
        if platform_fee_rate < Decimal::ZERO || platform_fee_rate > Decimal::ONE {
            return Err(Error::Config(format!(
                "PLATFORM_FEE_RATE must be between 0 and 1, got {}",
                platform_fee_rate
            )));
        }
        let review_window_hours: i64 = get_env_or("REVIEW_WINDOW_HOURS", 72)?;
        if review_window_hours <= 0 {
            return Err(Error::Config("REVIEW_WINDOW_HOURS must be positive".to_string()));
        }

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            jwt_secret: get_env("JWT_SECRET")?,
            webhook_secret: get_env("WEBHOOK_SECRET")?,
            notification_webhook_url: get_env_url("NOTIFICATION_WEBHOOK_URL")?,
            payment_webhook_url: get_env_url("PAYMENT_WEBHOOK_URL")?,
            integration_rps: get_env_or("INTEGRATION_RPS", 100)?,
            public_rps: get_env_or("PUBLIC_RPS", 50)?,
            sweep_cron: env::var("SWEEP_CRON").unwrap_or_else(|_| "0 */5 * * * *".to_string()),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            log_format: get_env_or("LOG_FORMAT", LogFormat::Text)?,
            policy: LifecyclePolicy {
                review_window: Duration::hours(review_window_hours),
                platform_fee_rate,
                max_shift_hours: get_env_or("MAX_SHIFT_HOURS", 24)?,
            },
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn get_env_url(name: &str) -> Result<Option<String>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            let parsed = url::Url::parse(raw.trim())
                .map_err(|e| Error::Config(format!("Invalid URL for {}: {}", name, e)))?;
            Ok(Some(parsed.to_string()))
        }
        _ => Ok(None),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_documented_values() {
        let policy = LifecyclePolicy::default();
        assert_eq!(policy.review_window, Duration::hours(72));
        assert_eq!(policy.platform_fee_rate.to_string(), "0.15");
        assert_eq!(policy.max_shift_hours, 24);
    }

    #[test]
    fn origin_list_skips_blanks() {
        assert_eq!(
            split_list(" https://a.example, ,https://b.example "),
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
