//! API configuration, loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;

use rust_decimal::Decimal;
use thiserror::Error;

use clinic_core::money::MAX_PERCENTAGE;
use clinic_observability::{LogFormat, LogSettings};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_TAX_PERCENTAGE: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `CLINIC_BIND_ADDR`
    pub bind_addr: SocketAddr,

    /// `CLINIC_SEED_SAMPLE_DATA`: load the sample catalog at startup.
    pub seed_sample_data: bool,

    /// `CLINIC_DEFAULT_TAX_PERCENTAGE`: applied when an invoice omits `taxPercentage`.
    pub default_tax_percentage: Decimal,

    /// `CLINIC_LOG_FORMAT` (`json` | `text`). The filter itself comes from `RUST_LOG`.
    pub log: LogSettings,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            seed_sample_data: true,
            default_tax_percentage: Decimal::from(DEFAULT_TAX_PERCENTAGE),
            log: LogSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr = match lookup("CLINIC_BIND_ADDR") {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("CLINIC_BIND_ADDR".to_string()))?,
            None => defaults.bind_addr,
        };

        let seed_sample_data = match lookup("CLINIC_SEED_SAMPLE_DATA") {
            Some(v) => parse_bool(&v)
                .ok_or_else(|| ConfigError::InvalidValue("CLINIC_SEED_SAMPLE_DATA".to_string()))?,
            None => defaults.seed_sample_data,
        };

        let default_tax_percentage = match lookup("CLINIC_DEFAULT_TAX_PERCENTAGE") {
            Some(v) => {
                let pct: Decimal = v.trim().parse().map_err(|_| {
                    ConfigError::InvalidValue("CLINIC_DEFAULT_TAX_PERCENTAGE".to_string())
                })?;
                if pct < Decimal::ZERO || pct > MAX_PERCENTAGE {
                    return Err(ConfigError::InvalidValue(
                        "CLINIC_DEFAULT_TAX_PERCENTAGE".to_string(),
                    ));
                }
                pct
            }
            None => defaults.default_tax_percentage,
        };

        let format = match lookup("CLINIC_LOG_FORMAT") {
            Some(v) => v
                .parse::<LogFormat>()
                .map_err(|_| ConfigError::InvalidValue("CLINIC_LOG_FORMAT".to_string()))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            seed_sample_data,
            default_tax_percentage,
            log: LogSettings {
                format,
                ..defaults.log
            },
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
