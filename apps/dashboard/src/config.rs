use std::str::FromStr;

use anyhow::{Context, Result};

use crate::metrics::DashboardVariant;

pub const DEFAULT_DATASET_URL: &str =
    "https://raw.githubusercontent.com/CSSEGISandData/COVID-19/web-data/data/cases_country.csv";
pub const DEFAULT_COUNTRIES_URL: &str = "https://api.covid19api.com/countries";
pub const DEFAULT_TIMESERIES_BASE_URL: &str = "https://api.covid19api.com/live/country";

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub dataset_url: String,
    pub countries_url: String,
    pub timeseries_base_url: String,
    pub variant: DashboardVariant,
    pub top_n: usize,
    pub fetch_timeout_secs: u64,
    pub fetch_max_retries: u32,
    pub max_sessions: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            dataset_url: string("DATASET_URL", DEFAULT_DATASET_URL),
            countries_url: string("COUNTRIES_URL", DEFAULT_COUNTRIES_URL),
            timeseries_base_url: string("TIMESERIES_BASE_URL", DEFAULT_TIMESERIES_BASE_URL),
            variant: parse_var(&lookup, "DASHBOARD_VARIANT", DashboardVariant::Full)?,
            top_n: parse_var(&lookup, "TOP_N", crate::views::ranking::DEFAULT_TOP_N)?,
            fetch_timeout_secs: parse_var(&lookup, "FETCH_TIMEOUT_SECS", 30)?,
            fetch_max_retries: parse_var(&lookup, "FETCH_MAX_RETRIES", 3)?,
            max_sessions: parse_var(&lookup, "MAX_SESSIONS", 256)?,
            port: parse_var(&lookup, "PORT", 8080)?,
            rust_log: string("RUST_LOG", "info"),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
    }
}
