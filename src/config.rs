//! Environment-driven settings shared by the dashboard and the API

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::data::loader::DataSource;

pub const DEFAULT_DELAY_SOURCE: &str =
    "https://full-stack-assets.s3.eu-west-3.amazonaws.com/Deployment/get_around_delay_analysis.xlsx";
pub const DEFAULT_DELAY_SHEET: &str = "rentals_data";
pub const DEFAULT_PRICING_SOURCE: &str =
    "https://full-stack-assets.s3.eu-west-3.amazonaws.com/Deployment/get_around_pricing_project.csv";
pub const DEFAULT_MODEL_PATH: &str = "price_model.json";

/// Settings for both binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Rentals workbook (URL or path).
    pub delay_source: String,
    /// Sheet holding the rentals inside the workbook.
    pub delay_sheet: Option<String>,
    /// Pricing dataset (URL or path).
    pub pricing_source: String,
    /// Pre-trained model artifact.
    pub model_path: PathBuf,
    /// Upper bound on any remote fetch.
    pub fetch_timeout: Duration,
    pub host: String,
    pub port: u16,
    /// Cap on `/preview?rows=`.
    pub preview_max_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            delay_source: DEFAULT_DELAY_SOURCE.to_string(),
            delay_sheet: Some(DEFAULT_DELAY_SHEET.to_string()),
            pricing_source: DEFAULT_PRICING_SOURCE.to_string(),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            fetch_timeout: Duration::from_secs(30),
            host: "0.0.0.0".to_string(),
            port: 7860,
            preview_max_rows: 100,
        }
    }
}

impl AppConfig {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let delay_sheet = match lookup("GETAROUND_DELAY_SHEET") {
            // Empty value means "first sheet".
            Some(s) if s.trim().is_empty() => None,
            Some(s) => Some(s),
            None => defaults.delay_sheet,
        };

        Self {
            delay_source: lookup("GETAROUND_DELAY_SOURCE").unwrap_or(defaults.delay_source),
            delay_sheet,
            pricing_source: lookup("GETAROUND_PRICING_SOURCE")
                .unwrap_or(defaults.pricing_source),
            model_path: lookup("GETAROUND_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            fetch_timeout: Duration::from_secs(parse_or(
                &lookup,
                "GETAROUND_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )),
            host: lookup("API_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "API_PORT", defaults.port),
            preview_max_rows: parse_or(
                &lookup,
                "GETAROUND_PREVIEW_MAX_ROWS",
                defaults.preview_max_rows,
            ),
        }
    }

    pub fn delay_data_source(&self) -> DataSource {
        DataSource::new(&self.delay_source, self.delay_sheet.as_deref())
    }

    pub fn pricing_data_source(&self) -> DataSource {
        DataSource::new(&self.pricing_source, None)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Copy + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring invalid {key}={raw:?}, using {default}");
            default
        }),
        None => default,
    }
}
