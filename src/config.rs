//! Run configuration
//!
//! Settings are layered: built-in defaults, then an optional YAML file,
//! then `BANK_ETL_*` environment variables. The CLI applies its flags on
//! top of the result.

use crate::banks::Currency;
use crate::error::EtlError;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "bank-etl.yml";

pub const DEFAULT_URL: &str = "https://web.archive.org/web/20230908091635/https://en.wikipedia.org/wiki/List_of_largest_banks";

/// Settings for one run
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Page holding the market cap table
    pub url: String,
    /// CSV with `Currency` and `Rate` columns
    pub exchange_rates: PathBuf,
    pub csv_output: PathBuf,
    pub database: PathBuf,
    pub table: String,
    pub log_file: PathBuf,
    /// Request timeout in seconds
    pub timeout: u64,
    /// Extra attempts after a transient network failure
    pub retries: u32,
    /// Currency column used by the summary and size comparison queries
    pub currency: Currency,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            exchange_rates: PathBuf::from("exchange_rate.csv"),
            csv_output: PathBuf::from("./Largest_banks_data.csv"),
            database: PathBuf::from("Banks.db"),
            table: "Largest_banks".to_string(),
            log_file: PathBuf::from("code_log.txt"),
            timeout: 30,
            retries: 1,
            currency: Currency::Eur,
        }
    }
}

impl Config {
    /// Load defaults, the YAML file and the environment
    ///
    /// An explicit `path` must exist; without one, [`DEFAULT_CONFIG_FILE`]
    /// is read only if present.
    pub fn load(path: Option<&Path>) -> Result<Self, EtlError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let path = path.as_ref();
        log::debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        parse_yaml(&content).map_err(|e| {
            EtlError::Config(format!("Invalid config {}: {}", path.display(), e))
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self, EtlError> {
        parse_yaml(content).map_err(|e| EtlError::Config(format!("Invalid config: {}", e)))
    }

    /// Override settings from `BANK_ETL_*` environment variables
    ///
    /// - BANK_ETL_URL
    /// - BANK_ETL_RATES
    /// - BANK_ETL_CSV
    /// - BANK_ETL_DB
    /// - BANK_ETL_TABLE
    /// - BANK_ETL_LOG
    /// - BANK_ETL_TIMEOUT
    /// - BANK_ETL_RETRIES
    /// - BANK_ETL_CURRENCY
    pub fn apply_env(&mut self) -> Result<(), EtlError> {
        if let Some(url) = env("BANK_ETL_URL") {
            self.url = url;
        }
        if let Some(path) = env("BANK_ETL_RATES") {
            self.exchange_rates = path.into();
        }
        if let Some(path) = env("BANK_ETL_CSV") {
            self.csv_output = path.into();
        }
        if let Some(path) = env("BANK_ETL_DB") {
            self.database = path.into();
        }
        if let Some(table) = env("BANK_ETL_TABLE") {
            self.table = table;
        }
        if let Some(path) = env("BANK_ETL_LOG") {
            self.log_file = path.into();
        }
        if let Some(timeout) = env("BANK_ETL_TIMEOUT") {
            self.timeout = parse_number("BANK_ETL_TIMEOUT", &timeout)?;
        }
        if let Some(retries) = env("BANK_ETL_RETRIES") {
            self.retries = parse_number("BANK_ETL_RETRIES", &retries)?;
        }
        if let Some(currency) = env("BANK_ETL_CURRENCY") {
            self.currency = currency.parse()?;
        }
        Ok(())
    }

    /// Parsed source URL
    pub fn source_url(&self) -> Result<Url, EtlError> {
        Url::parse(&self.url).map_err(|e| EtlError::Config(format!("Invalid URL {}: {}", self.url, e)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Check values that cannot be checked by type alone
    pub fn validate(&self) -> Result<(), EtlError> {
        self.source_url()?;
        if self.timeout == 0 {
            return Err(EtlError::Config("Timeout must be at least one second".to_string()));
        }
        Ok(())
    }
}

fn parse_yaml(content: &str) -> Result<Config, serde_yaml::Error> {
    if content.trim().is_empty() {
        return Ok(Config::default());
    }
    serde_yaml::from_str(content)
}

fn env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, EtlError> {
    value
        .trim()
        .parse()
        .map_err(|_| EtlError::Config(format!("{} must be a number, got '{}'", key, value)))
}
