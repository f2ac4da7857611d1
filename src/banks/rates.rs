//! Exchange-rate reference
//!
//! Rates are read from a CSV file with at least `Currency` and `Rate`
//! columns, one row per currency, expressed in units per US dollar.

use super::{Currency, round2};
use crate::error::EtlError;

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(rename = "Currency")]
    currency: String,
    #[serde(rename = "Rate")]
    rate: Decimal,
}

/// Conversion rates from USD to every converted currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeRates {
    rates: BTreeMap<Currency, Decimal>,
}

impl ExchangeRates {
    /// Load rates from a CSV file
    ///
    /// # Errors
    /// Returns a `ConfigError` if the file cannot be read or parsed, or if
    /// any of GBP, EUR or INR is missing
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self, EtlError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            EtlError::Config(format!(
                "Failed to open exchange rates {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_reader(file)
            .map_err(|e| match e {
                EtlError::Config(msg) => {
                    EtlError::Config(format!("{} ({})", msg, path.display()))
                }
                other => other,
            })
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, EtlError> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut rates = Vec::new();
        for result in rdr.deserialize() {
            let row: RateRow = result
                .map_err(|e| EtlError::Config(format!("Invalid exchange rate row: {}", e)))?;
            match row.currency.parse::<Currency>() {
                Ok(currency) => rates.push((currency, row.rate)),
                Err(_) => log::debug!("Ignoring exchange rate for {}", row.currency),
            }
        }

        Self::from_rates(rates)
    }

    /// Build from explicit pairs; later duplicates override earlier ones
    pub fn from_rates(rates: impl IntoIterator<Item = (Currency, Decimal)>) -> Result<Self, EtlError> {
        let rates: BTreeMap<Currency, Decimal> = rates
            .into_iter()
            .filter(|(currency, _)| *currency != Currency::Usd)
            .collect();

        let missing: Vec<&str> = Currency::CONVERTED
            .iter()
            .filter(|c| !rates.contains_key(c))
            .map(|c| c.code())
            .collect();
        if !missing.is_empty() {
            return Err(EtlError::Config(format!(
                "Missing exchange rates for currencies: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { rates })
    }

    /// Units of `currency` per USD
    pub fn rate(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => Decimal::ONE,
            other => self.rates.get(&other).copied().unwrap_or(Decimal::ZERO),
        }
    }

    /// Convert a USD amount, rounded to two decimal places
    pub fn convert(&self, usd: Decimal, currency: Currency) -> Result<Decimal, EtlError> {
        usd.checked_mul(self.rate(currency))
            .map(round2)
            .ok_or_else(|| {
                EtlError::Parse(format!("Converting {} USD to {} overflows", usd, currency))
            })
    }
}

impl fmt::Display for ExchangeRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self
            .rates
            .iter()
            .map(|(currency, rate)| format!("{}={}", currency, rate))
            .collect();
        f.write_str(&pairs.join(", "))
    }
}
