//! Currency conversion transformer
//!
//! Adds GBP, EUR and INR market cap columns to each extracted bank.

use super::{BankRecord, Currency, ExchangeRates, TransformedRecord};
use crate::etl::Transformer;
use crate::run_log::RunLog;

use eyre::Result;
use std::path::{Path, PathBuf};

/// Transformer converting USD market caps with an exchange-rate reference
///
/// The reference is read when a batch is transformed, so a broken rates
/// file surfaces only after extraction succeeded.
pub struct CurrencyConverter<'a> {
    rates_path: PathBuf,
    log: &'a RunLog,
}

impl<'a> CurrencyConverter<'a> {
    pub fn new(rates_path: impl AsRef<Path>, log: &'a RunLog) -> Self {
        Self {
            rates_path: rates_path.as_ref().to_path_buf(),
            log,
        }
    }

    fn load_rates(&self) -> Result<ExchangeRates> {
        self.log.info(format!(
            "Reading exchange rates from {}",
            self.rates_path.display()
        ));
        let rates = ExchangeRates::from_csv(&self.rates_path)?;
        self.log.info(format!("Exchange rates loaded: {}", rates));
        Ok(rates)
    }
}

/// Extend a bank with its converted market caps
pub fn convert_record(rates: &ExchangeRates, record: BankRecord) -> Result<TransformedRecord> {
    let usd = record.mc_usd_billion;
    Ok(TransformedRecord {
        mc_gbp_billion: rates.convert(usd, Currency::Gbp)?,
        mc_eur_billion: rates.convert(usd, Currency::Eur)?,
        mc_inr_billion: rates.convert(usd, Currency::Inr)?,
        mc_usd_billion: usd,
        name: record.name,
    })
}

impl Transformer for CurrencyConverter<'_> {
    type Input = BankRecord;
    type Output = TransformedRecord;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        let rates = self.load_rates()?;
        convert_record(&rates, input)
    }

    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        self.log.info("Starting data transformation");
        let rates = self.load_rates()?;

        let output = inputs
            .into_iter()
            .map(|record| convert_record(&rates, record))
            .collect::<Result<Vec<_>>>()?;

        self.log.info(format!(
            "Data transformation completed: {} row(s)",
            output.len()
        ));
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn rates_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_convert_batch() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path().join("log.txt")).unwrap();
        let rates = rates_file("Currency,Rate\nEUR,0.5\nGBP,0.8\nINR,82.95\n");

        let converter = CurrencyConverter::new(rates.path(), &log);
        let output = converter
            .transform_many(vec![
                BankRecord::new("First", dec!(100.00)),
                BankRecord::new("Second", dec!(1.01)),
            ])
            .unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output[0].name, "First");
        assert_eq!(output[0].mc_gbp_billion.to_string(), "80.00");
        assert_eq!(output[0].mc_eur_billion, dec!(50.00));
        assert_eq!(output[0].mc_inr_billion, dec!(8295.00));
        assert_eq!(output[1].name, "Second");
        // 1.01 * 0.5 = 0.505, half to even
        assert_eq!(output[1].mc_eur_billion.to_string(), "0.50");
    }

    #[test]
    fn test_missing_rate_is_config_error() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path().join("log.txt")).unwrap();
        let rates = rates_file("Currency,Rate\nEUR,0.5\nINR,82.95\n");

        let converter = CurrencyConverter::new(rates.path(), &log);
        let err = converter
            .transform_many(vec![BankRecord::new("First", dec!(100))])
            .unwrap_err();
        assert!(matches!(EtlError::of(&err), Some(EtlError::Config(_))));
    }

    #[test]
    fn test_single_transform() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path().join("log.txt")).unwrap();
        let rates = rates_file("Currency,Rate\nEUR,0.93\nGBP,0.8\nINR,82.95\n");

        let converter = CurrencyConverter::new(rates.path(), &log);
        let record = converter
            .transform(BankRecord::new("JPMorgan Chase", dec!(432.92)))
            .unwrap();
        assert_eq!(record.mc_gbp_billion, dec!(346.34));
        assert_eq!(record.mc_eur_billion, dec!(402.62));
        assert_eq!(record.mc_inr_billion, dec!(35910.71));

        let content = std::fs::read_to_string(temp.path().join("log.txt")).unwrap();
        assert!(content.contains("Reading exchange rates from"));
        assert!(content.contains("Exchange rates loaded: GBP=0.8, EUR=0.93, INR=82.95"));
    }
}
