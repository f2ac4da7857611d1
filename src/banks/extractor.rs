//! Market capitalization extractor
//!
//! Fetches the source page and parses its market cap table.

use super::{BankRecord, parse_banks_table};
use crate::client::PageClient;
use crate::etl::Extractor;
use crate::run_log::RunLog;

use eyre::Result;
use url::Url;

/// Extractor for the largest banks table
///
/// Emits one [`BankRecord`] per table row, in table order.
pub struct BanksExtractor<'a> {
    client: PageClient,
    url: Url,
    log: &'a RunLog,
}

impl<'a> BanksExtractor<'a> {
    /// Create a new banks extractor
    ///
    /// # Arguments
    /// * `client` - HTTP client used for the fetch
    /// * `url` - Page holding the market cap table
    /// * `log` - Run log receiving progress entries
    pub fn new(client: PageClient, url: Url, log: &'a RunLog) -> Self {
        Self { client, url, log }
    }
}

impl Extractor for BanksExtractor<'_> {
    type Item = BankRecord;

    async fn extract(&self) -> Result<Vec<Self::Item>> {
        self.log.info("Starting data extraction");
        self.log.info(format!("Making HTTP request to {}", self.url));
        let html = self.client.fetch(&self.url).await?;

        self.log.info("Locating market capitalization table");
        let table = parse_banks_table(&html)?;
        self.log.info(format!("Available columns: {:?}", table.headers));
        self.log.info(format!(
            "Data extraction completed: {} bank(s)",
            table.rows.len()
        ));

        Ok(table.rows)
    }
}
