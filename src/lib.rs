//! Bank ETL
//!
//! Extracts the largest banks by market capitalization from a web page,
//! converts their market caps to GBP, EUR and INR, and loads the table to a
//! CSV file and a SQLite database.

pub mod analytics;
pub mod banks;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod etl;
pub mod run_log;
pub mod storage;

// Re-exports for convenience
pub use analytics::AnalyticsReport;
pub use banks::{BankRecord, BanksExtractor, BanksLoader, CurrencyConverter, TransformedRecord};
pub use client::PageClient;
pub use config::Config;
pub use error::EtlError;
pub use etl::{Extractor, Loader, Pipeline, Transformer};
pub use run_log::RunLog;
pub use storage::{CsvTableWriter, SqliteStore};
