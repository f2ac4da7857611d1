//! Largest banks ETL stages
//!
//! - [`BanksExtractor`]: fetch the page and parse the market cap table
//! - [`CurrencyConverter`]: add GBP, EUR and INR columns
//! - [`BanksLoader`]: write the table to CSV and SQLite

mod extractor;
mod loader;
mod rates;
mod record;
mod table;
mod transformer;

pub use extractor::BanksExtractor;
pub use loader::BanksLoader;
pub use rates::ExchangeRates;
pub use record::{
    BankRecord, Cell, Column, ColumnType, Currency, NAME_COLUMN, SCHEMA, TransformedRecord,
    column_names, round2,
};
pub use table::{BanksTable, parse_banks_table, parse_market_cap};
pub use transformer::{CurrencyConverter, convert_record};
