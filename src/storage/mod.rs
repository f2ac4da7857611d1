//! File system and database storage
//!
//! This module handles the load destinations:
//! - CSV output file
//! - SQLite table

mod csv_file;
mod sqlite;

pub use csv_file::CsvTableWriter;
pub use sqlite::SqliteStore;
pub(crate) use sqlite::decimal_from_real;
