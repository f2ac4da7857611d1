//! Read-only analytical queries over the loaded table
//!
//! All queries run on a read-only connection; none of them can change the
//! stored data.

use crate::banks::{Currency, NAME_COLUMN};
use crate::error::EtlError;
use crate::run_log::RunLog;
use crate::storage::{SqliteStore, decimal_from_real};

use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

/// Average, extremes and spread of one market cap column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarketCapSummary {
    pub currency: Currency,
    pub average: Option<Decimal>,
    pub max: Option<Decimal>,
    pub min: Option<Decimal>,
    /// `None` when the table is empty or the smallest value is zero
    pub max_to_min_ratio: Option<Decimal>,
}

/// Average market cap in every currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyAverages {
    pub usd: Option<Decimal>,
    pub gbp: Option<Decimal>,
    pub eur: Option<Decimal>,
    pub inr: Option<Decimal>,
}

impl CurrencyAverages {
    pub fn get(&self, currency: Currency) -> Option<Decimal> {
        match currency {
            Currency::Usd => self.usd,
            Currency::Gbp => self.gbp,
            Currency::Eur => self.eur,
            Currency::Inr => self.inr,
        }
    }
}

/// A bank's size relative to the largest one
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelativeSize {
    pub name: String,
    pub market_cap: Decimal,
    pub percent_of_largest: Option<Decimal>,
}

/// Results of all three queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    pub summary: MarketCapSummary,
    pub averages: CurrencyAverages,
    pub relative_sizes: Vec<RelativeSize>,
}

impl AnalyticsReport {
    /// Run every query against the store's table, logging each one
    pub fn run(store: &SqliteStore, currency: Currency, log: &RunLog) -> Result<Self, EtlError> {
        log.info("Starting database queries");
        let conn = store.open_read_only()?;

        log.info(format!("Running market cap summary for {}", currency));
        let summary = market_cap_summary(&conn, store.table(), currency)?;

        log.info("Running average by currency");
        let averages = currency_averages(&conn, store.table())?;

        log.info(format!("Running bank size comparison for {}", currency));
        let relative_sizes = relative_sizes(&conn, store.table(), currency)?;

        log.info("Database queries completed");
        Ok(Self {
            summary,
            averages,
            relative_sizes,
        })
    }
}

pub fn market_cap_summary(
    conn: &Connection,
    table: &str,
    currency: Currency,
) -> Result<MarketCapSummary, EtlError> {
    let col = currency.column();
    let sql = format!(
        "SELECT ROUND(AVG(\"{col}\"), 2), ROUND(MAX(\"{col}\"), 2), ROUND(MIN(\"{col}\"), 2), \
         ROUND(MAX(\"{col}\") / MIN(\"{col}\"), 2) FROM \"{table}\""
    );

    conn.query_row(&sql, [], |row| {
        Ok(MarketCapSummary {
            currency,
            average: optional_real(row.get(0)?),
            max: optional_real(row.get(1)?),
            min: optional_real(row.get(2)?),
            max_to_min_ratio: optional_real(row.get(3)?),
        })
    })
    .map_err(|e| EtlError::storage(format!("Market cap summary on {} failed", table), e))
}

pub fn currency_averages(conn: &Connection, table: &str) -> Result<CurrencyAverages, EtlError> {
    let averages: Vec<String> = Currency::ALL
        .iter()
        .map(|c| format!("ROUND(AVG(\"{}\"), 2)", c.column()))
        .collect();
    let sql = format!("SELECT {} FROM \"{}\"", averages.join(", "), table);

    conn.query_row(&sql, [], |row| {
        Ok(CurrencyAverages {
            usd: optional_real(row.get(0)?),
            gbp: optional_real(row.get(1)?),
            eur: optional_real(row.get(2)?),
            inr: optional_real(row.get(3)?),
        })
    })
    .map_err(|e| EtlError::storage(format!("Currency averages on {} failed", table), e))
}

/// Every bank with its share of the largest value, largest first
pub fn relative_sizes(
    conn: &Connection,
    table: &str,
    currency: Currency,
) -> Result<Vec<RelativeSize>, EtlError> {
    let col = currency.column();
    let sql = format!(
        "WITH max_cap AS (SELECT MAX(\"{col}\") AS max_mc FROM \"{table}\") \
         SELECT \"{NAME_COLUMN}\", \"{col}\", ROUND(\"{col}\" / max_mc * 100, 2) \
         FROM \"{table}\", max_cap \
         ORDER BY \"{col}\" DESC, \"{table}\".rowid"
    );
    let context = || format!("Bank size comparison on {} failed", table);

    let mut stmt = conn.prepare(&sql).map_err(|e| EtlError::storage(context(), e))?;
    let rows = stmt
        .query_map([], |row| {
            let value: f64 = row.get(1)?;
            Ok(RelativeSize {
                name: row.get(0)?,
                market_cap: decimal_from_real(value).unwrap_or_default(),
                percent_of_largest: optional_real(row.get(2)?),
            })
        })
        .map_err(|e| EtlError::storage(context(), e))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(|e| EtlError::storage(context(), e))?;

    Ok(rows)
}

fn optional_real(value: Option<f64>) -> Option<Decimal> {
    value.and_then(decimal_from_real)
}
