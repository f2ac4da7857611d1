//! Row types and the shared table schema
//!
//! [`SCHEMA`] is the single declaration of the output table. The CSV writer
//! and the SQLite store both build their column lists from it, and
//! [`TransformedRecord::cells`] yields values in the same order.

use crate::error::EtlError;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    /// Decimal value, written with two fractional digits
    Decimal,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Text => "TEXT",
            ColumnType::Decimal => "REAL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnType,
}

pub const NAME_COLUMN: &str = "Name";

/// Output table columns, in order
pub const SCHEMA: [Column; 5] = [
    Column {
        name: NAME_COLUMN,
        kind: ColumnType::Text,
    },
    Column {
        name: Currency::Usd.column(),
        kind: ColumnType::Decimal,
    },
    Column {
        name: Currency::Gbp.column(),
        kind: ColumnType::Decimal,
    },
    Column {
        name: Currency::Eur.column(),
        kind: ColumnType::Decimal,
    },
    Column {
        name: Currency::Inr.column(),
        kind: ColumnType::Decimal,
    },
];

pub fn column_names() -> Vec<&'static str> {
    SCHEMA.iter().map(|c| c.name).collect()
}

/// Currencies carried by the output table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Gbp,
    Eur,
    Inr,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Gbp, Currency::Eur, Currency::Inr];

    /// Currencies derived from USD through the exchange-rate reference
    pub const CONVERTED: [Currency; 3] = [Currency::Gbp, Currency::Eur, Currency::Inr];

    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Inr => "INR",
        }
    }

    /// Name of the market cap column holding this currency
    pub const fn column(&self) -> &'static str {
        match self {
            Currency::Usd => "MC_USD_Billion",
            Currency::Gbp => "MC_GBP_Billion",
            Currency::Eur => "MC_EUR_Billion",
            Currency::Inr => "MC_INR_Billion",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = EtlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EtlError::Config(format!("Unknown currency code '{}'", s.trim())))
    }
}

/// Round to two decimal places, half to even, always carrying two
/// fractional digits.
pub fn round2(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

/// One bank as read from the source table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankRecord {
    pub name: String,
    pub mc_usd_billion: Decimal,
}

impl BankRecord {
    pub fn new(name: impl Into<String>, mc_usd_billion: Decimal) -> Self {
        Self {
            name: name.into(),
            mc_usd_billion,
        }
    }
}

/// A bank with its market cap in every output currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedRecord {
    pub name: String,
    pub mc_usd_billion: Decimal,
    pub mc_gbp_billion: Decimal,
    pub mc_eur_billion: Decimal,
    pub mc_inr_billion: Decimal,
}

impl TransformedRecord {
    pub fn market_cap(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => self.mc_usd_billion,
            Currency::Gbp => self.mc_gbp_billion,
            Currency::Eur => self.mc_eur_billion,
            Currency::Inr => self.mc_inr_billion,
        }
    }

    /// Values in [`SCHEMA`] order
    pub fn cells(&self) -> [Cell<'_>; 5] {
        [
            Cell::Text(&self.name),
            Cell::Decimal(self.mc_usd_billion),
            Cell::Decimal(self.mc_gbp_billion),
            Cell::Decimal(self.mc_eur_billion),
            Cell::Decimal(self.mc_inr_billion),
        ]
    }
}

/// A single value of an output row
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Text(&'a str),
    Decimal(Decimal),
}

impl Cell<'_> {
    pub fn kind(&self) -> ColumnType {
        match self {
            Cell::Text(_) => ColumnType::Text,
            Cell::Decimal(_) => ColumnType::Decimal,
        }
    }
}

impl fmt::Display for Cell<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => f.write_str(s),
            Cell::Decimal(d) => write!(f, "{}", round2(*d)),
        }
    }
}
