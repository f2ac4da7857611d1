//! SQLite table storage
//!
//! The table is rebuilt from [`SCHEMA`] on every load: dropped, recreated
//! and filled, so reruns never accumulate rows.

use crate::banks::{Cell, SCHEMA, TransformedRecord, round2};
use crate::error::EtlError;
use crate::etl::Loader;

use eyre::Result;
use regex::Regex;
use rusqlite::types::{ToSqlOutput, Type, Value, ValueRef};
use rusqlite::{Connection, OpenFlags, ToSql, params_from_iter};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use std::path::{Path, PathBuf};

/// Plain SQL identifier, safe to quote into statements
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_]*$";

/// A named table in a SQLite database file
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    table: String,
}

impl SqliteStore {
    /// Create a store handle; nothing is opened until used
    ///
    /// # Errors
    /// Returns a `ConfigError` if the table name is not a plain identifier
    pub fn new(path: impl AsRef<Path>, table: impl Into<String>) -> Result<Self, EtlError> {
        let table = table.into();
        validate_identifier(&table)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            table,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Open a connection to the database file, creating it if needed
    pub fn open(&self) -> Result<Connection, EtlError> {
        Connection::open(&self.path).map_err(|e| {
            EtlError::storage(format!("Failed to open database {}", self.path.display()), e)
        })
    }

    /// Open a read-only connection; the database must already exist
    pub fn open_read_only(&self) -> Result<Connection, EtlError> {
        Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY).map_err(|e| {
            EtlError::storage(format!("Failed to open database {}", self.path.display()), e)
        })
    }

    /// Drop, recreate and fill the table on the given connection
    ///
    /// Pass a transaction to make the replacement atomic.
    pub fn replace_rows(&self, conn: &Connection, rows: &[TransformedRecord]) -> Result<usize, EtlError> {
        let context = || format!("Failed to write table {}", self.table);

        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{}\"; {}",
            self.table,
            self.create_sql()
        ))
        .map_err(|e| EtlError::storage(context(), e))?;

        let mut stmt = conn
            .prepare(&self.insert_sql())
            .map_err(|e| EtlError::storage(context(), e))?;
        for row in rows {
            stmt.execute(params_from_iter(row.cells()))
                .map_err(|e| EtlError::storage(context(), e))?;
        }

        log::debug!("Wrote {} row(s) to table {}", rows.len(), self.table);
        Ok(rows.len())
    }

    /// Replace the table contents in a single transaction
    pub fn replace(&self, rows: &[TransformedRecord]) -> Result<usize, EtlError> {
        let mut conn = self.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| EtlError::storage("Failed to begin transaction", e))?;
        let count = self.replace_rows(&tx, rows)?;
        tx.commit()
            .map_err(|e| EtlError::storage("Failed to commit transaction", e))?;
        Ok(count)
    }

    /// Read every row back, in insertion order
    pub fn read_all(&self) -> Result<Vec<TransformedRecord>, EtlError> {
        let conn = self.open_read_only()?;
        let context = || format!("Failed to read table {}", self.table);

        let columns: Vec<String> = SCHEMA.iter().map(|c| format!("\"{}\"", c.name)).collect();
        let sql = format!(
            "SELECT {} FROM \"{}\" ORDER BY rowid",
            columns.join(", "),
            self.table
        );

        let mut stmt = conn.prepare(&sql).map_err(|e| EtlError::storage(context(), e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TransformedRecord {
                    name: row.get(0)?,
                    mc_usd_billion: real_column(row, 1)?,
                    mc_gbp_billion: real_column(row, 2)?,
                    mc_eur_billion: real_column(row, 3)?,
                    mc_inr_billion: real_column(row, 4)?,
                })
            })
            .map_err(|e| EtlError::storage(context(), e))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(|e| EtlError::storage(context(), e))?;

        Ok(rows)
    }

    fn create_sql(&self) -> String {
        let columns: Vec<String> = SCHEMA
            .iter()
            .map(|c| format!("\"{}\" {}", c.name, c.kind.sql_type()))
            .collect();
        format!("CREATE TABLE \"{}\" ({});", self.table, columns.join(", "))
    }

    fn insert_sql(&self) -> String {
        let columns: Vec<String> = SCHEMA.iter().map(|c| format!("\"{}\"", c.name)).collect();
        let placeholders: Vec<String> = (1..=SCHEMA.len()).map(|i| format!("?{}", i)).collect();
        format!(
            "INSERT INTO \"{}\" ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            placeholders.join(", ")
        )
    }
}

impl Loader for SqliteStore {
    type Item = TransformedRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        Ok(self.replace(&items)?)
    }
}

impl ToSql for Cell<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Cell::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            Cell::Decimal(d) => round2(*d)
                .to_f64()
                .map(|f| ToSqlOutput::Owned(Value::Real(f)))
                .ok_or_else(|| {
                    rusqlite::Error::ToSqlConversionFailure(
                        format!("{} does not fit a REAL column", d).into(),
                    )
                }),
        }
    }
}

/// Two-decimal value from a REAL column; `None` for NaN or infinity
pub(crate) fn decimal_from_real(value: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(value).map(round2)
}

fn real_column(row: &rusqlite::Row<'_>, index: usize) -> rusqlite::Result<Decimal> {
    let value: f64 = row.get(index)?;
    decimal_from_real(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Real,
            format!("{} is not a finite number", value).into(),
        )
    })
}

fn validate_identifier(name: &str) -> Result<(), EtlError> {
    let pattern = Regex::new(IDENTIFIER_PATTERN)
        .map_err(|e| EtlError::Config(format!("Invalid identifier pattern: {}", e)))?;
    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(EtlError::Config(format!("Invalid table name '{}'", name)))
    }
}
