//! Combined CSV and SQLite loader
//!
//! Both destinations are written under one SQLite transaction: the table is
//! replaced first, then the CSV file, then the transaction commits. A failed
//! CSV write rolls the table back, so either both outputs hold the new run
//! or neither changed. Only a failing commit after the file was renamed into
//! place leaves them out of step.

use super::TransformedRecord;
use crate::error::EtlError;
use crate::etl::Loader;
use crate::run_log::RunLog;
use crate::storage::{CsvTableWriter, SqliteStore};

use eyre::Result;

pub struct BanksLoader<'a> {
    csv: CsvTableWriter,
    store: SqliteStore,
    log: &'a RunLog,
}

impl<'a> BanksLoader<'a> {
    pub fn new(csv: CsvTableWriter, store: SqliteStore, log: &'a RunLog) -> Self {
        Self { csv, store, log }
    }

    fn load_rows(&self, rows: &[TransformedRecord]) -> Result<usize, EtlError> {
        self.log.info(format!(
            "Starting database load to {} (table {})",
            self.store.path().display(),
            self.store.table()
        ));
        let mut conn = self.store.open()?;
        let tx = conn
            .transaction()
            .map_err(|e| EtlError::storage("Failed to begin transaction", e))?;
        let count = self.store.replace_rows(&tx, rows)?;
        self.log.info(format!("Staged {} row(s) in table {}", count, self.store.table()));

        self.log.info(format!("Starting CSV export to {}", self.csv.path().display()));
        if let Err(e) = self.csv.write(rows) {
            self.log.error(format!("CSV export failed, rolling back database: {}", e));
            return Err(e);
        }
        self.log.info(format!("Data exported to {}", self.csv.path().display()));

        tx.commit()
            .map_err(|e| EtlError::storage("Failed to commit transaction", e))?;
        self.log.info(format!(
            "Data loaded to {} (table {})",
            self.store.path().display(),
            self.store.table()
        ));

        Ok(count)
    }
}

impl Loader for BanksLoader<'_> {
    type Item = TransformedRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        Ok(self.load_rows(&items)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn rows() -> Vec<TransformedRecord> {
        vec![TransformedRecord {
            name: "Alpha".to_string(),
            mc_usd_billion: dec!(100),
            mc_gbp_billion: dec!(80),
            mc_eur_billion: dec!(93),
            mc_inr_billion: dec!(8295),
        }]
    }

    #[tokio::test]
    async fn test_loads_both_destinations() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path().join("log.txt")).unwrap();
        let csv_path = temp.path().join("out.csv");
        let store = SqliteStore::new(temp.path().join("Banks.db"), "Largest_banks").unwrap();

        let loader = BanksLoader::new(CsvTableWriter::new(&csv_path), store.clone(), &log);
        assert_eq!(loader.load(rows()).await.unwrap(), 1);

        assert!(csv_path.exists());
        assert_eq!(store.read_all().unwrap(), rows());
    }

    #[tokio::test]
    async fn test_csv_failure_rolls_back_table() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path().join("log.txt")).unwrap();
        let store = SqliteStore::new(temp.path().join("Banks.db"), "Largest_banks").unwrap();
        store.replace(&rows()).unwrap();

        let bad_csv = CsvTableWriter::new(temp.path().join("missing").join("out.csv"));
        let loader = BanksLoader::new(bad_csv, store.clone(), &log);
        let err = loader.load(vec![]).await.unwrap_err();

        assert!(matches!(EtlError::of(&err), Some(EtlError::Io { .. })));
        // previous table content survives
        assert_eq!(store.read_all().unwrap().len(), 1);
    }
}
