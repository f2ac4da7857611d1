//! CSV file output

use crate::banks::{TransformedRecord, column_names};
use crate::error::EtlError;
use crate::etl::Loader;

use eyre::Result;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Write the transformed table to a CSV file
///
/// The file is written to a temporary sibling and renamed over the target,
/// so the target either keeps its old content or holds the full new table.
pub struct CsvTableWriter {
    path: PathBuf,
}

impl CsvTableWriter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write header and rows, replacing any existing file
    pub fn write(&self, rows: &[TransformedRecord]) -> Result<(), EtlError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let context = || format!("Failed to write CSV file {}", self.path.display());

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| EtlError::io(context(), e))?;
        {
            let mut wtr = csv::Writer::from_writer(&mut temp);
            wtr.write_record(column_names())
                .map_err(|e| EtlError::io(context(), e.into()))?;
            for row in rows {
                wtr.write_record(row.cells().iter().map(|cell| cell.to_string()))
                    .map_err(|e| EtlError::io(context(), e.into()))?;
            }
            wtr.flush().map_err(|e| EtlError::io(context(), e))?;
        }

        temp.persist(&self.path)
            .map_err(|e| EtlError::io(context(), e.error))?;

        log::debug!("Wrote {} row(s) to {}", rows.len(), self.path.display());
        Ok(())
    }
}

impl Loader for CsvTableWriter {
    type Item = TransformedRecord;

    async fn load(&self, items: Vec<Self::Item>) -> Result<usize> {
        self.write(&items)?;
        Ok(items.len())
    }
}
