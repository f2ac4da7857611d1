//! Per-run progress log
//!
//! A [`RunLog`] is opened once at the start of a run and handed by reference
//! to every stage. Each entry is appended to the log file as one line and
//! mirrored to the `log` facade for the console. Dropping the handle writes
//! a closing line and flushes, so the file is closed on every exit path.

use crate::error::EtlError;

use eyre::Result;
use log::Level;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

pub struct RunLog {
    path: PathBuf,
    writer: Mutex<LineWriter<File>>,
}

impl RunLog {
    /// Open (or create) the log file for appending
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| EtlError::io(format!("Failed to open log file {}", path.display()), e))?;

        log::debug!("Run log opened at {}", path.display());

        Ok(Self {
            path,
            writer: Mutex::new(LineWriter::new(file)),
        })
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.write(Level::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.write(Level::Error, message.as_ref());
    }

    fn write(&self, level: Level, message: &str) {
        log::log!(level, "{}", message);

        let timestamp = chrono::Local::now().format(TIMESTAMP_FORMAT);
        let line = format!("{} - {} - {}", timestamp, level_name(level), message);

        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(writer, "{}", line) {
            // The run itself must not fail because the log file went away
            log::warn!("Failed to write to {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        self.write(Level::Debug, "Run log closed");
        let writer = self.writer.get_mut().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writer.flush() {
            log::warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}
