//! Error taxonomy for the ETL run
//!
//! Stages return `eyre::Result`; the variants below ride inside the report
//! and can be recovered with [`EtlError::of`] or `downcast_ref`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EtlError {
    /// The source document could not be fetched
    #[error("Network error: {0}")]
    Network(String),

    /// The fetched document, a table row or a cell could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration or the exchange-rate reference is incomplete or invalid
    #[error("Config error: {0}")]
    Config(String),

    /// A file could not be written
    #[error("I/O error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The relational store could not be written or queried
    #[error("Storage error: {context}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl EtlError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn storage(context: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// Find the typed error carried by a report, if any
    pub fn of(report: &eyre::Report) -> Option<&EtlError> {
        report.downcast_ref::<EtlError>()
    }

    /// Short name of the error class, used in run log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "NetworkError",
            Self::Parse(_) => "ParseError",
            Self::Config(_) => "ConfigError",
            Self::Io { .. } => "IOError",
            Self::Storage { .. } => "StorageError",
        }
    }
}
