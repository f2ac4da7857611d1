//! Extractor trait for data extraction from a source

use eyre::Result;

/// Extractor trait for extracting rows from a source
///
/// Implementors define how to extract items from sources like:
/// - Web pages fetched over HTTP
/// - Local files
///
/// # Example
/// ```no_run
/// use bank_etl::etl::Extractor;
/// use eyre::Result;
/// use std::path::PathBuf;
///
/// struct LineExtractor {
///     path: PathBuf,
/// }
///
/// impl Extractor for LineExtractor {
///     type Item = String;
///
///     async fn extract(&self) -> Result<Vec<Self::Item>> {
///         let content = std::fs::read_to_string(&self.path)?;
///         Ok(content.lines().map(String::from).collect())
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// The type of items extracted
    type Item: Send;

    /// Extract items from the source, in source order
    ///
    /// # Errors
    /// Returns an error if extraction fails (network, parsing, etc.)
    fn extract(&self) -> impl std::future::Future<Output = Result<Vec<Self::Item>>> + Send;
}
