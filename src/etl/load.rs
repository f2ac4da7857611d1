//! Loader trait for loading data to destinations

use eyre::Result;

/// Loader trait for loading data to a destination
///
/// Implementors define how to load items to destinations:
/// - Delimited files
/// - Databases
///
/// Loading replaces whatever the destination held before, so rerunning a
/// load with the same items leaves the destination in the same state.
pub trait Loader: Send + Sync {
    /// The type of items to load
    type Item: Send;

    /// Load items to the destination
    ///
    /// Returns the number of items loaded
    ///
    /// # Errors
    /// Returns an error if loading fails (I/O, storage, etc.)
    fn load(
        &self,
        items: Vec<Self::Item>,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
