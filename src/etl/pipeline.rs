//! Pipeline orchestration for ETL operations

use super::{Extractor, Loader, Transformer};
use eyre::{Result, bail};

/// ETL Pipeline that runs Extract, Transform, and Load strictly in sequence
///
/// # Type Parameters
/// - `E`: Extractor type
/// - `T`: Transformer type (must transform from E::Item)
/// - `L`: Loader type (must load T::Output)
///
/// The first failing stage aborts the run; later stages never see partial
/// input.
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = E::Item>,
    L: Loader<Item = T::Output>,
{
    /// Create a new pipeline
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
        }
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract items from source
    /// 2. Transform the batch
    /// 3. Load items to destination
    ///
    /// Returns the number of items loaded
    ///
    /// # Errors
    /// Returns an error if any stage fails, or if a stage changes the
    /// number of rows it was handed
    pub async fn run(&self) -> Result<usize> {
        log::info!("Starting ETL pipeline");

        // Extract
        log::debug!("Extracting from source...");
        let items = self.extractor.extract().await?;
        let extracted = items.len();
        log::info!("Extracted {} items", extracted);

        // Transform
        log::debug!("Transforming items...");
        let transformed = self.transformer.transform_many(items)?;
        if transformed.len() != extracted {
            bail!(
                "Transformer returned {} items for {} inputs",
                transformed.len(),
                extracted
            );
        }
        log::info!("Transformed {} items", transformed.len());

        // Load
        log::debug!("Loading to destination...");
        let count = self.loader.load(transformed).await?;
        if count != extracted {
            bail!("Loader stored {} items out of {}", count, extracted);
        }
        log::info!("Loaded {} items", count);

        Ok(count)
    }
}
