//! Transformer trait for data transformation

use eyre::Result;

/// Transformer trait for transforming data items
///
/// Implementors define how to transform items:
/// - Data enrichment (adding derived columns)
/// - Format conversion
/// - Validation
///
/// A transformer never drops or reorders items: the output of
/// [`Transformer::transform_many`] lines up one-to-one with its input.
pub trait Transformer: Send + Sync {
    /// Input item type
    type Input: Send;

    /// Output item type after transformation
    type Output: Send;

    /// Transform a single item
    ///
    /// # Errors
    /// Returns an error if transformation fails (validation, conversion, etc.)
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;

    /// Transform multiple items (default batch implementation)
    ///
    /// Override this when the batch needs setup shared by all items
    fn transform_many(&self, inputs: Vec<Self::Input>) -> Result<Vec<Self::Output>> {
        inputs.into_iter().map(|i| self.transform(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doubler;

    impl Transformer for Doubler {
        type Input = i32;
        type Output = i32;

        fn transform(&self, input: Self::Input) -> Result<Self::Output> {
            Ok(input * 2)
        }
    }

    #[test]
    fn test_transform_many_keeps_order() {
        let output = Doubler.transform_many(vec![3, 1, 2]).unwrap();
        assert_eq!(output, vec![6, 2, 4]);
    }

    #[test]
    fn test_transform_many_empty() {
        let output = Doubler.transform_many(vec![]).unwrap();
        assert!(output.is_empty());
    }
}
