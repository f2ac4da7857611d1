//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides trait definitions for building the bank pipeline:
//! a source is extracted into rows, the rows are transformed, and the
//! result is loaded to its destinations.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::Pipeline;
pub use transform::Transformer;
