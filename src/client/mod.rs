//! HTTP client for fetching source documents.
//!
//! This module provides the [`PageClient`], a thin wrapper around
//! `reqwest` with a fixed timeout and a bounded retry on transient failures.

mod page;

pub use page::PageClient;
