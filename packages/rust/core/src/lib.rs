//! Query orchestration for bandmeta.
//!
//! This crate sequences the page readers and the similar-artists collector
//! into one fail-fast query (`query_band`).

pub mod pipeline;

pub use pipeline::{ProgressReporter, SilentProgress, query_band};
