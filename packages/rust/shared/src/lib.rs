//! Shared types, error model, and configuration for bandmeta.
//!
//! This crate is the foundation depended on by all other bandmeta crates.
//! It provides:
//! - [`BandMetaError`]: the unified error type
//! - Domain types ([`BandDescription`], [`Wiki`], [`Member`], [`Ref`])
//! - Configuration ([`AppConfig`], [`QueryConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, HttpConfig, MAX_PAGES, MAX_WORKERS, QueryConfig, Stages,
    config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{BandMetaError, Result};
pub use types::{BandDescription, Member, Ref, Wiki};
