//! Page fetching and paginated collection for the catalogue site.
//!
//! This crate provides:
//! - [`CatalogClient`]: URL templates, one GET per page, status handling
//! - [`collector`]: sequential and worker-pool collection of listing pages

pub mod client;
pub mod collector;

pub use client::{CatalogClient, FetchedPage, PageKind};
pub use collector::{
    CollectOptions, PAGE_SIZE, collect_concurrent, collect_sequential, collect_similar_artists,
};
