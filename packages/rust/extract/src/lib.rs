//! Single-pass page extractors for artist catalogue pages.
//!
//! This crate provides:
//! - [`tokens`]: the forward-only markup event stream
//! - [`matcher`]: ordered tag/attribute rule matching
//! - [`PageExtractor`] and one extractor per page kind (overview, wiki,
//!   tags, similar artists, event years)
//! - [`RefFormat`]: the quoting template for hyperlinked biography text

pub mod events;
pub mod matcher;
pub mod overview;
pub mod ref_format;
pub mod similar;
pub mod tags;
pub mod tokens;
pub mod wiki;

use bandmeta_shared::Result;

pub use events::EventYearsExtractor;
pub use overview::OverviewExtractor;
pub use ref_format::RefFormat;
pub use similar::SimilarArtistsExtractor;
pub use tags::{TagsExtractor, TagsPage};
pub use tokens::{Event, Tag, TokenStream};
pub use wiki::WikiExtractor;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Converts the token stream of one fetched page into a typed result.
///
/// Extraction state lives only for the duration of one call; every call
/// returns a fresh value.
pub trait PageExtractor: Send + Sync {
    /// Typed partial result for one page.
    type Output: Send;

    /// Short page-kind name for tracing and error context.
    fn name(&self) -> &'static str;

    /// Consume `stream` in a single forward pass.
    fn extract(&self, stream: &mut TokenStream) -> Result<Self::Output>;
}
