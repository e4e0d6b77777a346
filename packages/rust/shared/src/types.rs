//! Domain types for extracted artist metadata.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BandDescription
// ---------------------------------------------------------------------------

/// Aggregate result of a band query.
///
/// Every field is optional: a field stays `None` (and is omitted from the
/// JSON output) when its stage was not requested or the page did not carry it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandDescription {
    /// Display name from the overview page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band_name: Option<String>,
    /// Total scrobble count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scrobbles: Option<u64>,
    /// Total listener count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listeners: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub founded_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub born_in: Option<String>,
    /// Members, biography, and references from the wiki page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wiki: Option<Wiki>,
    /// Tags in document order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Similar artists, ordered by page then in-page order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar_artists: Option<Vec<String>>,
    /// Event years in site order.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "events_years")]
    pub event_years: Option<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Wiki
// ---------------------------------------------------------------------------

/// Structured content of a band's wiki page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wiki {
    /// Member roster in document order.
    pub members: Vec<Member>,
    /// Biography paragraphs.
    pub bio: Vec<String>,
    /// Hyperlinked references, one per unique display text.
    pub refs: Vec<Ref>,
}

impl Wiki {
    /// True when the page carried neither members, biography, nor references.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.bio.is_empty() && self.refs.is_empty()
    }
}

/// A band member from the wiki factbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub years_active: Option<String>,
}

impl Member {
    /// A member with no years-active range yet.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            years_active: None,
        }
    }
}

/// A hyperlink found in the biography text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Display text of the link.
    pub name: String,
    /// Link target, usually a site-relative path.
    pub reference: String,
}
