//! Overview page: band name, listener/scrobble statistics, and the
//! catalogue metadata list (years active, founded in, born, born in).

use bandmeta_shared::{BandDescription, BandMetaError, Result};

use crate::PageExtractor;
use crate::matcher::{Rule, is_tag, match_tag};
use crate::tokens::{Event, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Metadata,
    Title,
    Stat,
    StatLabel,
}

const IDLE_RULES: &[Rule<Marker>] = &[
    Rule::attr(Marker::Metadata, "dl", "class", &["catalogue-metadata"]),
    Rule::attr(Marker::Title, "h1", "class", &["header-new-title"]),
    Rule::capture(Marker::Stat, "abbr", "title"),
    Rule::attr(Marker::StatLabel, "h4", "class", &["header-metadata-tnew-title"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Term,
    Description,
}

const METADATA_RULES: &[Rule<Entry>] = &[
    Rule::tag(Entry::Term, "dt"),
    Rule::tag(Entry::Description, "dd"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InMetadataBlock,
}

/// Extracts the seed [`BandDescription`] from the artist overview page.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewExtractor;

impl PageExtractor for OverviewExtractor {
    type Output = BandDescription;

    fn name(&self) -> &'static str {
        "overview"
    }

    fn extract(&self, stream: &mut TokenStream) -> Result<BandDescription> {
        let mut desc = BandDescription::default();
        let mut state = State::Idle;
        let mut term: Option<String> = None;
        let mut stat_label: Option<String> = None;

        while let Some(event) = stream.next() {
            match (state, event) {
                (_, Event::Error(msg)) => {
                    return Err(BandMetaError::parse(format!("overview: {msg}")));
                }
                (State::InMetadataBlock, Event::End(tag)) if is_tag(&tag, "dl") => {
                    state = State::Idle;
                }
                (State::InMetadataBlock, Event::Start(tag)) => {
                    match match_tag(&tag, METADATA_RULES).map(|m| m.key) {
                        Some(Entry::Term) => {
                            if let Some(text) = stream.next_text() {
                                term = Some(text.trim().to_string());
                            }
                        }
                        Some(Entry::Description) => {
                            if let Some(text) = stream.next_text() {
                                route_metadata(&mut desc, term.as_deref(), text.trim());
                            }
                        }
                        None => {}
                    }
                }
                (State::Idle, Event::Start(tag)) => {
                    let Some(m) = match_tag(&tag, IDLE_RULES) else {
                        continue;
                    };
                    match m.key {
                        Marker::Metadata => state = State::InMetadataBlock,
                        Marker::Title => {
                            if let Some(text) = stream.next_text() {
                                let name = text.trim();
                                if !name.is_empty() {
                                    desc.band_name = Some(name.to_string());
                                }
                            }
                        }
                        Marker::StatLabel => {
                            stat_label = stream.next_text().map(|t| t.trim().to_string());
                        }
                        Marker::Stat => match stat_label.take().as_deref() {
                            Some("Scrobbles") => desc.scrobbles = Some(parse_count(m.value)),
                            Some("Listeners") => desc.listeners = Some(parse_count(m.value)),
                            _ => {}
                        },
                    }
                }
                _ => {}
            }
        }

        Ok(desc)
    }
}

/// Store a `<dd>` value under the field named by the preceding `<dt>`.
fn route_metadata(desc: &mut BandDescription, term: Option<&str>, value: &str) {
    let slot = match term {
        Some("Years Active") => &mut desc.years_active,
        Some("Founded In") => &mut desc.founded_in,
        Some("Born") => &mut desc.born,
        Some("Born In") => &mut desc.born_in,
        _ => return,
    };
    *slot = Some(value.to_string());
}

/// Parse a grouped integer such as `1,234,567`; anything unparseable is 0.
pub fn parse_count(raw: &str) -> u64 {
    raw.chars()
        .filter(|c| !matches!(c, ',' | '_') && !c.is_whitespace())
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}
