//! Similar-artists listing page.

use bandmeta_shared::{BandMetaError, Result};

use crate::PageExtractor;
use crate::matcher::{Rule, is_tag, match_tag};
use crate::tokens::{Event, TokenStream};

const LIST: &[Rule<()>] = &[Rule::attr((), "ol", "class", &["similar-artists"])];

const ITEM_LINK: &[Rule<()>] = &[Rule::attr((), "a", "class", &["link-block-target"])];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InList,
}

/// Extracts the artist names of one listing page in document order.
///
/// Pagination overflow is detected by the caller from the served URL,
/// before the body is tokenized.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarArtistsExtractor;

impl PageExtractor for SimilarArtistsExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "similar-artists"
    }

    fn extract(&self, stream: &mut TokenStream) -> Result<Vec<String>> {
        let mut artists = Vec::new();
        let mut state = State::Idle;

        while let Some(event) = stream.next() {
            match (state, event) {
                (_, Event::Error(msg)) => {
                    return Err(BandMetaError::parse(format!("similar artists: {msg}")));
                }
                (State::Idle, Event::Start(tag)) if match_tag(&tag, LIST).is_some() => {
                    state = State::InList;
                }
                (State::InList, Event::Start(tag)) if match_tag(&tag, ITEM_LINK).is_some() => {
                    if let Some(name) = stream.next_text() {
                        let name = name.trim();
                        if !name.is_empty() {
                            artists.push(name.to_string());
                        }
                    }
                }
                (State::InList, Event::End(tag)) if is_tag(&tag, "ol") => break,
                _ => {}
            }
        }

        Ok(artists)
    }
}
