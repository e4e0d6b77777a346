//! Tags page: the "big tags" list and the similar-artists sidebar.

use bandmeta_shared::{BandMetaError, Result};

use crate::PageExtractor;
use crate::matcher::{Rule, is_tag, match_tag};
use crate::tokens::{Event, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum List {
    Tags,
    Sidebar,
}

const LIST_RULES: &[Rule<List>] = &[
    Rule::attr(List::Tags, "ol", "class", &["big-tags"]),
    Rule::attr(List::Sidebar, "ol", "class", &["similar-items-sidebar"]),
];

const ITEM_LINK: &[Rule<()>] = &[Rule::attr((), "a", "class", &["link-block-target"])];

/// Number of distinct target lists on the page.
const TARGET_LISTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    InList(List),
}

/// Both lists recovered from one tags page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagsPage {
    pub tags: Vec<String>,
    /// Sidebar similar artists.
    pub similar: Vec<String>,
}

/// Extracts [`TagsPage`]; stops once both target lists have closed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TagsExtractor;

impl PageExtractor for TagsExtractor {
    type Output = TagsPage;

    fn name(&self) -> &'static str {
        "tags"
    }

    fn extract(&self, stream: &mut TokenStream) -> Result<TagsPage> {
        let mut page = TagsPage::default();
        let mut state = State::Idle;
        let mut remaining = TARGET_LISTS;

        while let Some(event) = stream.next() {
            match (state, event) {
                (_, Event::Error(msg)) => {
                    return Err(BandMetaError::parse(format!("tags: {msg}")));
                }
                (State::Idle, Event::Start(tag)) => {
                    if let Some(m) = match_tag(&tag, LIST_RULES) {
                        state = State::InList(m.key);
                    }
                }
                (State::InList(list), Event::Start(tag)) => {
                    if match_tag(&tag, ITEM_LINK).is_none() {
                        continue;
                    }
                    let Some(text) = stream.next_text() else {
                        continue;
                    };
                    let text = text.trim();
                    if text.is_empty() {
                        continue;
                    }
                    match list {
                        List::Tags => page.tags.push(text.to_string()),
                        List::Sidebar => page.similar.push(text.to_string()),
                    }
                }
                (State::InList(_), Event::End(tag)) if is_tag(&tag, "ol") => {
                    state = State::Idle;
                    remaining -= 1;
                    if remaining == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }

        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::CHUNK_SIZE;

    fn extract(html: &str) -> TagsPage {
        TagsExtractor
            .extract(&mut TokenStream::from_html(html))
            .expect("extract tags")
    }

    #[test]
    fn tags_fixture() {
        let html =
            std::fs::read_to_string("../../../fixtures/html/tags.html").expect("read fixture");
        let page = extract(&html);

        assert_eq!(page.tags, vec!["shoegaze", "dream pop", "ethereal"]);
        assert_eq!(page.similar, vec!["Chapterhouse", "Lush"]);
    }

    #[test]
    fn stops_after_both_lists_close() {
        let lists = r#"<ol class="similar-items-sidebar"><li><a class="link-block-target">Ride</a></li></ol><ol class="big-tags"><li><a class="link-block-target">noise pop</a></li></ol>"#;
        let trailer = r#"<ol class="big-tags"><li><a class="link-block-target">late</a></li></ol>"#;
        let html = format!("{lists}{}", trailer.repeat(CHUNK_SIZE / trailer.len() * 4));

        let mut stream = TokenStream::from_html(&html);
        let page = TagsExtractor.extract(&mut stream).expect("extract tags");
        assert_eq!(page.tags, vec!["noise pop"]);
        assert_eq!(page.similar, vec!["Ride"]);
        // Only the first chunk was ever tokenized.
        assert_eq!(stream.unread_bytes(), html.len() - CHUNK_SIZE);
    }

    #[test]
    fn early_stop_skips_trailing_utf8_error() {
        let mut body = String::from(
            r#"<ol class="similar-items-sidebar"><li><a class="link-block-target">Ride</a></li></ol><ol class="big-tags"><li><a class="link-block-target">noise pop</a></li></ol>"#,
        )
        .into_bytes();
        body.push(0xff);

        let page = TagsExtractor
            .extract(&mut TokenStream::from_bytes(&body))
            .expect("early termination skips the trailing error");
        assert_eq!(page.tags, vec!["noise pop"]);
    }

    #[test]
    fn links_outside_lists_are_ignored() {
        let page = extract(
            r#"<a class="link-block-target">stray</a>
               <ol class="big-tags"><li><a class="other">plain</a><a class="link-block-target">indie</a></li></ol>"#,
        );
        assert_eq!(page.tags, vec!["indie"]);
        assert!(page.similar.is_empty());
    }

    #[test]
    fn single_list_reads_to_end_of_stream() {
        let page = extract(r#"<ol class="big-tags"><li><a class="link-block-target">rock</a></li></ol>"#);
        assert_eq!(page.tags, vec!["rock"]);
        assert!(page.similar.is_empty());
    }

    #[test]
    fn error_before_lists_close_fails() {
        let mut body = br#"<ol class="big-tags"><li><a class="link-block-target">rock</a>"#.to_vec();
        body.push(0xff);
        let err = TagsExtractor
            .extract(&mut TokenStream::from_bytes(&body))
            .unwrap_err();
        assert!(matches!(err, BandMetaError::Parse { .. }));
    }
}
