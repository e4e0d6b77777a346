//! Wiki page: member roster from the factbox and the biography with its
//! hyperlinked references.
//!
//! Both sections are recognized in one pass and either may be missing.

use std::collections::HashSet;

use bandmeta_shared::{BandMetaError, Member, Ref, Result, Wiki};

use crate::PageExtractor;
use crate::matcher::{Rule, is_tag, match_tag};
use crate::ref_format::RefFormat;
use crate::tokens::{Event, Tag, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Factbox,
    Content,
    Heading,
}

const SECTION_RULES: &[Rule<Marker>] = &[
    Rule::attr(Marker::Factbox, "ul", "class", &["factbox"]),
    Rule::attr(Marker::Content, "div", "class", &["wiki-content"]),
    Rule::attr(Marker::Heading, "h4", "class", &["factbox-heading"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BioMarker {
    Paragraph,
    Block,
    LineBreak,
    Anchor,
}

const BIO_RULES: &[Rule<BioMarker>] = &[
    Rule::tag(BioMarker::Paragraph, "p"),
    Rule::tag(BioMarker::Block, "div"),
    Rule::tag(BioMarker::LineBreak, "br"),
    Rule::tag(BioMarker::Anchor, "a"),
];

const HREF: &[Rule<()>] = &[Rule::capture((), "a", "href")];

/// Heading text that opens the member roster.
const MEMBERS_HEADING: &str = "Members";

/// Active section; `lists` and `blocks` count open `<ul>` / `<div>`
/// elements so each section ends at its own closing tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Idle,
    Factbox { lists: usize },
    Members { lists: usize },
    Bio { blocks: usize },
}

/// Extracts a [`Wiki`] from the artist wiki page.
#[derive(Debug, Clone, Default)]
pub struct WikiExtractor {
    ref_format: RefFormat,
}

impl WikiExtractor {
    /// Hyperlinked biography text is rendered through `ref_format`.
    pub fn new(ref_format: RefFormat) -> Self {
        Self { ref_format }
    }
}

impl PageExtractor for WikiExtractor {
    type Output = Wiki;

    fn name(&self) -> &'static str {
        "wiki"
    }

    fn extract(&self, stream: &mut TokenStream) -> Result<Wiki> {
        let mut wiki = Wiki::default();
        let mut bio = BioBuffer::default();
        let mut section = Section::Idle;

        while let Some(event) = stream.next() {
            section = match (section, event) {
                (_, Event::Error(msg)) => {
                    return Err(BandMetaError::parse(format!("wiki: {msg}")));
                }

                (Section::Idle, Event::Start(tag)) => {
                    match match_tag(&tag, SECTION_RULES).map(|m| m.key) {
                        Some(Marker::Factbox) => Section::Factbox { lists: 1 },
                        Some(Marker::Content) => Section::Bio { blocks: 1 },
                        _ => Section::Idle,
                    }
                }

                (Section::Factbox { lists }, Event::Start(tag)) => {
                    if is_tag(&tag, "ul") {
                        Section::Factbox { lists: lists + 1 }
                    } else if match_tag(&tag, SECTION_RULES).map(|m| m.key)
                        == Some(Marker::Heading)
                        && stream.next_text().as_deref().map(str::trim) == Some(MEMBERS_HEADING)
                    {
                        Section::Members { lists }
                    } else {
                        section
                    }
                }
                (Section::Factbox { lists }, Event::End(tag)) if is_tag(&tag, "ul") => {
                    close_list(lists)
                }

                (Section::Members { lists }, Event::Start(tag)) if is_tag(&tag, "ul") => {
                    Section::Members { lists: lists + 1 }
                }
                (Section::Members { lists }, Event::End(tag)) if is_tag(&tag, "ul") => {
                    close_list(lists)
                }
                (Section::Members { .. }, Event::Text(text)) => {
                    push_member_fragment(&mut wiki.members, text.trim());
                    section
                }

                (Section::Bio { blocks }, Event::Start(tag)) => {
                    bio.open(&tag);
                    match match_tag(&tag, BIO_RULES).map(|m| m.key) {
                        Some(BioMarker::Block) => Section::Bio { blocks: blocks + 1 },
                        _ => section,
                    }
                }
                (Section::Bio { blocks }, Event::End(tag)) => {
                    match match_tag(&tag, BIO_RULES).map(|m| m.key) {
                        Some(BioMarker::Block) if blocks == 1 => {
                            bio.flush(&mut wiki.bio);
                            Section::Idle
                        }
                        Some(BioMarker::Block) => Section::Bio { blocks: blocks - 1 },
                        Some(BioMarker::Paragraph) => {
                            bio.flush(&mut wiki.bio);
                            section
                        }
                        Some(BioMarker::LineBreak) => {
                            bio.line_break = true;
                            section
                        }
                        _ => section,
                    }
                }
                (Section::Bio { .. }, Event::Text(text)) => {
                    bio.push_text(text, &self.ref_format, &mut wiki.refs);
                    section
                }

                (current, _) => current,
            };
        }

        Ok(wiki)
    }
}

/// One `</ul>` closed; the factbox ends when its outermost list does.
fn close_list(lists: usize) -> Section {
    match lists {
        0 | 1 => Section::Idle,
        n => Section::Factbox { lists: n - 1 },
    }
}

/// A non-empty fragment is a new member, unless it is a parenthesized
/// range that belongs to the member before it.
fn push_member_fragment(members: &mut Vec<Member>, fragment: &str) {
    if fragment.is_empty() {
        return;
    }
    if fragment.starts_with('(') {
        if let Some(last) = members.last_mut() {
            last.years_active = Some(fragment.to_string());
        }
        return;
    }
    members.push(Member::named(fragment));
}

// ---------------------------------------------------------------------------
// Biography accumulator
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct BioBuffer {
    /// Text fragments of the paragraph in progress.
    fragments: Vec<String>,
    /// A `<br>` was seen since the last fragment.
    line_break: bool,
    /// The next fragment is link text.
    quoted: bool,
    /// Target of the link in progress.
    href: Option<String>,
    /// Display texts already recorded as references.
    seen: HashSet<String>,
}

impl BioBuffer {
    fn open(&mut self, tag: &Tag) {
        match match_tag(tag, BIO_RULES).map(|m| m.key) {
            Some(BioMarker::LineBreak) => self.line_break = true,
            Some(BioMarker::Anchor) => {
                self.quoted = true;
                self.href = match_tag(tag, HREF)
                    .map(|m| m.value.to_string())
                    .filter(|href| !href.is_empty());
            }
            _ => {}
        }
    }

    fn push_text(&mut self, text: String, format: &RefFormat, refs: &mut Vec<Ref>) {
        if text.is_empty() {
            return;
        }

        if let Some(reference) = self.href.take() {
            if self.seen.insert(text.clone()) {
                refs.push(Ref {
                    name: text.clone(),
                    reference,
                });
            }
        }

        if self.line_break {
            if let Some(previous) = self.fragments.last_mut() {
                previous.push('\n');
            }
        }

        let fragment = if self.quoted {
            format.apply(&text)
        } else {
            text
        };
        self.fragments.push(fragment);
        self.line_break = false;
        self.quoted = false;
    }

    /// Close the paragraph in progress; line breaks split it further.
    fn flush(&mut self, bio: &mut Vec<String>) {
        if self.fragments.is_empty() {
            return;
        }
        let joined = self.fragments.concat();
        self.fragments.clear();

        bio.extend(
            joined
                .split('\n')
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
}
