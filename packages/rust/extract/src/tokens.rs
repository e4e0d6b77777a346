//! Forward-only markup event stream built on html5ever's tokenizer.
//!
//! Only the tokenizer runs; no tree is built. Events are produced lazily in
//! document order and each extractor consumes them in a single pass.

use std::collections::VecDeque;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::states::RawKind;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tracing::trace;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// An opening or closing tag with its attributes in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Lowercased tag name.
    pub name: String,
    /// Attribute key/value pairs; closing tags carry none.
    pub attrs: Vec<(String, String)>,
    /// `<br/>`-style self-closing syntax.
    pub self_closing: bool,
}

/// A single markup event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Start(Tag),
    End(Tag),
    /// A maximal run of character data, entities already decoded.
    Text(String),
    /// The stream failed before a clean end-of-stream.
    Error(String),
}

// ---------------------------------------------------------------------------
// TokenStream
// ---------------------------------------------------------------------------

/// Bytes of source handed to the tokenizer per refill.
pub const CHUNK_SIZE: usize = 8 * 1024;

/// Lazy, forward-only sequence of [`Event`]s; `None` marks end-of-stream.
///
/// The source is fed to the tokenizer one chunk at a time, and only once
/// every event produced so far has been consumed. Markup after the point
/// where an extractor stops is never tokenized.
pub struct TokenStream {
    tokenizer: Tokenizer<EventSink>,
    input: BufferQueue,
    source: String,
    /// Byte offset of the first untokenized byte of `source`.
    fed: usize,
    ended: bool,
    /// Emitted once the valid prefix has been fully tokenized.
    trailing_error: Option<Event>,
}

impl TokenStream {
    /// Stream the events of an HTML document.
    pub fn from_html(html: &str) -> Self {
        Self::with_source(html.to_owned(), None)
    }

    /// Stream the events of a raw response body.
    ///
    /// Invalid UTF-8 ends the stream with an [`Event::Error`] after the
    /// events of the valid prefix.
    pub fn from_bytes(body: &[u8]) -> Self {
        match std::str::from_utf8(body) {
            Ok(html) => Self::from_html(html),
            Err(e) => {
                let valid = String::from_utf8_lossy(&body[..e.valid_up_to()]).into_owned();
                let error = Event::Error(format!("invalid UTF-8 at byte {}", e.valid_up_to()));
                Self::with_source(valid, Some(error))
            }
        }
    }

    fn with_source(source: String, trailing_error: Option<Event>) -> Self {
        Self {
            tokenizer: Tokenizer::new(EventSink::default(), TokenizerOpts::default()),
            input: BufferQueue::default(),
            source,
            fed: 0,
            ended: false,
            trailing_error,
        }
    }

    /// Source bytes not yet handed to the tokenizer.
    pub fn unread_bytes(&self) -> usize {
        self.source.len() - self.fed
    }

    /// Consume the next event only if it is text, returning that text.
    pub fn next_text(&mut self) -> Option<String> {
        self.fill();
        let events = &mut self.tokenizer.sink.events;
        match events.front() {
            Some(Event::Text(_)) => match events.pop_front() {
                Some(Event::Text(text)) => Some(text),
                _ => None,
            },
            _ => None,
        }
    }

    /// Feed chunks until an event is pending or the source is exhausted.
    fn fill(&mut self) {
        while self.tokenizer.sink.events.is_empty() && !self.ended {
            if self.fed < self.source.len() {
                let mut end = (self.fed + CHUNK_SIZE).min(self.source.len());
                while !self.source.is_char_boundary(end) {
                    end -= 1;
                }
                self.input
                    .push_back(StrTendril::from_slice(&self.source[self.fed..end]));
                self.fed = end;
                let _ = self.tokenizer.feed(&mut self.input);
            } else {
                self.tokenizer.end();
                self.ended = true;
                if let Some(error) = self.trailing_error.take() {
                    self.tokenizer.sink.events.push_back(error);
                }
            }
        }
    }
}

impl Iterator for TokenStream {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        self.fill();
        self.tokenizer.sink.events.pop_front()
    }
}

// ---------------------------------------------------------------------------
// Sink
// ---------------------------------------------------------------------------

#[derive(Default)]
struct EventSink {
    events: VecDeque<Event>,
    text: String,
}

impl EventSink {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.events.push_back(Event::Text(std::mem::take(&mut self.text)));
        }
    }
}

impl TokenSink for EventSink {
    type Handle = ();

    fn process_token(&mut self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chars) => self.text.push_str(&chars),
            Token::NullCharacterToken => {}
            Token::TagToken(raw) => {
                self.flush_text();

                let tag = Tag {
                    name: raw.name.to_string(),
                    attrs: raw
                        .attrs
                        .iter()
                        .map(|a| (a.name.local.to_string(), a.value.to_string()))
                        .collect(),
                    self_closing: raw.self_closing,
                };

                match raw.kind {
                    TagKind::StartTag => {
                        let switch = if tag.self_closing {
                            None
                        } else {
                            raw_text_mode(&tag.name)
                        };
                        self.events.push_back(Event::Start(tag));
                        if let Some(result) = switch {
                            return result;
                        }
                    }
                    TagKind::EndTag => self.events.push_back(Event::End(tag)),
                }
            }
            Token::ParseError(msg) => trace!(%msg, "recoverable markup error"),
            Token::CommentToken(_) | Token::DoctypeToken(_) | Token::EOFToken => {
                self.flush_text();
            }
        }
        TokenSinkResult::Continue
    }
}

/// Elements whose content is text rather than markup.
fn raw_text_mode(name: &str) -> Option<TokenSinkResult<()>> {
    match name {
        "title" | "textarea" => Some(TokenSinkResult::RawData(RawKind::Rcdata)),
        "script" => Some(TokenSinkResult::RawData(RawKind::ScriptData)),
        "style" | "xmp" | "iframe" | "noembed" | "noframes" | "noscript" => {
            Some(TokenSinkResult::RawData(RawKind::Rawtext))
        }
        "plaintext" => Some(TokenSinkResult::Plaintext),
        _ => None,
    }
}
