//! Printf-style template applied to hyperlinked biography text.
//!
//! Supported verbs: `%q` (double-quoted, escaped), `%s` and `%v` (verbatim),
//! `%%` (a literal percent sign). Unknown verbs are kept as literal text.

use bandmeta_shared::{BandMetaError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(String),
    Quoted,
    Verbatim,
}

/// A parsed quoting template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefFormat {
    pieces: Vec<Piece>,
}

impl RefFormat {
    /// Parse `template`; it must contain at least one text placeholder.
    pub fn parse(template: &str) -> Result<Self> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let verb = match chars.next() {
                Some('q') => Piece::Quoted,
                Some('s' | 'v') => Piece::Verbatim,
                Some('%') => {
                    literal.push('%');
                    continue;
                }
                Some(other) => {
                    literal.push('%');
                    literal.push(other);
                    continue;
                }
                None => {
                    literal.push('%');
                    continue;
                }
            };
            if !literal.is_empty() {
                pieces.push(Piece::Literal(std::mem::take(&mut literal)));
            }
            pieces.push(verb);
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        if pieces.iter().all(|p| matches!(p, Piece::Literal(_))) {
            return Err(BandMetaError::validation(format!(
                "wiki reference format {template:?} has no %q, %s or %v placeholder"
            )));
        }

        Ok(Self { pieces })
    }

    /// Render `text` through the template.
    pub fn apply(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 2);
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Quoted => out.push_str(&format!("{text:?}")),
                Piece::Verbatim => out.push_str(text),
            }
        }
        out
    }
}

impl Default for RefFormat {
    fn default() -> Self {
        Self {
            pieces: vec![Piece::Quoted],
        }
    }
}
