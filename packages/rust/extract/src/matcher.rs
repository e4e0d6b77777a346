//! Ordered tag/attribute rule matching.
//!
//! Every extractor recognizes section boundaries and section-internal
//! markers through [`match_tag`] instead of building a tree.

use crate::tokens::Tag;

/// Accepted-values list that captures the raw attribute value.
pub const WILDCARD: &[&str] = &["*"];

/// One match rule; `key` identifies the rule to the caller.
#[derive(Debug, Clone, Copy)]
pub struct Rule<K> {
    pub key: K,
    pub tag: &'static str,
    pub attr: &'static str,
    pub values: &'static [&'static str],
}

impl<K> Rule<K> {
    /// Tag-name equality only; resolves to the tag name.
    pub const fn tag(key: K, tag: &'static str) -> Self {
        Self {
            key,
            tag,
            attr: "",
            values: &[],
        }
    }

    /// Attribute rule. With no `values` this is a presence check resolving
    /// to the attribute name; otherwise it resolves to the first accepted
    /// value contained in the attribute.
    pub const fn attr(
        key: K,
        tag: &'static str,
        attr: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self {
            key,
            tag,
            attr,
            values,
        }
    }

    /// Wildcard rule resolving to the raw attribute value.
    pub const fn capture(key: K, tag: &'static str, attr: &'static str) -> Self {
        Self::attr(key, tag, attr, WILDCARD)
    }
}

/// The first matching rule's key and resolved value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a, K> {
    pub key: K,
    pub value: &'a str,
}

/// Evaluate `rules` in order against `tag`; the first rule that matches wins.
///
/// An empty wildcard capture is not a match.
pub fn match_tag<'a, K: Copy>(tag: &'a Tag, rules: &[Rule<K>]) -> Option<Match<'a, K>> {
    rules.iter().find_map(|rule| {
        if rule.tag != tag.name {
            return None;
        }
        if rule.attr.is_empty() {
            return Some(Match {
                key: rule.key,
                value: rule.tag,
            });
        }

        tag.attrs
            .iter()
            .filter(|(key, _)| key == rule.attr)
            .find_map(|(_, actual)| {
                let value = match rule.values {
                    [] => rule.attr,
                    ["*"] if actual.is_empty() => return None,
                    ["*"] => actual.as_str(),
                    accepted => accepted.iter().copied().find(|v| actual.contains(v))?,
                };
                Some(Match {
                    key: rule.key,
                    value,
                })
            })
    })
}

/// True when `tag` is named `name`; used for section-closing tags.
pub fn is_tag(tag: &Tag, name: &'static str) -> bool {
    match_tag(tag, &[Rule::tag((), name)]).is_some()
}
