//! Token parser — finds `<include ... />` placeholders in rendered text.
//!
//! # Wire syntax
//!
//! ```text
//! <include [type=]name [wrap=target] [attr=value ...] />
//! ```
//!
//! | Tag                                   | kind       | name     |
//! |---------------------------------------|------------|----------|
//! | `<include articles />`                | `template` | articles |
//! | `<include page=home />`               | `page`     | home     |
//! | `<include type=wrap name=card />`     | `wrap`     | card     |
//! | `<include type=head name=title />`    | `head`     | title    |
//!
//! Every call re-parses from scratch: substitutions made since the previous
//! call may have revealed or removed tags.

use std::collections::{BTreeMap, BTreeSet};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Kind assigned when the first segment carries no `=`.
pub const DEFAULT_KIND: &str = "template";

static INCLUDE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<include(.*?)/>").expect("include tag pattern compiles"));

/// A parsed placeholder reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Declared view kind (`template`, `page`, `wrap`, `head`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    /// Wrap target, empty when the tag has none.
    pub wrap: String,
    pub attributes: BTreeMap<String, String>,
    /// The full tag text as it appears in the document.
    pub raw_match: String,
}

/// Normalise exclusion entries (trimmed, lowercased).
pub fn exclusion_set<I, S>(entries: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| e.as_ref().trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

/// Parse every placeholder in `document`, in document order, dropping those
/// whose kind or name is in `exclude`.
pub fn parse(document: &str, exclude: &BTreeSet<String>) -> Vec<Token> {
    let tokens = INCLUDE_TAG
        .captures_iter(document)
        .filter_map(|caps| {
            let raw = caps.get(0)?.as_str();
            let body = caps.get(1).map_or("", |m| m.as_str());
            decode(raw, body)
        })
        .collect();
    exclude_tokens(tokens, exclude)
}

/// Drop tokens by kind, then by name.
///
/// Both passes always run. The name pass is a no-op unless the exclusion set
/// mixes kinds and names; it is kept so `<include type=x name=head />` is
/// deferred the same way `<include type=head name=x />` is.
pub fn exclude_tokens(tokens: Vec<Token>, exclude: &BTreeSet<String>) -> Vec<Token> {
    if exclude.is_empty() {
        return tokens;
    }
    tokens
        .into_iter()
        .filter(|t| !exclude.contains(&t.kind))
        .filter(|t| !exclude.contains(&t.name))
        .collect()
}

fn decode(raw: &str, body: &str) -> Option<Token> {
    let mut segments = body.split_whitespace();
    let first = segments.next()?;

    let mut token = Token {
        kind: String::new(),
        name: String::new(),
        wrap: String::new(),
        attributes: BTreeMap::new(),
        raw_match: raw.to_string(),
    };

    // `type=x` declares the kind only; the name follows as `name=y`.
    let mut name_follows = false;
    match first.split_once('=') {
        None => {
            token.kind = DEFAULT_KIND.to_string();
            token.name = first.trim().to_lowercase();
        }
        Some((key, value)) => {
            let key = key.trim().to_lowercase();
            if key == "type" {
                token.kind = value.trim().to_lowercase();
                name_follows = true;
            } else {
                token.kind = key;
                token.name = value.trim().to_lowercase();
            }
        }
    }

    for segment in segments {
        match segment.split_once('=') {
            Some(("wrap", value)) => token.wrap = value.to_string(),
            Some(("name", value)) if name_follows && token.name.is_empty() => {
                token.name = value.trim().to_lowercase();
            }
            Some((key, value)) => {
                token.attributes.insert(key.to_string(), value.to_string());
            }
            None => {
                token.attributes.insert(segment.to_string(), String::new());
            }
        }
    }

    Some(token)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
