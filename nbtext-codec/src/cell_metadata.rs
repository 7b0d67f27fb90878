//! Inline cell metadata
//!
//! Cell markers carry their metadata on a single line, after the marker
//! itself:
//!
//! ```text
//! # %% Load data [markdown] tags=["setup"] collapsed=true
//! # + {"scrolled": true}
//! ```python slideshow={"slide_type":"fragment"}
//! ```
//!
//! The grammar is a whitespace separated token list:
//!
//! | Token                         | Meaning                                   |
//! |-------------------------------|-------------------------------------------|
//! | `[markdown]`, `[md]`, `[raw]` | cell type                                 |
//! | `key=<json>`                  | one metadata entry                        |
//! | `{...}`                       | JSON object merged into the metadata      |
//! | anything else                 | part of the free-form `title` string      |
//!
//! Parsing is total: values that are not valid JSON are kept as strings and
//! unrecognized words end up in the title, so nothing on a marker line is
//! ever rejected or dropped.

use crate::notebook::{CellType, Metadata};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

/// Metadata key holding free-form marker text
pub const TITLE_KEY: &str = "title";

static KEY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").expect("valid key regex"));

/// Result of parsing the metadata part of a marker line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineMetadata {
    pub cell_type: Option<CellType>,
    pub metadata: Metadata,
}

/// Whether `key` can be written as `key=value`
pub fn is_plain_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}

/// Parse the text following a marker
pub fn parse_inline(text: &str) -> InlineMetadata {
    let mut result = InlineMetadata::default();
    let mut title_words: Vec<&str> = Vec::new();

    for token in tokenize(text) {
        if result.cell_type.is_none() {
            if let Some(cell_type) = cell_type_token(token) {
                result.cell_type = Some(cell_type);
                continue;
            }
        }

        if token.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(token) {
                result.metadata.extend(map);
                continue;
            }
        }

        if let Some((key, value)) = token.split_once('=') {
            if is_plain_key(key) {
                result
                    .metadata
                    .insert(key.to_string(), parse_value(value));
                continue;
            }
        }

        title_words.push(token);
    }

    if !title_words.is_empty() {
        let words = title_words.join(" ");
        match result.metadata.get_mut(TITLE_KEY) {
            None => {
                result
                    .metadata
                    .insert(TITLE_KEY.to_string(), Value::String(words));
            }
            Some(Value::String(existing)) => {
                existing.push(' ');
                existing.push_str(&words);
            }
            Some(other) => {
                debug!("title words '{words}' conflict with non-string title {other}");
                result
                    .metadata
                    .insert(format!("{TITLE_KEY}_text"), Value::String(words));
            }
        }
    }

    result
}

/// Render a cell type and metadata as marker text (empty when there is
/// nothing to write). [`parse_inline`] reads the result back unchanged.
pub fn format_inline(cell_type: Option<CellType>, metadata: &Metadata) -> String {
    let mut tokens: Vec<String> = Vec::new();

    let bare_title = metadata
        .get(TITLE_KEY)
        .and_then(Value::as_str)
        .filter(|title| is_bare_title(title));
    if let Some(title) = bare_title {
        tokens.push(title.to_string());
    }

    match cell_type {
        Some(CellType::Markdown) => tokens.push("[markdown]".to_string()),
        Some(CellType::Raw) => tokens.push("[raw]".to_string()),
        Some(CellType::Code) | None => {}
    }

    let mut remainder = Metadata::new();
    for (key, value) in metadata {
        if key == TITLE_KEY && bare_title.is_some() {
            continue;
        }
        if is_plain_key(key) {
            tokens.push(format!("{key}={value}"));
        } else {
            remainder.insert(key.clone(), value.clone());
        }
    }
    if !remainder.is_empty() {
        tokens.push(Value::Object(remainder).to_string());
    }

    tokens.join(" ")
}

fn cell_type_token(token: &str) -> Option<CellType> {
    match token {
        "[markdown]" | "[md]" => Some(CellType::Markdown),
        "[raw]" => Some(CellType::Raw),
        "[code]" => Some(CellType::Code),
        _ => None,
    }
}

fn parse_value(value: &str) -> Value {
    serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

/// A title can be written as bare words when reading them back yields the
/// same string and none of them would be mistaken for another token.
fn is_bare_title(title: &str) -> bool {
    if title.is_empty() {
        return false;
    }
    let words: Vec<&str> = title.split(' ').collect();
    words.iter().all(|word| {
        !word.is_empty()
            && !word.contains(char::is_whitespace)
            && !word.contains('=')
            && !word.contains('"')
            && !word.starts_with('[')
            && !word.starts_with('{')
            && !word.contains(['[', ']', '{', '}'])
    }) && !title.contains("-->")
}

/// Split on whitespace, keeping JSON strings, arrays and objects intact.
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    let mut start: Option<usize> = None;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            c if c.is_whitespace() && depth == 0 => {
                if let Some(begin) = start.take() {
                    tokens.push(&text[begin..index]);
                }
                continue;
            }
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if start.is_none() {
            start = Some(index);
        }
    }

    if let Some(begin) = start {
        tokens.push(&text[begin..]);
    }
    tokens
}
