//! R Markdown chunk headers
//!
//! R Markdown code cells open with `` ```{engine label, option=value} ``.
//! Options use R syntax, so they are converted to and from JSON values:
//!
//! | R                   | JSON              |
//! |---------------------|-------------------|
//! | `TRUE` / `FALSE`    | `true` / `false`  |
//! | `NULL`              | `null`            |
//! | `4`, `0.5`          | numbers           |
//! | `"text"`, `'text'`  | strings           |
//! | `c(1, "a")`         | arrays            |
//!
//! Any other expression (`fig.cap=paste("a")`) is stored as a string tagged
//! with [`R_CODE_PREFIX`] and written back unquoted. A bare option after the
//! label (`{r a, cache}`) is the tag alone. Options that have no R spelling
//! (keys R cannot name, JSON objects, strings with control characters) travel
//! together as one quoted JSON object under [`OPAQUE_KEY`].

use crate::cell_metadata::is_plain_key;
use crate::notebook::Metadata;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

/// Metadata key holding the chunk label
pub const NAME_KEY: &str = "name";

/// Marks a metadata string as an R expression
pub const R_CODE_PREFIX: &str = "#R_CODE#";

/// Chunk option carrying metadata with no R spelling
pub const OPAQUE_KEY: &str = "jupyter_meta";

static CHUNK_HEADER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```\{\s*([A-Za-z0-9_+\-]+)(.*)\}\s*$").expect("valid chunk header regex")
});
static CHUNK_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("valid chunk label regex"));

/// Parse `` ```{engine ...} `` into the engine name and chunk metadata
pub fn parse_chunk_header(line: &str) -> Option<(&str, Metadata)> {
    let captures = CHUNK_HEADER.captures(line)?;
    let engine = captures.get(1)?.as_str();
    let options = captures.get(2).map_or("", |m| m.as_str()).trim();
    // `{r, opt}` has no label
    let (options, labelled) = match options.strip_prefix(',') {
        Some(rest) => (rest, false),
        None => (options, true),
    };

    let mut metadata = Metadata::new();
    for (index, option) in split_top_level(options).into_iter().enumerate() {
        let option = option.trim();
        if option.is_empty() {
            continue;
        }
        match option.split_once('=') {
            Some((key, value)) if key.trim() == OPAQUE_KEY => match parse_opaque(value.trim()) {
                Some(entries) => metadata.extend(entries),
                None => {
                    metadata.insert(OPAQUE_KEY.to_string(), r_to_json(value.trim()));
                }
            },
            Some((key, value)) if is_plain_key(key.trim()) => {
                metadata.insert(key.trim().to_string(), r_to_json(value.trim()));
            }
            _ if index == 0 && labelled => {
                metadata.insert(NAME_KEY.to_string(), Value::String(option.to_string()));
            }
            _ => {
                metadata.insert(option.to_string(), Value::String(R_CODE_PREFIX.to_string()));
            }
        }
    }
    Some((engine, metadata))
}

/// Write a chunk header
pub fn format_chunk_header(engine: &str, metadata: &Metadata) -> String {
    let mut options: Vec<String> = Vec::new();

    let label = metadata
        .get(NAME_KEY)
        .and_then(Value::as_str)
        .filter(|name| CHUNK_LABEL.is_match(name));
    if let Some(label) = label {
        options.push(label.to_string());
    }

    let mut opaque = Metadata::new();
    let mut bare_first = false;
    for (key, value) in metadata {
        if key == NAME_KEY && label.is_some() {
            continue;
        }
        if key == OPAQUE_KEY || !is_plain_key(key) {
            opaque.insert(key.clone(), value.clone());
        } else if value.as_str() == Some(R_CODE_PREFIX) {
            bare_first |= options.is_empty();
            options.push(key.clone());
        } else if !has_r_form(value) {
            opaque.insert(key.clone(), value.clone());
        } else {
            options.push(format!("{key}={}", json_to_r(value)));
        }
    }
    if !opaque.is_empty() {
        debug!("carrying {} chunk options as JSON", opaque.len());
        options.push(format!("{OPAQUE_KEY}={}", quote(&Value::Object(opaque).to_string())));
    }

    match (options.is_empty(), bare_first) {
        (true, _) => format!("```{{{engine}}}"),
        (false, true) => format!("```{{{engine}, {}}}", options.join(", ")),
        (false, false) => format!("```{{{engine} {}}}", options.join(", ")),
    }
}

fn parse_opaque(value: &str) -> Option<Metadata> {
    serde_json::from_str(&unquote(value)?).ok()
}

/// Whether `json_to_r` output parses back to the same value
fn has_r_form(value: &Value) -> bool {
    match value {
        Value::Object(_) => false,
        Value::String(text) if text.chars().any(char::is_control) => false,
        Value::String(text) => match text.strip_prefix(R_CODE_PREFIX) {
            Some(code) => {
                code.trim() == code
                    && is_balanced(code)
                    && split_top_level(code).len() == 1
                    && r_to_json(code) == *value
            }
            None => true,
        },
        Value::Array(items) => items.iter().all(has_r_form),
        Value::Number(number) => r_to_json(&number.to_string()) == *value,
        Value::Bool(_) | Value::Null => true,
    }
}

fn r_to_json(value: &str) -> Value {
    match value {
        "TRUE" | "T" => return Value::Bool(true),
        "FALSE" | "F" => return Value::Bool(false),
        "NULL" => return Value::Null,
        _ => {}
    }
    if let Ok(int) = value.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    if let Some(text) = unquote(value) {
        return Value::String(text);
    }
    if let Some(inner) = value.strip_prefix("c(").and_then(|v| v.strip_suffix(')')) {
        return Value::Array(
            split_top_level(inner)
                .into_iter()
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(r_to_json)
                .collect(),
        );
    }
    Value::String(format!("{R_CODE_PREFIX}{value}"))
}

fn json_to_r(value: &Value) -> String {
    match value {
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        Value::Null => "NULL".to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => match text.strip_prefix(R_CODE_PREFIX) {
            Some(code) => code.to_string(),
            None => quote(text),
        },
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(json_to_r).collect();
            format!("c({})", items.join(", "))
        }
        Value::Object(_) => quote(&value.to_string()),
    }
}

fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

fn unquote(value: &str) -> Option<String> {
    if value.len() < 2 {
        return None;
    }
    let quote = value.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let inner = value.strip_prefix(quote)?.strip_suffix(quote)?;

    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(escaped) => text.push(escaped),
                None => text.push('\\'),
            }
        } else if ch == quote {
            // an unescaped quote means this is an expression like "a" + "b"
            return None;
        } else {
            text.push(ch);
        }
    }
    Some(text)
}

/// Quotes and brackets all close, so the text cannot swallow later options
fn is_balanced(text: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in text.chars() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => match depth.checked_sub(1) {
                Some(outer) => depth = outer,
                None => return false,
            },
            _ => {}
        }
    }
    quote.is_none() && depth == 0
}

/// Split on commas outside quotes and parentheses
fn split_top_level(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == open {
                quote = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&text[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    if start < text.len() || !parts.is_empty() {
        parts.push(&text[start..]);
    }
    parts
}
