//! Header codec
//!
//! The header is a YAML block between two `---` fences at the top of the
//! text, commented in script styles:
//!
//! ```text
//! # ---
//! # jupyter:
//! #   jupytext_format_version: '1.1'
//! #   kernelspec:
//! #     display_name: Python 3
//! #     language: python
//! #     name: python3
//! # ---
//! ```
//!
//! Notebook metadata lives under the `jupyter` key. Any other top-level
//! YAML (an R Markdown `title:` for instance) is not notebook metadata; it
//! is kept verbatim as [`Header::extra_lines`] and becomes a leading raw
//! cell, which the encoder folds back into the header.

use crate::error::{CodecError, Result};
use crate::format::{FormatDescriptor, Style};
use crate::languages::LanguageRules;
use crate::markers::{MarkerKind, Recognizer};
use crate::notebook::{FormatVersion, Metadata};
use log::debug;
use serde_json::Value;

/// Metadata key holding the text-format version
pub const FORMAT_VERSION_KEY: &str = "jupytext_format_version";

const JUPYTER_KEY: &str = "jupyter";

/// Keys written first, in this order
const CANONICAL_KEYS: &[&str] = &[FORMAT_VERSION_KEY, "kernelspec", "language_info"];

/// Decoded header content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    /// Notebook metadata (the `jupyter` mapping without the version)
    pub metadata: Metadata,
    pub version: Option<FormatVersion>,
    /// YAML lines outside the `jupyter` mapping, uncommented
    pub extra_lines: Vec<String>,
}

impl Header {
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty() && self.version.is_none() && self.extra_lines.is_empty()
    }
}

/// Render a header, or nothing when there is nothing to write
pub fn encode_header(header: &Header, descriptor: &FormatDescriptor) -> Result<Vec<String>> {
    let rules = descriptor.rules()?;
    let recognizer = Recognizer::new(descriptor, rules);

    let mut yaml_lines = header.extra_lines.clone();
    let jupyter = canonical_metadata(header);
    if !jupyter.is_empty() {
        let mut document = Metadata::new();
        document.insert(JUPYTER_KEY.to_string(), Value::Object(jupyter));
        let text = serde_yaml::to_string(&Value::Object(document))
            .map_err(|e| CodecError::MalformedHeader(format!("cannot render metadata: {e}")))?;
        yaml_lines.extend(text.lines().map(str::to_string));
    }
    if yaml_lines.is_empty() {
        return Ok(Vec::new());
    }

    let fence = recognizer.header_fence();
    let mut lines = Vec::with_capacity(yaml_lines.len() + 2);
    lines.push(fence.clone());
    lines.extend(yaml_lines.iter().map(|line| match recognizer.header_token() {
        Some(token) => LanguageRules::comment_with(token, line),
        None => line.clone(),
    }));
    lines.push(fence);
    Ok(lines)
}

/// Read a header off the top of `lines`.
///
/// Returns the header and the lines after it. Text without a complete
/// header yields an empty header and all of `lines`.
pub fn decode_header<'l, 's>(
    lines: &'l [&'s str],
    descriptor: &FormatDescriptor,
) -> Result<(Header, &'l [&'s str])> {
    let rules = descriptor.rules()?;
    let recognizer = Recognizer::new(descriptor, rules);

    let Some((yaml_lines, remaining)) = split_header(lines, &recognizer) else {
        debug!("no header found");
        return Ok((Header::default(), lines));
    };

    let (jupyter_lines, extra_lines) = partition_jupyter(&yaml_lines);
    let mut metadata = parse_jupyter(&jupyter_lines)?;
    let version = match metadata.shift_remove(FORMAT_VERSION_KEY) {
        Some(value) => Some(check_version(&value, descriptor.style)?),
        None => None,
    };
    debug!(
        "header: {} metadata keys, version {:?}, {} extra lines",
        metadata.len(),
        version,
        extra_lines.len()
    );

    let header = Header {
        metadata,
        version,
        extra_lines,
    };
    Ok((header, remaining))
}

fn split_header<'l, 's>(
    lines: &'l [&'s str],
    recognizer: &Recognizer,
) -> Option<(Vec<String>, &'l [&'s str])> {
    let first = lines.first()?;
    recognizer.classify_header_line(first, true)?;

    let mut yaml_lines = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(1) {
        if let Some(MarkerKind::HeaderEnd) = recognizer.classify_header_line(line, false) {
            return Some((yaml_lines, &lines[index + 1..]));
        }
        let yaml = match recognizer.header_token() {
            Some(token) if *line == token => "",
            Some(token) => line.strip_prefix(token)?.strip_prefix(' ')?,
            None => line,
        };
        yaml_lines.push(yaml.to_string());
    }
    None
}

/// Separate the `jupyter:` block from other top-level YAML
fn partition_jupyter(yaml_lines: &[String]) -> (Vec<String>, Vec<String>) {
    let mut jupyter = Vec::new();
    let mut extra = Vec::new();
    let mut in_jupyter = false;
    for line in yaml_lines {
        if line.starts_with("jupyter:") {
            in_jupyter = true;
        } else if in_jupyter && !line.is_empty() && !line.starts_with([' ', '\t']) {
            in_jupyter = false;
        }
        if in_jupyter {
            jupyter.push(line.clone());
        } else {
            extra.push(line.clone());
        }
    }
    (jupyter, extra)
}

fn parse_jupyter(jupyter_lines: &[String]) -> Result<Metadata> {
    if jupyter_lines.is_empty() {
        return Ok(Metadata::new());
    }
    let text = jupyter_lines.join("\n");
    let document: Value = serde_yaml::from_str(&text)
        .map_err(|e| CodecError::MalformedHeader(format!("invalid YAML: {e}")))?;
    let Value::Object(mut document) = document else {
        return Err(CodecError::MalformedHeader(
            "header is not a YAML mapping".to_string(),
        ));
    };
    match document.shift_remove(JUPYTER_KEY) {
        Some(Value::Object(metadata)) => Ok(metadata),
        Some(Value::Null) | None => Ok(Metadata::new()),
        Some(other) => Err(CodecError::MalformedHeader(format!(
            "'{JUPYTER_KEY}' must be a mapping, found {other}"
        ))),
    }
}

fn check_version(value: &Value, style: Style) -> Result<FormatVersion> {
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        other => {
            return Err(CodecError::MalformedHeader(format!(
                "format version must be a string, found {other}"
            )))
        }
    };
    let version: FormatVersion = text.parse().map_err(CodecError::MalformedHeader)?;
    let current = style.current_version();
    if version > current {
        return Err(CodecError::MalformedHeader(format!(
            "format version {version} is newer than the supported {style} version {current}"
        )));
    }
    Ok(version)
}

fn canonical_metadata(header: &Header) -> Metadata {
    let mut ordered = Metadata::new();
    if let Some(version) = header.version {
        ordered.insert(
            FORMAT_VERSION_KEY.to_string(),
            Value::String(version.to_string()),
        );
    }
    for key in CANONICAL_KEYS {
        if ordered.contains_key(*key) {
            continue;
        }
        if let Some(value) = header.metadata.get(*key) {
            ordered.insert(key.to_string(), value.clone());
        }
    }
    for (key, value) in &header.metadata {
        if !ordered.contains_key(key) {
            ordered.insert(key.clone(), value.clone());
        }
    }
    ordered
}
