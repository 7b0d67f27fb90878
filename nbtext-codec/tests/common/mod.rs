//! Shared helpers for the conversion tests

use nbtext_codec::{decode, encode, FormatDescriptor, Metadata, Notebook};
use pretty_assertions::assert_eq;
use serde_json::Value;

pub fn meta(value: Value) -> Metadata {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Decode canonical text and check that encoding gives it back unchanged
pub fn assert_text_round_trip(text: &str, descriptor: &FormatDescriptor) -> Notebook {
    let notebook = decode(text, descriptor).expect("Failed to decode");
    let output = encode(&notebook, descriptor).expect("Failed to encode");
    assert_eq!(output, text);
    notebook
}

/// Encode a notebook and check that decoding gives it back unchanged
pub fn assert_notebook_round_trip(notebook: &Notebook, descriptor: &FormatDescriptor) -> String {
    let text = encode(notebook, descriptor).expect("Failed to encode");
    let decoded = decode(&text, descriptor).expect("Failed to decode");
    assert_eq!(&decoded, notebook, "text was:\n{text}");
    text
}

/// Decoding re-encoded text gives the same notebook as decoding the input
pub fn assert_normalization_is_idempotent(text: &str, descriptor: &FormatDescriptor) {
    let first = decode(text, descriptor).expect("Failed to decode");
    let canonical = encode(&first, descriptor).expect("Failed to encode");
    let second = decode(&canonical, descriptor).expect("Failed to decode canonical text");
    assert_eq!(second, first, "canonical text was:\n{canonical}");
}
