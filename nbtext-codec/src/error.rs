//! Error types for codec operations

use thiserror::Error;

/// Errors that can occur while resolving a format, encoding or decoding.
///
/// Every variant is fatal for the conversion that raised it: the codec never
/// returns a partially decoded notebook or partially encoded text. Unknown
/// metadata keys and unrecognized inline metadata are not errors, they are
/// carried through opaquely.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The language id has no registered rule set
    #[error("Unsupported language '{0}'")]
    UnsupportedLanguage(String),

    /// A header block is present but its version or metadata cannot be used
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// The requested extension or style is not registered
    #[error("Format '{0}' not found")]
    UnknownFormat(String),
}

/// Result alias used throughout the codec
pub type Result<T> = std::result::Result<T, CodecError>;
