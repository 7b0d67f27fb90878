//! In-memory notebook model
//!
//! This is the structure handed to the codec by a notebook container reader
//! and returned to a writer. It only holds what the codec needs: cells with
//! their source lines and metadata, document metadata, and the opaque output
//! payloads that text formats do not persist.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Ordered string-keyed metadata. Insertion order is preserved and unknown
/// keys are carried through untouched.
pub type Metadata = Map<String, Value>;

/// A notebook: ordered cells plus document-level metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Cells in execution/display order
    pub cells: Vec<Cell>,
    /// Document metadata (kernelspec, language info, anything else)
    pub metadata: Metadata,
    /// Text-format version declared in (or to be written to) the header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_version: Option<FormatVersion>,
}

impl Notebook {
    pub fn new(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::default()
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Language id declared by the document metadata, if any.
    ///
    /// Looks at `kernelspec.language`, then `language_info.name`, then a
    /// top-level `language` key.
    pub fn language(&self) -> Option<&str> {
        self.metadata
            .get("kernelspec")
            .and_then(|spec| spec.get("language"))
            .and_then(Value::as_str)
            .or_else(|| {
                self.metadata
                    .get("language_info")
                    .and_then(|info| info.get("name"))
                    .and_then(Value::as_str)
            })
            .or_else(|| self.metadata.get("language").and_then(Value::as_str))
    }
}

/// Type of notebook cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Code,
    Markdown,
    Raw,
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Code => "code",
            Self::Markdown => "markdown",
            Self::Raw => "raw",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CellType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "code" => Ok(Self::Code),
            "markdown" | "md" => Ok(Self::Markdown),
            "raw" => Ok(Self::Raw),
            _ => Err(format!(
                "Unknown cell type '{s}'. Expected: code, markdown, raw"
            )),
        }
    }
}

/// A single notebook cell
///
/// Markdown and raw cells never carry outputs or an execution count; use the
/// typed constructors to build cells that respect this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    /// Source lines without line terminators
    pub source: Vec<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Opaque output payloads (code cells only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_count: Option<i64>,
}

impl Cell {
    pub fn new<I, S>(cell_type: CellType, source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cell_type,
            source: source.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn code<I, S>(source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CellType::Code, source)
    }

    pub fn markdown<I, S>(source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CellType::Markdown, source)
    }

    pub fn raw<I, S>(source: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(CellType::Raw, source)
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Source joined with newlines
    pub fn source_text(&self) -> String {
        self.source.join("\n")
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == CellType::Code
    }
}

/// Version of the text representation, written as `major.minor`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for FormatVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("version '{s}' is not of the form major.minor"))?;
        let major = major
            .parse()
            .map_err(|_| format!("invalid major version in '{s}'"))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("invalid minor version in '{s}'"))?;
        Ok(Self { major, minor })
    }
}
