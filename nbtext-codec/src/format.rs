//! Format descriptor definition
//!
//! A [`FormatDescriptor`] is the resolved set of rules governing one
//! conversion: which language's comment syntax to use, which marker
//! vocabulary (the [`Style`]) and which optional behaviours are switched on.
//! The single encoder/decoder pair is parameterized by it, so per-format
//! behaviour stays data driven instead of living in one type per format.

use crate::error::Result;
use crate::languages::{self, LanguageRules};
use crate::notebook::FormatVersion;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Flavour of a markdown-based format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkdownFlavor {
    /// CommonMark: code cells are `` ```python `` fences
    CommonMark,
    /// R Markdown: code cells are `` ```{r label, opt=value} `` chunks
    RMarkdown,
}

/// Marker vocabulary of a text format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    /// Minimal markers: cells are separated by blank lines, markdown is
    /// commented text, `# +`/`# -` only where a cell needs them
    Light,
    /// Every cell opens with an explicit `# %%` marker
    Percent,
    /// Markdown document with fenced code cells
    Markdown(MarkdownFlavor),
}

impl Style {
    /// Version written to headers for this style
    pub fn current_version(&self) -> FormatVersion {
        match self {
            Style::Light | Style::Percent => FormatVersion::new(1, 1),
            Style::Markdown(_) => FormatVersion::new(1, 0),
        }
    }

    /// Whether cells are embedded in a source file of the language itself
    pub fn is_script(&self) -> bool {
        matches!(self, Style::Light | Style::Percent)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Style::Light => "light",
            Style::Percent => "percent",
            Style::Markdown(MarkdownFlavor::CommonMark) => "markdown",
            Style::Markdown(MarkdownFlavor::RMarkdown) => "rmarkdown",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Style::Light),
            "percent" => Ok(Style::Percent),
            "markdown" | "md" => Ok(Style::Markdown(MarkdownFlavor::CommonMark)),
            "rmarkdown" | "rmd" => Ok(Style::Markdown(MarkdownFlavor::RMarkdown)),
            _ => Err(format!(
                "Unknown style '{s}'. Expected: light, percent, markdown, rmarkdown"
            )),
        }
    }
}

/// The resolved rules for one conversion
///
/// Descriptors are plain values: build one (usually through
/// [`crate::format_descriptor_for`]), adjust it with the `with_*` methods,
/// and pass it by reference to [`crate::encode`] / [`crate::decode`]. The
/// language is validated when a conversion starts, not when the descriptor
/// is built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatDescriptor {
    /// Language id, see [`crate::languages`]
    pub language: String,
    /// File extension without the leading dot
    pub extension: String,
    pub style: Style,
    /// Write the format version into the header even when the notebook does
    /// not declare one
    pub insert_version: bool,
    /// Comment out magic commands in script styles. `None` means: on for
    /// languages that have magics.
    pub comment_magics: Option<bool>,
}

impl FormatDescriptor {
    pub fn new(language: impl Into<String>, style: Style) -> Self {
        let language = language.into();
        let extension = match style {
            Style::Markdown(MarkdownFlavor::CommonMark) => "md".to_string(),
            Style::Markdown(MarkdownFlavor::RMarkdown) => "Rmd".to_string(),
            Style::Light | Style::Percent => languages::rules_for(&language)
                .map(|rules| rules.extension().to_string())
                .unwrap_or_else(|_| language.clone()),
        };
        Self {
            language,
            extension,
            style,
            insert_version: false,
            comment_magics: None,
        }
    }

    /// Light script for a language
    pub fn light(language: impl Into<String>) -> Self {
        Self::new(language, Style::Light)
    }

    /// Percent script for a language
    pub fn percent(language: impl Into<String>) -> Self {
        Self::new(language, Style::Percent)
    }

    /// CommonMark document whose code fences carry `language`
    pub fn markdown(language: impl Into<String>) -> Self {
        Self::new(language, Style::Markdown(MarkdownFlavor::CommonMark))
    }

    /// R Markdown document whose chunks carry `language`
    pub fn rmarkdown(language: impl Into<String>) -> Self {
        Self::new(language, Style::Markdown(MarkdownFlavor::RMarkdown))
    }

    /// Replace the language, keeping style and options
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let rebuilt = Self::new(language, self.style);
        self.language = rebuilt.language;
        self.extension = rebuilt.extension;
        self
    }

    pub fn with_insert_version(mut self, insert_version: bool) -> Self {
        self.insert_version = insert_version;
        self
    }

    pub fn with_comment_magics(mut self, comment_magics: bool) -> Self {
        self.comment_magics = Some(comment_magics);
        self
    }

    /// Rules of the descriptor's language
    pub fn rules(&self) -> Result<&'static LanguageRules> {
        languages::rules_for(&self.language)
    }

    /// Registry-style name, e.g. `py:percent` or `Rmd`
    pub fn name(&self) -> String {
        match self.style {
            Style::Light | Style::Percent => format!("{}:{}", self.extension, self.style),
            Style::Markdown(_) => self.extension.clone(),
        }
    }
}
