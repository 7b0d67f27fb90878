//! Cell marker recognizer
//!
//! Classifies single lines of a text notebook as cell boundaries, magic
//! commands, blank lines or plain content, and produces the marker lines the
//! encoder writes. Both directions live here so the encoder can never write
//! a line the decoder would read differently.
//!
//! # Marker vocabulary
//!
//! | Style      | Cell start                          | Cell end              |
//! |------------|-------------------------------------|-----------------------|
//! | light      | `# +` `[meta]`                      | `# -`                 |
//! | percent    | `# %%` `[meta]`                     | next cell start       |
//! | markdown   | `` ```python `` / `<!-- #region -->` / `<!-- #raw -->` | `` ``` `` / `<!-- #endregion -->` / `<!-- #endraw -->` |
//! | rmarkdown  | `` ```{r label, opt=value} ``       | `` ``` ``             |
//!
//! (`#` stands for the language's line comment.)
//!
//! # Escaping
//!
//! In script styles a content line that looks like a marker is written with
//! one extra comment prefix (`# # +`). The set of escapable lines is closed
//! under that prefix, so a line that already looks escaped gets escaped
//! again and the decoder strips exactly one level. With magic commenting on,
//! the same applies to commented magics (`# %time`), which keeps them apart
//! from magics the encoder commented out.

use crate::cell_metadata::{format_inline, parse_inline};
use crate::format::{FormatDescriptor, MarkdownFlavor, Style};
use crate::knitr;
use crate::languages::{self, LanguageRules};
use crate::notebook::{CellType, Metadata};
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const FENCE: &str = "```";
const END_REGION: &str = "<!-- #endregion -->";
const END_RAW: &str = "<!-- #endraw -->";

static REGION_OPEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<!--\s*#(region|raw)(?:\s+(.*?))?\s*-->\s*$").expect("valid region regex")
});

/// The line that closes an explicit cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closer {
    /// Light `# -`
    EndMarker,
    /// Markdown `` ``` ``
    Fence,
    /// `<!-- #endregion -->`
    EndRegion,
    /// `<!-- #endraw -->`
    EndRaw,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkerKind {
    HeaderStart,
    HeaderEnd,
    CellStart {
        cell_type: CellType,
        metadata: Metadata,
        /// `None` for percent cells, which end at the next cell start
        closer: Option<Closer>,
    },
    CellEnd,
    /// A magic command inside a code cell. Content, never a boundary.
    Magic,
}

/// A recognized marker and the line it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct Marker<'a> {
    pub kind: MarkerKind,
    pub raw: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LineKind<'a> {
    Marker(Marker<'a>),
    Blank,
    Content,
}

/// What the scanner knows when it looks at a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanContext {
    /// Type of the cell being read, if any
    pub cell_type: Option<CellType>,
    /// Closer of the explicit cell being read, if any
    pub awaiting: Option<Closer>,
    /// Whether magics are commented in this scope
    pub comment_magics: bool,
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Resolve magic commenting for a document: document metadata
/// `jupytext.comment_magics`, then the descriptor, then the language default.
pub fn document_comment_magics(
    descriptor: &FormatDescriptor,
    rules: &LanguageRules,
    metadata: &Metadata,
) -> bool {
    metadata
        .get("jupytext")
        .and_then(|options| options.get("comment_magics"))
        .and_then(Value::as_bool)
        .or(descriptor.comment_magics)
        .unwrap_or_else(|| rules.has_magics())
}

/// Cell metadata `comment_magics` overrides the document setting
pub fn cell_comment_magics(document_default: bool, metadata: &Metadata) -> bool {
    metadata
        .get("comment_magics")
        .and_then(Value::as_bool)
        .unwrap_or(document_default)
}

/// Line classifier and marker writer for one conversion
#[derive(Debug, Clone)]
pub struct Recognizer {
    style: Style,
    rules: &'static LanguageRules,
    /// Language whose fences start code cells in markdown styles
    fence_rules: &'static LanguageRules,
    /// Comment prefix that escapes code lines
    code_escape: String,
    /// Comment prefix that escapes markdown and raw lines
    text_escape: String,
}

impl Recognizer {
    pub fn new(descriptor: &FormatDescriptor, rules: &'static LanguageRules) -> Self {
        let text_token = match descriptor.style {
            Style::Light => rules.markdown_prefix(),
            _ => rules.line_comment,
        };
        Self {
            style: descriptor.style,
            rules,
            fence_rules: rules,
            code_escape: format!("{} ", rules.line_comment),
            text_escape: format!("{text_token} "),
        }
    }

    /// Let the document's own language pick the code fences in markdown
    /// styles. Unregistered languages fall back to the descriptor's.
    pub fn with_document_language(mut self, language: Option<&str>) -> Self {
        if let (Style::Markdown(_), Some(language)) = (self.style, language) {
            match languages::rules_for(language) {
                Ok(rules) => self.fence_rules = rules,
                Err(_) => debug!(
                    "document language '{language}' is not registered, fences use '{}'",
                    self.fence_rules.id
                ),
            }
        }
        self
    }

    pub fn rules(&self) -> &'static LanguageRules {
        self.rules
    }

    /// Comment token of markdown and raw lines in script styles
    pub fn text_token(&self) -> &'static str {
        match self.style {
            Style::Light => self.rules.markdown_prefix(),
            _ => self.rules.line_comment,
        }
    }

    /// Comment token of header lines, `None` for markdown styles
    pub fn header_token(&self) -> Option<&'static str> {
        match self.style {
            Style::Light => Some(self.rules.markdown_prefix()),
            Style::Percent => Some(self.rules.line_comment),
            Style::Markdown(_) => None,
        }
    }

    /// The `---` fence line, commented in script styles
    pub fn header_fence(&self) -> String {
        match self.header_token() {
            Some(token) => format!("{token} ---"),
            None => "---".to_string(),
        }
    }

    /// Recognize the opening or closing header fence
    pub fn classify_header_line(&self, line: &str, opening: bool) -> Option<MarkerKind> {
        if line.trim_end() != self.header_fence() {
            return None;
        }
        Some(if opening {
            MarkerKind::HeaderStart
        } else {
            MarkerKind::HeaderEnd
        })
    }

    /// Classify one body line
    pub fn classify<'a>(&self, line: &'a str, context: &ScanContext) -> LineKind<'a> {
        if is_blank(line) {
            return LineKind::Blank;
        }
        let kind = match self.style {
            Style::Light | Style::Percent => self.classify_script(line, context),
            Style::Markdown(flavor) => self.classify_markdown(line, context, flavor),
        };
        match kind {
            Some(kind) => LineKind::Marker(Marker { kind, raw: line }),
            None => LineKind::Content,
        }
    }

    fn classify_script(&self, line: &str, context: &ScanContext) -> Option<MarkerKind> {
        if self.style == Style::Light && self.is_light_end(line) {
            return Some(MarkerKind::CellEnd);
        }
        if let Some(options) = self.cell_start_options(line) {
            let inline = parse_inline(options);
            let closer = (self.style == Style::Light).then_some(Closer::EndMarker);
            return Some(MarkerKind::CellStart {
                cell_type: inline.cell_type.unwrap_or_default(),
                metadata: inline.metadata,
                closer,
            });
        }
        let in_code = context.cell_type.map_or(true, |t| t == CellType::Code);
        if in_code
            && (self.rules.is_magic(line)
                || (context.comment_magics && self.is_commented_magic(line)))
        {
            return Some(MarkerKind::Magic);
        }
        None
    }

    fn classify_markdown(
        &self,
        line: &str,
        context: &ScanContext,
        flavor: MarkdownFlavor,
    ) -> Option<MarkerKind> {
        match context.awaiting {
            Some(Closer::Fence) => {
                if line.trim_end() == FENCE {
                    Some(MarkerKind::CellEnd)
                } else if self.fence_rules.is_magic(line) {
                    Some(MarkerKind::Magic)
                } else {
                    None
                }
            }
            Some(Closer::EndRegion) => {
                (line.trim() == END_REGION).then_some(MarkerKind::CellEnd)
            }
            Some(Closer::EndRaw) => (line.trim() == END_RAW).then_some(MarkerKind::CellEnd),
            Some(Closer::EndMarker) | None => self.markdown_cell_start(line, flavor),
        }
    }

    fn markdown_cell_start(&self, line: &str, flavor: MarkdownFlavor) -> Option<MarkerKind> {
        if let Some(captures) = REGION_OPEN.captures(line) {
            let (cell_type, closer) = match &captures[1] {
                "raw" => (CellType::Raw, Closer::EndRaw),
                _ => (CellType::Markdown, Closer::EndRegion),
            };
            let inline = parse_inline(captures.get(2).map_or("", |m| m.as_str()));
            return Some(MarkerKind::CellStart {
                cell_type,
                metadata: inline.metadata,
                closer: Some(closer),
            });
        }

        let metadata = match flavor {
            MarkdownFlavor::CommonMark => {
                let info = line.strip_prefix(FENCE)?;
                let language = info.split_whitespace().next()?;
                if !info.starts_with(language)
                    || !language.eq_ignore_ascii_case(self.fence_rules.id)
                {
                    return None;
                }
                parse_inline(&info[language.len()..]).metadata
            }
            MarkdownFlavor::RMarkdown => {
                let (engine, metadata) = knitr::parse_chunk_header(line)?;
                if !engine.eq_ignore_ascii_case(self.fence_rules.id) {
                    return None;
                }
                metadata
            }
        };
        Some(MarkerKind::CellStart {
            cell_type: CellType::Code,
            metadata,
            closer: Some(Closer::Fence),
        })
    }

    /// Text after a light `# +` or percent `# %%` marker
    fn cell_start_options<'a>(&self, line: &'a str) -> Option<&'a str> {
        let rest = line.strip_prefix(self.rules.line_comment)?;
        let rest = match self.style {
            Style::Light => rest.strip_prefix(" +")?,
            _ => {
                let rest = rest.strip_prefix(' ').unwrap_or(rest);
                rest.strip_prefix("%%")?
            }
        };
        match rest.chars().next() {
            None => Some(""),
            Some(c) if c.is_whitespace() => Some(rest.trim()),
            Some(_) => None,
        }
    }

    fn is_light_end(&self, line: &str) -> bool {
        line.trim_end()
            .strip_prefix(self.rules.line_comment)
            .is_some_and(|rest| rest == " -")
    }

    fn is_commented_magic(&self, line: &str) -> bool {
        line.strip_prefix(&self.code_escape)
            .is_some_and(|rest| self.rules.is_magic(rest))
    }

    /// Lines that carry structure in a script: cell markers and the header
    /// fence
    fn is_structural(&self, line: &str) -> bool {
        (self.style == Style::Light && self.is_light_end(line))
            || self.cell_start_options(line).is_some()
            || line.trim_end() == self.header_fence()
    }

    fn is_escapable(&self, line: &str, prefix: &str, comment_magics: bool) -> bool {
        self.is_structural(line)
            || (comment_magics && self.is_commented_magic(line))
            || line
                .strip_prefix(prefix)
                .is_some_and(|rest| self.is_escapable(rest, prefix, comment_magics))
    }

    /// A light-script line that reads as markdown text
    pub fn is_markdown_line(&self, line: &str, comment_magics: bool) -> bool {
        line.starts_with(self.rules.markdown_prefix())
            && !self.rules.starts_block_comment(line)
            && !(comment_magics && self.is_commented_magic(line))
    }

    /// Write one code line of a script
    pub fn encode_code_line(&self, line: &str, comment_magics: bool) -> String {
        if (comment_magics && self.rules.is_magic(line))
            || self.is_escapable(line, &self.code_escape, comment_magics)
        {
            format!("{}{line}", self.code_escape)
        } else {
            line.to_string()
        }
    }

    /// Read one code line of a script
    pub fn decode_code_line(&self, line: &str, comment_magics: bool) -> String {
        match line.strip_prefix(&self.code_escape) {
            Some(rest)
                if (comment_magics && self.rules.is_magic(rest))
                    || self.is_escapable(rest, &self.code_escape, comment_magics) =>
            {
                rest.to_string()
            }
            _ => line.to_string(),
        }
    }

    /// Write one markdown or raw line of a script as a comment
    pub fn encode_text_line(&self, line: &str, comment_magics: bool) -> String {
        let commented = LanguageRules::comment_with(self.text_token(), line);
        if self.is_escapable(&commented, &self.text_escape, comment_magics) {
            format!("{}{commented}", self.text_escape)
        } else {
            commented
        }
    }

    /// Read one commented markdown or raw line of a script
    pub fn decode_text_line(&self, line: &str, comment_magics: bool) -> String {
        let unescaped = match line.strip_prefix(&self.text_escape) {
            Some(rest) if self.is_escapable(rest, &self.text_escape, comment_magics) => rest,
            _ => line,
        };
        LanguageRules::uncomment_with(self.text_token(), unescaped).to_string()
    }

    /// Light `# + ...` line
    pub fn light_start(&self, cell_type: CellType, metadata: &Metadata) -> String {
        self.with_options(format!("{} +", self.rules.line_comment), cell_type, metadata)
    }

    /// Light `# -` line
    pub fn light_end(&self) -> String {
        format!("{} -", self.rules.line_comment)
    }

    /// Percent `# %% ...` line
    pub fn percent_start(&self, cell_type: CellType, metadata: &Metadata) -> String {
        self.with_options(format!("{} %%", self.rules.line_comment), cell_type, metadata)
    }

    fn with_options(&self, mut marker: String, cell_type: CellType, metadata: &Metadata) -> String {
        let cell_type = (cell_type != CellType::Code).then_some(cell_type);
        let options = format_inline(cell_type, metadata);
        if !options.is_empty() {
            marker.push(' ');
            marker.push_str(&options);
        }
        marker
    }

    /// Opening line of a markdown-style code cell
    pub fn fence_open(&self, metadata: &Metadata) -> String {
        match self.style {
            Style::Markdown(MarkdownFlavor::RMarkdown) => {
                knitr::format_chunk_header(&self.fence_rules.id.to_lowercase(), metadata)
            }
            _ => {
                let options = format_inline(None, metadata);
                if options.is_empty() {
                    format!("{FENCE}{}", self.fence_rules.id)
                } else {
                    format!("{FENCE}{} {options}", self.fence_rules.id)
                }
            }
        }
    }

    pub fn fence_close(&self) -> &'static str {
        FENCE
    }

    /// Opening line of a markdown-style region (`markdown` or `raw`)
    pub fn region_open(&self, cell_type: CellType, metadata: &Metadata) -> String {
        let keyword = match cell_type {
            CellType::Raw => "raw",
            _ => "region",
        };
        let options = format_inline(None, metadata);
        if options.is_empty() {
            format!("<!-- #{keyword} -->")
        } else {
            format!("<!-- #{keyword} {options} -->")
        }
    }

    pub fn region_close(&self, cell_type: CellType) -> &'static str {
        match cell_type {
            CellType::Raw => END_RAW,
            _ => END_REGION,
        }
    }

    /// Whether a bare markdown line would be read as a cell start
    pub fn starts_markdown_cell(&self, line: &str) -> bool {
        matches!(
            self.classify(line, &ScanContext::default()),
            LineKind::Marker(Marker {
                kind: MarkerKind::CellStart { .. },
                ..
            })
        )
    }
}
