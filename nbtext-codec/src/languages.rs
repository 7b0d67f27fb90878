//! Language rule table
//!
//! Static, data-only description of how each supported language writes
//! comments and execution-environment directives. Everything the recognizer
//! and the encoder need to know about a language comes from here, so adding a
//! language is a matter of adding one row to [`LANGUAGES`].

use crate::error::{CodecError, Result};

/// Comment syntax and directive prefixes of one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageRules {
    /// Canonical language id (as found in kernelspec metadata)
    pub id: &'static str,
    /// File extensions without the leading dot. The first one is primary.
    pub extensions: &'static [&'static str],
    /// Line comment token, e.g. `#` or `//`
    pub line_comment: &'static str,
    /// Optional block comment delimiters
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Prefix used for markdown text in light scripts, when it differs from
    /// the line comment (knitr spin uses `#'`)
    pub markdown_comment: Option<&'static str>,
    /// Prefixes that introduce magic commands or shell escapes. Ordered
    /// longest first.
    pub magic_prefixes: &'static [&'static str],
}

/// All registered languages
pub const LANGUAGES: &[LanguageRules] = &[
    LanguageRules {
        id: "python",
        extensions: &["py"],
        line_comment: "#",
        block_comment: None,
        markdown_comment: None,
        magic_prefixes: &["%%", "%", "!"],
    },
    LanguageRules {
        id: "R",
        extensions: &["R", "r"],
        line_comment: "#",
        block_comment: None,
        markdown_comment: Some("#'"),
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "julia",
        extensions: &["jl"],
        line_comment: "#",
        block_comment: Some(("#=", "=#")),
        markdown_comment: None,
        magic_prefixes: &[";"],
    },
    LanguageRules {
        id: "bash",
        extensions: &["sh"],
        line_comment: "#",
        block_comment: None,
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "scala",
        extensions: &["scala"],
        line_comment: "//",
        block_comment: Some(("/*", "*/")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "rust",
        extensions: &["rs"],
        line_comment: "//",
        block_comment: Some(("/*", "*/")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "c++",
        extensions: &["cpp"],
        line_comment: "//",
        block_comment: Some(("/*", "*/")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "javascript",
        extensions: &["js"],
        line_comment: "//",
        block_comment: Some(("/*", "*/")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "typescript",
        extensions: &["ts"],
        line_comment: "//",
        block_comment: Some(("/*", "*/")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
    LanguageRules {
        id: "matlab",
        extensions: &["m"],
        line_comment: "%",
        block_comment: Some(("%{", "%}")),
        markdown_comment: None,
        magic_prefixes: &[],
    },
];

/// Look up the rules for a language id (case-insensitive)
pub fn rules_for(language: &str) -> Result<&'static LanguageRules> {
    LANGUAGES
        .iter()
        .find(|rules| rules.id.eq_ignore_ascii_case(language))
        .ok_or_else(|| CodecError::UnsupportedLanguage(language.to_string()))
}

/// Look up the language owning a script extension (leading dot optional)
///
/// Extensions are matched case-sensitively first so that `R` and `r` both
/// resolve, then case-insensitively.
pub fn rules_for_extension(extension: &str) -> Option<&'static LanguageRules> {
    let extension = extension.strip_prefix('.').unwrap_or(extension);
    LANGUAGES
        .iter()
        .find(|rules| rules.extensions.contains(&extension))
        .or_else(|| {
            LANGUAGES.iter().find(|rules| {
                rules
                    .extensions
                    .iter()
                    .any(|ext| ext.eq_ignore_ascii_case(extension))
            })
        })
}

impl LanguageRules {
    /// Primary file extension
    pub fn extension(&self) -> &'static str {
        self.extensions[0]
    }

    /// Prefix used for markdown text in light scripts
    pub fn markdown_prefix(&self) -> &'static str {
        self.markdown_comment.unwrap_or(self.line_comment)
    }

    /// Whether the language has any magic prefixes
    pub fn has_magics(&self) -> bool {
        !self.magic_prefixes.is_empty()
    }

    /// Whether `line` is a magic command: a magic prefix directly followed by
    /// an ASCII letter (`%time`, `%%bash`, `!ls`)
    pub fn is_magic(&self, line: &str) -> bool {
        self.magic_prefixes.iter().any(|prefix| {
            line.strip_prefix(prefix)
                .and_then(|rest| rest.chars().next())
                .is_some_and(|c| c.is_ascii_alphabetic())
        })
    }

    /// Whether `line` opens a block comment
    pub fn starts_block_comment(&self, line: &str) -> bool {
        self.block_comment
            .is_some_and(|(open, _)| line.starts_with(open))
    }

    /// Prefix `text` with a comment token, leaving a bare token for empty text
    pub fn comment_with(token: &str, text: &str) -> String {
        if text.is_empty() {
            token.to_string()
        } else {
            format!("{token} {text}")
        }
    }

    /// Strip a comment token written by [`LanguageRules::comment_with`].
    ///
    /// Lines that do not start with the token are returned unchanged.
    pub fn uncomment_with<'a>(token: &str, line: &'a str) -> &'a str {
        match line.strip_prefix(token) {
            Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
            None => line,
        }
    }
}
