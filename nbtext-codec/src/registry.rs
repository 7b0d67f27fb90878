//! Format registry for format discovery and selection
//!
//! Every built-in format is registered under its canonical name
//! (`py:light`, `jl:percent`, `md`, `Rmd`) and under short aliases (`py`,
//! `markdown`, `rmarkdown`). Lookups go through [`FormatRegistry::resolve`],
//! which also understands language ids and `:style` suffixes:
//!
//! ```text
//! py            -> py:light
//! .jl:percent   -> jl:percent
//! python        -> py:light
//! julia:percent -> jl:percent
//! md            -> md (python fences)
//! ```

use crate::error::{CodecError, Result};
use crate::format::{FormatDescriptor, Style};
use crate::languages::{self, LANGUAGES};
use std::collections::HashMap;

/// Registry of text formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// let descriptor = registry.resolve("py:percent")?;
/// let notebook = nbtext_codec::decode(text, &descriptor)?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, FormatDescriptor>,
    aliases: HashMap<String, String>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Register a format under its canonical name
    ///
    /// If a format with the same name already exists, it will be replaced.
    pub fn register(&mut self, descriptor: FormatDescriptor) {
        self.formats.insert(descriptor.name(), descriptor);
    }

    /// Make `alias` resolve to the registered format `name`
    pub fn register_alias(&mut self, alias: &str, name: &str) {
        self.aliases.insert(alias.to_string(), name.to_string());
    }

    /// Get a format by name or alias
    pub fn get(&self, name: &str) -> Result<&FormatDescriptor> {
        self.lookup(name)
            .ok_or_else(|| CodecError::UnknownFormat(name.to_string()))
    }

    /// Check if a format or alias exists
    pub fn has(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// List all canonical format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension
    ///
    /// Returns the canonical format name if a matching extension is found,
    /// or None otherwise.
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;
        self.lookup(extension).map(FormatDescriptor::name)
    }

    /// Resolve `<extension-or-language>[:<style>]` to a descriptor
    ///
    /// An unknown dotted extension or style is an `UnknownFormat` error; an
    /// unknown bare word is taken as a language id and reported as
    /// `UnsupportedLanguage`.
    pub fn resolve(&self, name: &str) -> Result<FormatDescriptor> {
        let (head, style) = match name.split_once(':') {
            Some((head, style)) => (head, Some(style)),
            None => (name, None),
        };
        let dotted = head.starts_with('.');
        let key = head.trim_start_matches('.');
        if key.is_empty() {
            return Err(CodecError::UnknownFormat(name.to_string()));
        }

        let base = match self.lookup(key) {
            Some(descriptor) => descriptor.clone(),
            None if dotted => return Err(CodecError::UnknownFormat(name.to_string())),
            None => FormatDescriptor::light(languages::rules_for(key)?.id),
        };

        let Some(style) = style else {
            return Ok(base);
        };
        let style: Style = style
            .parse()
            .map_err(|_| CodecError::UnknownFormat(name.to_string()))?;
        match (base.style, style) {
            (current, Style::Light | Style::Percent) if current.is_script() => {
                Ok(FormatDescriptor::new(base.language, style))
            }
            (Style::Markdown(current), Style::Markdown(requested)) if current == requested => {
                Ok(base)
            }
            _ => Err(CodecError::UnknownFormat(name.to_string())),
        }
    }

    /// Exact name or alias first, then case-insensitively
    fn lookup(&self, name: &str) -> Option<&FormatDescriptor> {
        let exact = self
            .formats
            .get(name)
            .or_else(|| self.aliases.get(name).and_then(|n| self.formats.get(n)));
        exact.or_else(|| {
            self.formats
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .or_else(|| {
                    self.aliases
                        .iter()
                        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
                        .and_then(|(_, target)| self.formats.get_key_value(target))
                })
                .map(|(_, descriptor)| descriptor)
        })
    }

    /// Create a registry with default formats
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        for rules in LANGUAGES {
            let light = FormatDescriptor::light(rules.id);
            let light_name = light.name();
            registry.register(light);
            registry.register(FormatDescriptor::percent(rules.id));
            for extension in rules.extensions {
                registry.register_alias(extension, &light_name);
            }
        }

        registry.register(FormatDescriptor::markdown("python"));
        registry.register_alias("markdown", "md");
        registry.register(FormatDescriptor::rmarkdown("R"));
        registry.register_alias("rmarkdown", "Rmd");
        registry.register_alias("rmd", "Rmd");

        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
