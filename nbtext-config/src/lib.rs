//! Shared configuration loader for the nbtext codec.
//!
//! `defaults/nbtext.default.toml` is embedded into every consumer so that the
//! documented defaults and runtime behavior stay in sync. Applications layer
//! user-specific files on top of those defaults via [`Loader`] before
//! deserializing into [`NbtextConfig`], then ask it for a
//! [`FormatDescriptor`] with [`NbtextConfig::descriptor_for`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use nbtext_codec::{format_descriptor_for, CodecError, FormatDescriptor, Style};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/nbtext.default.toml");

/// Top-level configuration consumed by nbtext applications.
#[derive(Debug, Clone, Deserialize)]
pub struct NbtextConfig {
    pub codec: CodecConfig,
}

/// Knobs applied to every resolved format.
#[derive(Debug, Clone, Deserialize)]
pub struct CodecConfig {
    pub insert_version: bool,
    pub comment_magics: MagicsPolicy,
    pub script_style: ScriptStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicsPolicy {
    Auto,
    Always,
    Never,
}

impl MagicsPolicy {
    fn as_toggle(self) -> Option<bool> {
        match self {
            MagicsPolicy::Auto => None,
            MagicsPolicy::Always => Some(true),
            MagicsPolicy::Never => Some(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStyle {
    Light,
    Percent,
}

impl From<ScriptStyle> for Style {
    fn from(style: ScriptStyle) -> Self {
        match style {
            ScriptStyle::Light => Style::Light,
            ScriptStyle::Percent => Style::Percent,
        }
    }
}

impl NbtextConfig {
    /// Resolve a format name and apply the configured toggles.
    ///
    /// An explicit `:style` suffix wins over `codec.script_style`.
    pub fn descriptor_for(&self, name: &str) -> Result<FormatDescriptor, CodecError> {
        let mut descriptor = format_descriptor_for(name)?;
        if !name.contains(':') && descriptor.style.is_script() {
            descriptor = FormatDescriptor::new(descriptor.language, self.codec.script_style.into());
        }
        descriptor.insert_version = self.codec.insert_version;
        descriptor.comment_magics = self.codec.comment_magics.as_toggle();
        Ok(descriptor)
    }
}

/// Layers user files and overrides over the embedded defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Loader holding only `nbtext.default.toml`.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Add a TOML file on top of the current layers; `build` fails if it is missing.
    pub fn with_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), true)
    }

    /// Same as [`Loader::with_file`], but a missing file is skipped.
    pub fn with_optional_file(self, path: impl AsRef<Path>) -> Self {
        self.layer(path.as_ref(), false)
    }

    fn layer(mut self, path: &Path, required: bool) -> Self {
        let file = File::from(path).format(FileFormat::Toml).required(required);
        self.builder = self.builder.add_source(file);
        self
    }

    /// Force one dotted key such as `codec.script_style`, above every file.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers into an [`NbtextConfig`].
    pub fn build(self) -> Result<NbtextConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Built-in configuration with no user layers.
pub fn load_defaults() -> Result<NbtextConfig, ConfigError> {
    Loader::new().build()
}
