//! Notebook to text conversion
//!
//!     This crate converts notebooks (ordered code, markdown and raw cells with metadata) to
//!     plain-text scripts and markdown documents, and back. Text is what people diff, review and
//!     edit; the notebook is what kernels run. The conversion has to be lossless for everything a
//!     text format can carry: decoding then encoding canonical text gives the same bytes, and
//!     encoding then decoding a notebook gives the same cells and metadata.
//!
//!     This is a pure lib: no file system, no env vars, no printing. Reading and writing the ipynb
//!     container, running kernels and command line handling belong to callers.
//!
//! Architecture
//!
//!     There is one encoder and one decoder. What differs between formats is data: a
//!     FormatDescriptor (./format.rs) names the language and the marker style, and the language rule
//!     table (./languages.rs) provides comment syntax and magic prefixes. No format gets its own
//!     parser type.
//!
//!     The file structure :
//!     .
//!     ├── error.rs
//!     ├── notebook.rs             # Notebook, Cell, Metadata
//!     ├── languages.rs            # Language rule table
//!     ├── format.rs               # FormatDescriptor and Style
//!     ├── registry.rs             # Name/extension lookup
//!     ├── header.rs               # YAML header block
//!     ├── markers.rs              # Line classification, marker lines, escaping
//!     ├── cell_metadata.rs        # key=value metadata on marker lines
//!     ├── knitr.rs                # R Markdown chunk options
//!     ├── encoder.rs
//!     ├── decoder.rs
//!     ├── combine.rs              # Restoring outputs after a text round trip
//!     └── lib.rs
//!
//! Testing
//!     tests
//!     └── <style>.rs
//!
//!     Note that rust does not by default discover tests in subdirectories, so tests/lib.rs
//!     includes them as modules.
//!
//! Core Algorithms
//!
//!     The decoder is a single pass state machine (AwaitingHeader, BetweenCells, InCell) over the
//!     lines, asking the recognizer (./markers.rs) what each line is. The encoder is its mirror:
//!     for each cell it decides whether the cell can be written bare or needs explicit markers,
//!     by asking the same recognizer how the bare lines would be read back.
//!
//!     The part that keeps round trips lossless is escaping. A code line that looks like a marker
//!     (`# +` in a light script) is written with one more comment prefix, and the decoder strips
//!     exactly one. The set of lines that get escaped is closed under that prefix, so escaping
//!     composes.
//!
//! Styles
//!
//!     - light: cells separated by blank lines, markdown as comments, `# +` / `# -` around cells
//!       that would otherwise be ambiguous.
//!     - percent: every cell starts with `# %%`.
//!     - markdown: code cells are fenced blocks in the document language; regions mark markdown
//!       cells that need metadata or would not survive bare.
//!     - rmarkdown: like markdown, with knitr `{r label, opt=value}` chunk headers.
//!
//! Losses
//!
//!     Outputs and execution counts are not written by any text format, see combine_outputs.
//!     Percent code cells lose trailing blank lines. Markdown styles cannot hold a code cell that
//!     contains a bare ``` line, or a markdown cell containing `<!-- #endregion -->`. R Markdown
//!     chunk options keep everything: R expressions are tagged `#R_CODE#`, and metadata with no R
//!     spelling travels as one `jupyter_meta` JSON option.
//!
pub mod cell_metadata;
pub mod combine;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod format;
pub mod header;
pub mod knitr;
pub mod languages;
pub mod markers;
pub mod notebook;
pub mod registry;

pub use combine::combine_outputs;
pub use decoder::decode;
pub use encoder::encode;
pub use error::{CodecError, Result};
pub use format::{FormatDescriptor, MarkdownFlavor, Style};
pub use notebook::{Cell, CellType, FormatVersion, Metadata, Notebook};
pub use registry::FormatRegistry;

use once_cell::sync::Lazy;

static DEFAULT_REGISTRY: Lazy<FormatRegistry> = Lazy::new(FormatRegistry::with_defaults);

/// Resolve a format name such as `py`, `py:percent`, `.jl`, `julia`, `md`
/// or `Rmd` with the built-in formats.
pub fn format_descriptor_for(name: &str) -> Result<FormatDescriptor> {
    DEFAULT_REGISTRY.resolve(name)
}

/// Decode text in the named format
pub fn reads(text: &str, format: &str) -> Result<Notebook> {
    decode(text, &format_descriptor_for(format)?)
}

/// Encode a notebook in the named format
pub fn writes(notebook: &Notebook, format: &str) -> Result<String> {
    encode(notebook, &format_descriptor_for(format)?)
}
