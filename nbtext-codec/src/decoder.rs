//! Text to notebook
//!
//! A single pass over the lines with three states:
//!
//! ```text
//! AwaitingHeader ──header codec──▶ BetweenCells ◀──flush── InCell
//!                                       │                     ▲
//!                                       └──cell start/content─┘
//! ```
//!
//! Cells without a start marker are implicit: in light scripts a paragraph
//! (ended by a blank line) is markdown when every line is a markdown
//! comment and code otherwise; percent scripts read leading content as code;
//! markdown documents read text between code cells as markdown.

use crate::error::Result;
use crate::format::{FormatDescriptor, Style};
use crate::header::{decode_header, Header};
use crate::languages::LanguageRules;
use crate::markers::{
    cell_comment_magics, document_comment_magics, is_blank, Closer, LineKind, MarkerKind,
    Recognizer, ScanContext,
};
use crate::notebook::{Cell, CellType, Metadata, Notebook};
use log::{debug, trace};

/// Decode text into a notebook
pub fn decode(text: &str, descriptor: &FormatDescriptor) -> Result<Notebook> {
    let rules = descriptor.rules()?;
    debug!("decoding {} bytes as {}", text.len(), descriptor.name());

    let lines: Vec<&str> = text.lines().collect();
    let mut reader = CellReader::new(descriptor, rules);
    reader.read(&lines)?;
    let notebook = reader.finish();

    debug!("decoded {} cells", notebook.cells.len());
    Ok(notebook)
}

/// How a cell being read ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Closing {
    /// Light paragraph, ended by a blank line; type decided at flush
    Paragraph,
    /// Ended by the next cell start
    NextStart,
    /// Ended by a closing marker
    Explicit(Closer),
}

#[derive(Debug)]
struct PendingCell {
    cell_type: CellType,
    metadata: Metadata,
    lines: Vec<String>,
    closing: Closing,
}

#[derive(Debug)]
enum State {
    AwaitingHeader,
    BetweenCells,
    InCell(PendingCell),
}

struct CellReader<'d> {
    descriptor: &'d FormatDescriptor,
    rules: &'static LanguageRules,
    recognizer: Recognizer,
    state: State,
    notebook: Notebook,
    /// Document-level magic commenting, known once the header is read
    comment_magics: bool,
}

impl<'d> CellReader<'d> {
    fn new(descriptor: &'d FormatDescriptor, rules: &'static LanguageRules) -> Self {
        Self {
            descriptor,
            rules,
            recognizer: Recognizer::new(descriptor, rules),
            state: State::AwaitingHeader,
            notebook: Notebook::default(),
            comment_magics: rules.has_magics(),
        }
    }

    fn read(&mut self, lines: &[&str]) -> Result<()> {
        let mut body = lines;
        if let State::AwaitingHeader = self.state {
            let (header, remaining) = decode_header(lines, self.descriptor)?;
            self.start_document(header);
            body = remaining;
        }
        for line in body {
            self.feed(line);
        }
        Ok(())
    }

    fn start_document(&mut self, header: Header) {
        let Header {
            metadata,
            version,
            extra_lines,
        } = header;
        self.notebook.metadata = metadata;
        self.notebook.format_version = version;
        if !extra_lines.is_empty() {
            let source = std::iter::once("---".to_string())
                .chain(extra_lines)
                .chain(std::iter::once("---".to_string()));
            self.notebook.cells.push(Cell::raw(source));
        }

        self.recognizer = Recognizer::new(self.descriptor, self.rules)
            .with_document_language(self.notebook.language());
        self.comment_magics =
            document_comment_magics(self.descriptor, self.rules, &self.notebook.metadata);
        self.state = State::BetweenCells;
    }

    fn feed(&mut self, line: &str) {
        let state = std::mem::replace(&mut self.state, State::BetweenCells);
        self.state = match state {
            State::AwaitingHeader | State::BetweenCells => self.between_cells(line),
            State::InCell(cell) => self.in_cell(cell, line),
        };
    }

    fn between_cells(&mut self, line: &str) -> State {
        let context = ScanContext {
            cell_type: None,
            awaiting: None,
            comment_magics: self.comment_magics,
        };
        match self.recognizer.classify(line, &context) {
            LineKind::Blank => State::BetweenCells,
            LineKind::Marker(marker) => match marker.kind {
                MarkerKind::CellStart {
                    cell_type,
                    metadata,
                    closer,
                } => State::InCell(self.explicit_cell(cell_type, metadata, closer)),
                MarkerKind::CellEnd => {
                    debug!("dropping stray end marker '{}'", marker.raw);
                    State::BetweenCells
                }
                MarkerKind::HeaderStart | MarkerKind::HeaderEnd | MarkerKind::Magic => {
                    State::InCell(self.implicit_cell(line))
                }
            },
            LineKind::Content => State::InCell(self.implicit_cell(line)),
        }
    }

    fn in_cell(&mut self, mut cell: PendingCell, line: &str) -> State {
        let awaiting = match cell.closing {
            Closing::Explicit(closer) => Some(closer),
            Closing::Paragraph | Closing::NextStart => None,
        };
        let context = ScanContext {
            cell_type: Some(cell.cell_type),
            awaiting,
            comment_magics: cell_comment_magics(self.comment_magics, &cell.metadata),
        };

        match self.recognizer.classify(line, &context) {
            LineKind::Marker(marker) => match marker.kind {
                MarkerKind::CellStart {
                    cell_type,
                    metadata,
                    closer,
                } => {
                    self.flush(cell, false);
                    State::InCell(self.explicit_cell(cell_type, metadata, closer))
                }
                MarkerKind::CellEnd => {
                    self.flush(cell, false);
                    State::BetweenCells
                }
                MarkerKind::HeaderStart | MarkerKind::HeaderEnd | MarkerKind::Magic => {
                    cell.lines.push(line.to_string());
                    State::InCell(cell)
                }
            },
            LineKind::Blank if cell.closing == Closing::Paragraph => {
                self.flush(cell, false);
                State::BetweenCells
            }
            LineKind::Blank | LineKind::Content => {
                cell.lines.push(line.to_string());
                State::InCell(cell)
            }
        }
    }

    fn explicit_cell(
        &self,
        cell_type: CellType,
        metadata: Metadata,
        closer: Option<Closer>,
    ) -> PendingCell {
        PendingCell {
            cell_type,
            metadata,
            lines: Vec::new(),
            closing: closer.map_or(Closing::NextStart, Closing::Explicit),
        }
    }

    fn implicit_cell(&self, line: &str) -> PendingCell {
        let (cell_type, closing) = match self.descriptor.style {
            Style::Light => (CellType::Code, Closing::Paragraph),
            Style::Percent => (CellType::Code, Closing::NextStart),
            Style::Markdown(_) => (CellType::Markdown, Closing::NextStart),
        };
        PendingCell {
            cell_type,
            metadata: Metadata::new(),
            lines: vec![line.to_string()],
            closing,
        }
    }

    fn flush(&mut self, cell: PendingCell, at_end: bool) {
        let PendingCell {
            cell_type,
            metadata,
            mut lines,
            closing,
        } = cell;

        let trim = match closing {
            Closing::NextStart => true,
            Closing::Explicit(_) => at_end,
            Closing::Paragraph => false,
        };
        if trim {
            while lines.last().is_some_and(|line| is_blank(line)) {
                lines.pop();
            }
        }

        let (cell_type, source) = if self.descriptor.style.is_script() {
            self.script_source(cell_type, &metadata, closing, &lines)
        } else {
            (cell_type, lines)
        };

        trace!("read {cell_type} cell with {} lines", source.len());
        self.notebook.cells.push(Cell {
            cell_type,
            source,
            metadata,
            ..Cell::default()
        });
    }

    /// Undo commenting and escaping of a script cell body
    fn script_source(
        &self,
        cell_type: CellType,
        metadata: &Metadata,
        closing: Closing,
        lines: &[String],
    ) -> (CellType, Vec<String>) {
        let comment_magics = cell_comment_magics(self.comment_magics, metadata);
        let cell_type = if closing == Closing::Paragraph {
            let markdown = lines
                .iter()
                .all(|line| self.recognizer.is_markdown_line(line, comment_magics));
            if markdown {
                CellType::Markdown
            } else {
                CellType::Code
            }
        } else {
            cell_type
        };

        let source = lines
            .iter()
            .map(|line| match cell_type {
                CellType::Code => self.recognizer.decode_code_line(line, comment_magics),
                CellType::Markdown | CellType::Raw => {
                    self.recognizer.decode_text_line(line, comment_magics)
                }
            })
            .collect();
        (cell_type, source)
    }

    fn finish(mut self) -> Notebook {
        if let State::InCell(cell) = std::mem::replace(&mut self.state, State::BetweenCells) {
            self.flush(cell, true);
        }
        self.notebook
    }
}
