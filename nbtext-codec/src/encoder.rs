//! Notebook to text
//!
//! Writes the header, then each cell, separated by exactly one blank line,
//! with a single trailing newline. Every choice between a bare cell and an
//! explicitly marked one is made so that [`crate::decode`] reads the same
//! cell back.

use crate::error::Result;
use crate::format::{FormatDescriptor, Style};
use crate::header::{encode_header, Header};
use crate::markers::{cell_comment_magics, document_comment_magics, is_blank, Recognizer};
use crate::notebook::{Cell, CellType, Notebook};
use log::{debug, trace};

/// Where a cell sits in the document
#[derive(Debug, Clone, Copy)]
struct Position {
    /// First thing in the document (no header before it)
    leading: bool,
    last: bool,
    previous: Option<CellType>,
}

/// Encode a notebook as text
pub fn encode(notebook: &Notebook, descriptor: &FormatDescriptor) -> Result<String> {
    let rules = descriptor.rules()?;
    debug!(
        "encoding {} cells as {}",
        notebook.cells.len(),
        descriptor.name()
    );

    let (header_cell, cells) = split_header_cell(&notebook.cells);
    let header = Header {
        metadata: notebook.metadata.clone(),
        version: notebook.format_version.or_else(|| {
            descriptor
                .insert_version
                .then(|| descriptor.style.current_version())
        }),
        extra_lines: header_cell.map(header_cell_lines).unwrap_or_default(),
    };
    let mut lines = encode_header(&header, descriptor)?;
    let has_header = !lines.is_empty();

    let writer = CellWriter {
        style: descriptor.style,
        recognizer: Recognizer::new(descriptor, rules).with_document_language(notebook.language()),
        comment_magics: document_comment_magics(descriptor, rules, &notebook.metadata),
    };

    for (index, cell) in cells.iter().enumerate() {
        let position = Position {
            leading: index == 0 && !has_header,
            last: index + 1 == cells.len(),
            previous: index.checked_sub(1).map(|i| cells[i].cell_type),
        };
        if !lines.is_empty() {
            lines.push(String::new());
        }
        trace!("writing {} cell {index}", cell.cell_type);
        writer.write(cell, position, &mut lines);
    }

    if lines.is_empty() {
        return Ok(String::new());
    }
    let mut text = lines.join("\n");
    text.push('\n');
    debug!("encoded {} lines", lines.len());
    Ok(text)
}

/// A leading raw cell `---`, yaml..., `---` that can live in the header
fn split_header_cell(cells: &[Cell]) -> (Option<&Cell>, &[Cell]) {
    match cells.split_first() {
        Some((first, rest)) if is_header_cell(first) => (Some(first), rest),
        _ => (None, cells),
    }
}

fn is_header_cell(cell: &Cell) -> bool {
    let source = &cell.source;
    cell.cell_type == CellType::Raw
        && cell.metadata.is_empty()
        && source.len() > 2
        && source[0] == "---"
        && source[source.len() - 1] == "---"
        && source[1..source.len() - 1]
            .iter()
            .all(|line| line.trim_end() != "---" && !line.starts_with("jupyter:"))
}

fn header_cell_lines(cell: &Cell) -> Vec<String> {
    cell.source[1..cell.source.len() - 1].to_vec()
}

struct CellWriter {
    style: Style,
    recognizer: Recognizer,
    /// Document-level magic commenting
    comment_magics: bool,
}

impl CellWriter {
    fn write(&self, cell: &Cell, position: Position, out: &mut Vec<String>) {
        match self.style {
            Style::Light => self.write_light(cell, position, out),
            Style::Percent => self.write_percent(cell, out),
            Style::Markdown(_) => self.write_markdown(cell, position, out),
        }
    }

    fn write_light(&self, cell: &Cell, position: Position, out: &mut Vec<String>) {
        let comment_magics = cell_comment_magics(self.comment_magics, &cell.metadata);
        let body = self.script_body(cell, comment_magics);

        let bare = cell.metadata.is_empty()
            && !body.is_empty()
            && match cell.cell_type {
                CellType::Code => {
                    !body.iter().any(|line| is_blank(line))
                        && !body
                            .iter()
                            .all(|line| self.recognizer.is_markdown_line(line, comment_magics))
                }
                CellType::Markdown => true,
                CellType::Raw => false,
            };
        if bare {
            out.extend(body);
            return;
        }

        out.push(self.recognizer.light_start(cell.cell_type, &cell.metadata));
        let ends_blank = body.last().is_some_and(|line| is_blank(line));
        out.extend(body);
        if !position.last || ends_blank {
            out.push(self.recognizer.light_end());
        }
    }

    fn write_percent(&self, cell: &Cell, out: &mut Vec<String>) {
        let comment_magics = cell_comment_magics(self.comment_magics, &cell.metadata);
        out.push(self.recognizer.percent_start(cell.cell_type, &cell.metadata));
        out.extend(self.script_body(cell, comment_magics));
    }

    fn script_body(&self, cell: &Cell, comment_magics: bool) -> Vec<String> {
        cell.source
            .iter()
            .map(|line| match cell.cell_type {
                CellType::Code => self.recognizer.encode_code_line(line, comment_magics),
                CellType::Markdown | CellType::Raw => {
                    self.recognizer.encode_text_line(line, comment_magics)
                }
            })
            .collect()
    }

    fn write_markdown(&self, cell: &Cell, position: Position, out: &mut Vec<String>) {
        match cell.cell_type {
            CellType::Code => {
                out.push(self.recognizer.fence_open(&cell.metadata));
                out.extend(cell.source.iter().cloned());
                out.push(self.recognizer.fence_close().to_string());
            }
            CellType::Raw => {
                out.push(self.recognizer.region_open(CellType::Raw, &cell.metadata));
                out.extend(cell.source.iter().cloned());
                out.push(self.recognizer.region_close(CellType::Raw).to_string());
            }
            CellType::Markdown if self.needs_region(cell, position) => {
                out.push(self.recognizer.region_open(CellType::Markdown, &cell.metadata));
                out.extend(cell.source.iter().cloned());
                out.push(self.recognizer.region_close(CellType::Markdown).to_string());
            }
            CellType::Markdown => out.extend(cell.source.iter().cloned()),
        }
    }

    /// A markdown cell that would not read back as itself when written bare
    fn needs_region(&self, cell: &Cell, position: Position) -> bool {
        let source = &cell.source;
        let (Some(first), Some(last)) = (source.first(), source.last()) else {
            return true;
        };
        !cell.metadata.is_empty()
            || position.previous == Some(CellType::Markdown)
            || is_blank(first)
            || is_blank(last)
            || (position.leading && first.trim_end() == "---")
            || source
                .iter()
                .any(|line| self.recognizer.starts_markdown_cell(line))
    }
}
