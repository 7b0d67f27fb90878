//! Restore outputs after a text round trip
//!
//! Text formats keep sources and metadata but never outputs. After a text
//! file is edited and decoded again, [`combine_outputs`] brings back the
//! outputs of the executed notebook it was paired with.

use crate::notebook::Notebook;
use log::debug;

/// Copy outputs and execution counts from `executed` onto the code cells of
/// `text_notebook` whose source is unchanged.
///
/// Cells are matched in order: each text code cell takes the next executed
/// code cell with identical source, so reordered or edited cells simply
/// lose their outputs. Document metadata missing from the text notebook
/// (typically `language_info` written by the kernel) is copied as well.
pub fn combine_outputs(mut text_notebook: Notebook, executed: &Notebook) -> Notebook {
    let executed_code: Vec<_> = executed.cells.iter().filter(|c| c.is_code()).collect();
    let mut cursor = 0;
    let mut restored = 0;

    for cell in text_notebook.cells.iter_mut().filter(|c| c.is_code()) {
        let found = executed_code[cursor..]
            .iter()
            .position(|candidate| candidate.source == cell.source);
        if let Some(offset) = found {
            let source = executed_code[cursor + offset];
            cell.outputs = source.outputs.clone();
            cell.execution_count = source.execution_count;
            cursor += offset + 1;
            restored += 1;
        }
    }

    for (key, value) in &executed.metadata {
        if !text_notebook.metadata.contains_key(key) {
            text_notebook.metadata.insert(key.clone(), value.clone());
        }
    }

    debug!("restored outputs of {restored} code cells");
    text_notebook
}
