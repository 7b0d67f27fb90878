//! Percent scripts: every cell opens with `# %%`

use crate::common::{
    assert_normalization_is_idempotent, assert_notebook_round_trip, assert_text_round_trip, meta,
};
use nbtext_codec::{decode, encode, Cell, CellType, FormatDescriptor, FormatVersion, Notebook};
use serde_json::json;

fn python() -> FormatDescriptor {
    FormatDescriptor::percent("python")
}

#[test]
fn test_kitchensink_round_trip() {
    let text = r#"# ---
# jupyter:
#   jupytext_format_version: '1.1'
#   kernelspec:
#     display_name: Python 3
#     language: python
#     name: python3
#   toc:
#     depth: 2
# ---

# %% [markdown]
# # Title
#
# Intro text.

# %% Imports tags=["setup"]
import pandas as pd
# %matplotlib inline

# %%
# %%time

def slow():
    pass

# %% [raw]
# raw cell

# %% {"odd key":1}
# # %% escaped marker
x = 1
"#;
    let notebook = assert_text_round_trip(text, &python());
    assert_eq!(notebook.format_version, Some(FormatVersion::new(1, 1)));
    assert_eq!(notebook.metadata["toc"], json!({"depth": 2}));
    assert_eq!(notebook.cells.len(), 5);
    assert_eq!(
        notebook.cells[1].metadata,
        meta(json!({"title": "Imports", "tags": ["setup"]}))
    );
    assert_eq!(
        notebook.cells[1].source,
        vec!["import pandas as pd", "%matplotlib inline"]
    );
    assert_eq!(
        notebook.cells[2].source,
        vec!["%%time", "", "def slow():", "    pass"]
    );
    assert_eq!(notebook.cells[3].cell_type, CellType::Raw);
    assert_eq!(notebook.cells[4].metadata, meta(json!({"odd key": 1})));
    assert_eq!(notebook.cells[4].source, vec!["# %% escaped marker", "x = 1"]);
}

#[test]
fn test_cell_magic_is_not_a_marker() {
    let text = "# %%\n# %%time\nx = 1\n";
    let notebook = decode(text, &python()).unwrap();
    assert_eq!(notebook.cells.len(), 1);
    assert_eq!(notebook.cells[0].source, vec!["%%time", "x = 1"]);
}

#[test]
fn test_content_before_first_marker_is_code() {
    let text = "import sys\n\n# %% [markdown]\n# Text\n";
    let notebook = decode(text, &python()).unwrap();
    assert_eq!(notebook.cells[0].cell_type, CellType::Code);
    assert_eq!(notebook.cells[0].source, vec!["import sys"]);
    assert_eq!(notebook.cells[1].cell_type, CellType::Markdown);
}

#[test]
fn test_notebook_round_trips() {
    let notebook = Notebook::new(vec![
        Cell::code(["", "x = 1"]),
        Cell::markdown(["", "", "Text", ""]),
        Cell::raw([] as [&str; 0]),
        Cell::code(["# %% in code", "#%%", "%%bash"]),
        Cell::code(["y = 2"]).with_metadata(meta(json!({"title": "two  spaces", "n": null}))),
    ]);
    assert_notebook_round_trip(&notebook, &python());
}

#[test]
fn test_trailing_blank_lines_of_code_cells_are_dropped() {
    let notebook = Notebook::new(vec![Cell::code(["x = 1", "", ""]), Cell::code(["y"])]);
    let text = encode(&notebook, &python()).unwrap();
    assert_eq!(text, "# %%\nx = 1\n\n\n\n# %%\ny\n");
    let decoded = decode(&text, &python()).unwrap();
    assert_eq!(decoded.cells[0].source, vec!["x = 1"]);
}

#[test]
fn test_matlab_and_typescript() {
    let matlab = FormatDescriptor::percent("matlab");
    let notebook = Notebook::new(vec![Cell::markdown(["Plot"]), Cell::code(["plot(x)"])]);
    let text = assert_notebook_round_trip(&notebook, &matlab);
    assert_eq!(text, "% %% [markdown]\n% Plot\n\n% %%\nplot(x)\n");

    let typescript = FormatDescriptor::percent("typescript");
    let text = assert_notebook_round_trip(&notebook, &typescript);
    assert_eq!(text, "// %% [markdown]\n// Plot\n\n// %%\nplot(x)\n");
}

#[test]
fn test_irregular_blank_lines() {
    let text = "\n# %%\n\n\nx = 1\n\n\n\n\n# %% [markdown]\n\n# Text\n\n";
    assert_normalization_is_idempotent(text, &python());
}
