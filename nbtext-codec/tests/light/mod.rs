//! Light scripts: blank-line separated cells, markdown as comments

use crate::common::{
    assert_normalization_is_idempotent, assert_notebook_round_trip, assert_text_round_trip, meta,
};
use insta::assert_snapshot;
use nbtext_codec::{decode, encode, Cell, CellType, FormatDescriptor, Notebook};
use serde_json::json;

fn python() -> FormatDescriptor {
    FormatDescriptor::light("python")
}

#[test]
fn test_kitchensink_round_trip() {
    let text = r#"# ---
# jupyter:
#   kernelspec:
#     display_name: Python 3
#     language: python
#     name: python3
# ---

# # A notebook
#
# With *markdown*.

import numpy as np
# %matplotlib inline

# +
def f(x):

    return x + 1
# -

# + [markdown] tags=["note"]
# Tagged text
# -

# + [raw]
# raw content
# -

# # + not a marker
# # -
f(1)
"#;
    let notebook = assert_text_round_trip(text, &python());
    let types: Vec<_> = notebook.cells.iter().map(|c| c.cell_type).collect();
    assert_eq!(
        types,
        vec![
            CellType::Markdown,
            CellType::Code,
            CellType::Code,
            CellType::Markdown,
            CellType::Raw,
            CellType::Code,
        ]
    );
    assert_eq!(notebook.cells[1].source, vec!["import numpy as np", "%matplotlib inline"]);
    assert_eq!(notebook.cells[5].source, vec!["# + not a marker", "# -", "f(1)"]);
    assert_eq!(notebook.cells[3].metadata, meta(json!({"tags": ["note"]})));
}

#[test]
fn test_encode_snapshot() {
    let notebook = Notebook::new(vec![
        Cell::markdown(["# Results", "", "See below."]),
        Cell::code(["%time total = sum(range(10))", "total"]),
        Cell::code(["# a comment on its own"]),
        Cell::code(["x = 1", ""]),
    ]);
    let text = encode(&notebook, &python()).unwrap();
    assert_snapshot!(text, @r###"
# # Results
#
# See below.

# %time total = sum(range(10))
total

# +
# a comment on its own
# -

# +
x = 1

# -
"###);
}

#[test]
fn test_notebook_round_trips() {
    let notebook = Notebook::new(vec![
        Cell::code(["# +", "# -", "# ---"]),
        Cell::markdown(["", "Indented:", "    code"]),
        Cell::markdown([] as [&str; 0]),
        Cell::code([] as [&str; 0]),
        Cell::raw(["# %% percent marker", "%time"]),
        Cell::code(["!ls", "%%bash"]).with_metadata(meta(json!({"comment_magics": false}))),
        Cell::code(["  ", "x"]),
    ]);
    assert_notebook_round_trip(&notebook, &python());
}

#[test]
fn test_comment_magics_can_be_disabled() {
    let descriptor = python().with_comment_magics(false);
    let notebook = Notebook::new(vec![Cell::code(["%time f()"])]);
    let text = encode(&notebook, &descriptor).unwrap();
    assert_eq!(text, "%time f()\n");
    assert_eq!(decode(&text, &descriptor).unwrap(), notebook);

    let mut metadata = nbtext_codec::Metadata::new();
    metadata.insert("jupytext".into(), json!({"comment_magics": true}));
    let notebook = notebook.with_metadata(metadata);
    let text = encode(&notebook, &descriptor).unwrap();
    assert!(text.ends_with("\n\n# %time f()\n"), "{text}");
}

#[test]
fn test_spin_markdown_for_r() {
    let descriptor = FormatDescriptor::light("R");
    let text = "#' # Analysis\n#'\n#' Uses spin comments.\n\nlibrary(stats)\n# an R comment\n";
    let notebook = assert_text_round_trip(text, &descriptor);
    assert_eq!(notebook.cells[0].cell_type, CellType::Markdown);
    assert_eq!(
        notebook.cells[0].source,
        vec!["# Analysis", "", "Uses spin comments."]
    );
    assert_eq!(notebook.cells[1].cell_type, CellType::Code);
}

#[test]
fn test_other_comment_syntaxes() {
    let rust = FormatDescriptor::light("rust");
    let notebook = Notebook::new(vec![
        Cell::markdown(["Docs"]),
        Cell::code(["let x = 1;", "// + looks like a marker"]),
    ]);
    let text = assert_notebook_round_trip(&notebook, &rust);
    assert_eq!(text, "// Docs\n\nlet x = 1;\n// // + looks like a marker\n");

    let julia = FormatDescriptor::light("julia");
    let notebook = Notebook::new(vec![Cell::code(["#= block comment =#"])]);
    let text = assert_notebook_round_trip(&notebook, &julia);
    assert_eq!(text, "#= block comment =#\n");
}

#[test]
fn test_irregular_blank_lines() {
    let text = "\n\n# Title\n\n\n\nx = 1\n# -\n# -\n\n\n\n# +\ny = 2\n\n\n";
    assert_normalization_is_idempotent(text, &python());
    let notebook = decode(text, &python()).unwrap();
    assert_eq!(notebook.cells.len(), 3);
    assert_eq!(notebook.cells[2].source, vec!["y = 2"]);
}
