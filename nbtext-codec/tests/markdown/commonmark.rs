use crate::common::{
    assert_normalization_is_idempotent, assert_notebook_round_trip, assert_text_round_trip, meta,
};
use insta::assert_snapshot;
use nbtext_codec::{decode, encode, reads, Cell, CellType, FormatDescriptor, Notebook};
use serde_json::json;

fn markdown() -> FormatDescriptor {
    FormatDescriptor::markdown("python")
}

#[test]
fn test_kitchensink_round_trip() {
    let text = r#"---
jupyter:
  kernelspec:
    display_name: Python 3
    language: python
    name: python3
---

# Title

Some text with `inline code`.

```python
import math
%time math.sqrt(2)
```

```bash
echo "a bash block stays markdown"
```

<!-- #region tags=["aside"] -->
An aside.
<!-- #endregion -->

```python tags=["hide-input"]
x = 1

y = 2
```

<!-- #raw -->
raw **content**
<!-- #endraw -->
"#;
    let notebook = assert_text_round_trip(text, &markdown());
    let types: Vec<_> = notebook.cells.iter().map(|c| c.cell_type).collect();
    assert_eq!(
        types,
        vec![
            CellType::Markdown,
            CellType::Code,
            CellType::Markdown,
            CellType::Markdown,
            CellType::Code,
            CellType::Raw,
        ]
    );
    assert_eq!(notebook.cells[1].source, vec!["import math", "%time math.sqrt(2)"]);
    assert_eq!(notebook.cells[3].metadata, meta(json!({"tags": ["aside"]})));
    assert_eq!(notebook.cells[4].metadata, meta(json!({"tags": ["hide-input"]})));
    assert_eq!(notebook.cells[4].source, vec!["x = 1", "", "y = 2"]);
}

#[test]
fn test_consecutive_markdown_cells_use_regions() {
    let notebook = Notebook::new(vec![
        Cell::markdown(["One"]),
        Cell::markdown(["Two"]),
        Cell::markdown(["", "Three"]),
    ]);
    let text = assert_notebook_round_trip(&notebook, &markdown());
    assert_snapshot!(text, @r###"
One

<!-- #region -->
Two
<!-- #endregion -->

<!-- #region -->

Three
<!-- #endregion -->
"###);
}

#[test]
fn test_marker_like_markdown_is_protected() {
    let notebook = Notebook::new(vec![
        Cell::markdown(["---", "not a header", "---"]),
        Cell::code(["x"]),
        Cell::markdown(["Example:", "```python", "fake", "```"]),
        Cell::markdown([] as [&str; 0]),
        Cell::markdown(["<!-- #raw -->"]).with_metadata(meta(json!({"slide": "skip"}))),
    ]);
    assert_notebook_round_trip(&notebook, &markdown());
}

#[test]
fn test_document_language_picks_fences() {
    let mut metadata = nbtext_codec::Metadata::new();
    metadata.insert("kernelspec".into(), json!({"name": "julia-1.9", "language": "julia"}));
    let notebook = Notebook::new(vec![Cell::code(["println(1)"])]).with_metadata(metadata);

    let text = encode(&notebook, &markdown()).unwrap();
    assert!(text.ends_with("```julia\nprintln(1)\n```\n"), "{text}");
    assert_eq!(decode(&text, &markdown()).unwrap(), notebook);
}

#[test]
fn test_markdown_alias() {
    let notebook = reads("Text\n\n```python\n1\n```\n", "markdown").unwrap();
    assert_eq!(notebook.cells.len(), 2);
    assert_eq!(notebook.cells[1].source, vec!["1"]);
}

#[test]
fn test_unterminated_fence_takes_the_rest() {
    let notebook = decode("```python\nx = 1\n\n", &markdown()).unwrap();
    assert_eq!(notebook.cells.len(), 1);
    assert_eq!(notebook.cells[0].source, vec!["x = 1"]);
}

#[test]
fn test_irregular_blank_lines() {
    let text = "\n\nIntro\n\n\n```python\nx\n```\n```python\ny\n```\n\n\n\nOutro\n\n";
    assert_normalization_is_idempotent(text, &markdown());
    let notebook = decode(text, &markdown()).unwrap();
    assert_eq!(notebook.cells.len(), 4);
}
