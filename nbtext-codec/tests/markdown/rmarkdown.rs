use crate::common::{
    assert_normalization_is_idempotent, assert_notebook_round_trip, assert_text_round_trip, meta,
};
use nbtext_codec::{decode, format_descriptor_for, Cell, CellType, FormatDescriptor, Notebook};
use serde_json::json;

fn rmarkdown() -> FormatDescriptor {
    FormatDescriptor::rmarkdown("R")
}

#[test]
fn test_report_round_trip() {
    let text = r#"---
title: Quarterly report
output: html_document
jupyter:
  kernelspec:
    display_name: R
    language: R
    name: ir
---

# Summary

```{r setup, include=FALSE}
library(ggplot2)
```

```{r fig.width=7, fig.cap="Sales"}
ggplot(sales) + geom_line()
```

```{python}
print("not an R chunk, so markdown")
```
"#;
    let notebook = assert_text_round_trip(text, &rmarkdown());
    let types: Vec<_> = notebook.cells.iter().map(|c| c.cell_type).collect();
    assert_eq!(
        types,
        vec![
            CellType::Raw,
            CellType::Markdown,
            CellType::Code,
            CellType::Code,
            CellType::Markdown,
        ]
    );
    assert_eq!(
        notebook.cells[0].source,
        vec!["---", "title: Quarterly report", "output: html_document", "---"]
    );
    assert_eq!(
        notebook.cells[2].metadata,
        meta(json!({"name": "setup", "include": false}))
    );
    assert_eq!(
        notebook.cells[3].metadata,
        meta(json!({"fig.width": 7, "fig.cap": "Sales"}))
    );
}

#[test]
fn test_chunk_options_round_trip() {
    let notebook = Notebook::new(vec![
        Cell::code(["summary(cars)"]).with_metadata(meta(json!({
            "name": "cars",
            "echo": true,
            "tags": ["a", "b"],
            "eval": null,
        }))),
        Cell::markdown(["Between chunks"]),
        Cell::code(["plot(cars)"]).with_metadata(meta(json!({"name": "label with spaces"}))),
    ]);
    let text = assert_notebook_round_trip(&notebook, &rmarkdown());
    assert!(text.starts_with("```{r cars, echo=TRUE, tags=c(\"a\", \"b\"), eval=NULL}\n"));
    assert!(text.contains("```{r name=\"label with spaces\"}\n"));
}

#[test]
fn test_python_in_rmarkdown() {
    let descriptor = format_descriptor_for("Rmd").unwrap().with_language("python");
    let notebook = Notebook::new(vec![Cell::code(["import os"])]);
    let text = assert_notebook_round_trip(&notebook, &descriptor);
    assert_eq!(text, "```{python}\nimport os\n```\n");
}

#[test]
fn test_uppercase_engine_is_accepted() {
    let notebook = decode("```{R}\n1\n```\n", &rmarkdown()).unwrap();
    assert_eq!(notebook.cells[0].cell_type, CellType::Code);
}

#[test]
fn test_r_expressions_round_trip() {
    let text = r#"```{r fig.cap=paste("Sales in", year)}
plot(sales)
```

```{r model, cache, dependson=c("setup", prev_label())}
fit <- lm(y ~ x)
```

```{r, include}
library(dplyr)
```
"#;
    let notebook = assert_text_round_trip(text, &rmarkdown());
    assert_eq!(
        notebook.cells[0].metadata,
        meta(json!({"fig.cap": "#R_CODE#paste(\"Sales in\", year)"}))
    );
    assert_eq!(
        notebook.cells[1].metadata,
        meta(json!({
            "name": "model",
            "cache": "#R_CODE#",
            "dependson": ["setup", "#R_CODE#prev_label()"],
        }))
    );
    assert_eq!(notebook.cells[2].metadata, meta(json!({"include": "#R_CODE#"})));
}

#[test]
fn test_metadata_without_r_spelling_round_trips() {
    let notebook = Notebook::new(vec![
        Cell::code(["1"]).with_metadata(meta(json!({"my key": 1}))),
        Cell::code(["2"]).with_metadata(meta(json!({
            "name": "second",
            "widget": {"state": {"open": true}},
            "note": "line one\nline two",
            "echo": false,
        }))),
    ]);
    let text = assert_notebook_round_trip(&notebook, &rmarkdown());
    assert!(text.starts_with("```{r jupyter_meta=\"{\\\"my key\\\":1}\"}\n"), "{text}");
    assert!(text.contains("```{r second, echo=FALSE, jupyter_meta="), "{text}");
}

#[test]
fn test_irregular_blank_lines() {
    let text = "\n\nIntro\n\n\n```{r}\nx\n```\n```{r a, b}\ny\n\n```\n\n\n\nOutro\n\n";
    assert_normalization_is_idempotent(text, &rmarkdown());
    let notebook = decode(text, &rmarkdown()).unwrap();
    assert_eq!(notebook.cells.len(), 4);
    assert_eq!(notebook.cells[2].source, vec!["y", ""]);
}
