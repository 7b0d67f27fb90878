//! Markdown format tests
//!
//! Tests for notebooks stored as CommonMark and R Markdown documents.

mod commonmark;
mod rmarkdown;
