//! Notebook document model for nbview
//!
//! Handles the notebook file format:
//! - Typed cells and outputs with opaque preservation of unknown fields
//! - Parsing from raw file bytes
//! - Canonical serialization back to text

pub mod model;
pub mod source;

pub use model::*;
pub use source::{join_lines, split_source, value_text};

use crate::error::{NotebookError, NotebookResult};
use serde::Serialize;

/// Parse raw file bytes into a notebook
pub fn parse(bytes: &[u8]) -> NotebookResult<Notebook> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| NotebookError::Encoding)?;
    parse_str(text)
}

/// Parse notebook text
pub fn parse_str(text: &str) -> NotebookResult<Notebook> {
    let notebook: Notebook = serde_json::from_str(text).map_err(NotebookError::Parse)?;
    log::debug!(
        "Parsed notebook v{}.{} with {} cells",
        notebook.nbformat,
        notebook.nbformat_minor,
        notebook.cells.len()
    );
    Ok(notebook)
}

/// Serialize a notebook to canonical text
///
/// One-space indentation and a trailing newline, as Jupyter writes it.
pub fn serialize(notebook: &Notebook) -> NotebookResult<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    notebook
        .serialize(&mut ser)
        .map_err(NotebookError::Serialize)?;
    let mut text = String::from_utf8(buf).map_err(|_| NotebookError::Encoding)?;
    text.push('\n');
    Ok(text)
}
