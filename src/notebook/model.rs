//! Notebook document model
//!
//! Typed view of an nbformat v4 document. Fields the viewer does not
//! interpret are kept in `extra` maps so a load/save round trip preserves
//! them verbatim.

use super::source::{deserialize_lines, deserialize_opt_lines, join_lines, split_source, value_text};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Free-form JSON object
pub type JsonMap = Map<String, Value>;

/// MIME key for plain text payloads
pub const MIME_TEXT: &str = "text/plain";
/// MIME key for HTML payloads
pub const MIME_HTML: &str = "text/html";
/// MIME key for PNG payloads
pub const MIME_PNG: &str = "image/png";
/// MIME key for JPEG payloads
pub const MIME_JPEG: &str = "image/jpeg";
/// MIME key for SVG payloads
pub const MIME_SVG: &str = "image/svg+xml";
/// MIME key for arbitrary JSON payloads
pub const MIME_JSON: &str = "application/json";

fn default_nbformat() -> u32 {
    4
}

fn default_nbformat_minor() -> u32 {
    5
}

/// Opaque per-load identity of a cell
///
/// Assigned when the notebook is parsed and never written to disk, so it
/// stays valid while other cells move around during a view session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellId(Uuid);

impl CellId {
    /// Create a new unique cell ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse the textual form written into `data-cell-id` attributes
    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for CellId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Top-level notebook document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    /// Cells in document order
    pub cells: Vec<Cell>,

    /// Notebook metadata (kernelspec, language_info, ...)
    #[serde(default)]
    pub metadata: JsonMap,

    /// Format major version
    #[serde(default = "default_nbformat")]
    pub nbformat: u32,

    /// Format minor version
    #[serde(default = "default_nbformat_minor")]
    pub nbformat_minor: u32,

    /// Unrecognized top-level fields
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Notebook {
    /// Position of a cell by its handle
    pub fn cell_index(&self, handle: CellId) -> Option<usize> {
        self.cells.iter().position(|c| c.handle == handle)
    }

    /// Look up a cell by its handle
    pub fn cell(&self, handle: CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| c.handle == handle)
    }

    /// Carry cell handles over from a previous copy of the same document
    ///
    /// Handles are matched by position; cells past the end of `previous`
    /// keep the fresh handles they were parsed with.
    pub fn adopt_handles(&mut self, previous: &Notebook) {
        for (cell, old) in self.cells.iter_mut().zip(previous.cells.iter()) {
            cell.handle = old.handle;
        }
    }

    /// Programming language of the code cells
    pub fn language(&self) -> String {
        let from_kernelspec = self
            .metadata
            .get("kernelspec")
            .and_then(|k| k.get("language"))
            .and_then(Value::as_str);
        let from_language_info = self
            .metadata
            .get("language_info")
            .and_then(|l| l.get("name"))
            .and_then(Value::as_str);

        from_kernelspec
            .or(from_language_info)
            .filter(|l| !l.is_empty())
            .unwrap_or("python")
            .to_lowercase()
    }
}

/// Kind of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellKind {
    /// Executable code cell
    Code,
    /// Markdown documentation cell
    Markdown,
    /// Raw cell, passed through untouched
    Raw,
}

impl CellKind {
    /// Label shown in the cell header
    pub fn label(&self) -> &'static str {
        match self {
            CellKind::Code => "Code",
            CellKind::Markdown => "Markdown",
            CellKind::Raw => "Raw",
        }
    }

    /// Lowercase tag used in class names
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Code => "code",
            CellKind::Markdown => "markdown",
            CellKind::Raw => "raw",
        }
    }
}

/// One unit of a notebook
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// Per-load identity, never persisted
    #[serde(skip)]
    pub handle: CellId,

    /// Cell kind
    pub cell_type: CellKind,

    /// Source lines
    #[serde(default, deserialize_with = "deserialize_lines")]
    pub source: Vec<String>,

    /// Cell metadata
    #[serde(default)]
    pub metadata: JsonMap,

    /// Outputs, present for code cells only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<Output>>,

    /// Unrecognized fields (`id`, `execution_count`, `attachments`, ...)
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        self.cell_type == other.cell_type
            && self.source == other.source
            && self.metadata == other.metadata
            && self.outputs == other.outputs
            && self.extra == other.extra
    }
}

impl Cell {
    /// Create a cell with the given kind and source text
    pub fn new(cell_type: CellKind, source: &str) -> Self {
        Self {
            handle: CellId::new(),
            cell_type,
            source: split_source(source),
            metadata: JsonMap::new(),
            outputs: matches!(cell_type, CellKind::Code).then(Vec::new),
            extra: JsonMap::new(),
        }
    }

    /// Source as one string
    pub fn source_text(&self) -> String {
        join_lines(&self.source)
    }

    /// Replace the source with normalized lines from `text`
    pub fn set_source(&mut self, text: &str) {
        self.source = split_source(text);
    }

    /// Outputs of the cell (empty for non-code cells)
    pub fn outputs(&self) -> &[Output] {
        match (self.cell_type, &self.outputs) {
            (CellKind::Code, Some(outputs)) => outputs,
            _ => &[],
        }
    }

    /// Execution counter of a code cell, when it has run
    pub fn execution_count(&self) -> Option<i64> {
        self.extra.get("execution_count").and_then(Value::as_i64)
    }
}

/// Kind of an output record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// stdout/stderr text
    Stream,
    /// Result value of the cell
    ExecuteResult,
    /// Explicitly displayed rich data
    DisplayData,
    /// Exception with traceback
    Error,
    /// Anything else; renders nothing
    Unknown,
}

/// One result attached to a code cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Output {
    /// Raw output type tag, kept verbatim for unknown kinds
    pub output_type: String,

    /// Stream name (`stdout`, `stderr`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Stream text lines
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_opt_lines"
    )]
    pub text: Option<Vec<String>>,

    /// MIME bundle of rich outputs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonMap>,

    /// Metadata parallel to `data`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<JsonMap>,

    /// Exception name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ename: Option<String>,

    /// Exception value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evalue: Option<String>,

    /// Traceback lines
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<Vec<String>>,

    /// Unrecognized fields (`execution_count`, `transient`, ...)
    #[serde(flatten)]
    pub extra: JsonMap,
}

impl Output {
    /// Empty output of the given type
    pub fn new(output_type: impl Into<String>) -> Self {
        Self {
            output_type: output_type.into(),
            name: None,
            text: None,
            data: None,
            metadata: None,
            ename: None,
            evalue: None,
            traceback: None,
            extra: JsonMap::new(),
        }
    }

    /// Interpret the output type tag
    pub fn kind(&self) -> OutputKind {
        match self.output_type.as_str() {
            "stream" => OutputKind::Stream,
            "execute_result" => OutputKind::ExecuteResult,
            "display_data" => OutputKind::DisplayData,
            "error" => OutputKind::Error,
            _ => OutputKind::Unknown,
        }
    }

    /// Stream name, defaulting to stdout
    pub fn stream_name(&self) -> &str {
        self.name.as_deref().unwrap_or("stdout")
    }

    /// Stream text joined as-is
    pub fn stream_text(&self) -> Option<String> {
        self.text.as_deref().map(join_lines)
    }

    /// Text of a MIME payload stored as string or list of strings
    pub fn data_text(&self, mime: &str) -> Option<String> {
        self.data.as_ref()?.get(mime).and_then(value_text)
    }

    /// Whether the MIME bundle carries `mime`
    pub fn has_data(&self, mime: &str) -> bool {
        self.data
            .as_ref()
            .map(|d| d.contains_key(mime))
            .unwrap_or(false)
    }

    /// Raw MIME payload value
    pub fn data_value(&self, mime: &str) -> Option<&Value> {
        self.data.as_ref()?.get(mime)
    }

    /// Raw metadata value
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref()?.get(key)
    }
}
