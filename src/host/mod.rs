//! Host services used by notebook views
//!
//! A view never touches the file system, the markdown engine or the user's
//! navigation directly. It goes through the `Host` trait, which is the seam
//! between nbview and whatever application embeds it.

pub mod local;
pub mod markdown;

pub use local::{LocalHost, Navigation};

use crate::dom::Node;
use crate::error::FileResult;
use std::future::Future;
use std::path::Path;

/// Kind of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A short message shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

/// Services provided by the embedding application
///
/// The async methods are the only suspension points of a view. They run on
/// a single-threaded executor, so the returned futures need not be `Send`.
pub trait Host {
    /// Read a document as text
    fn read_text(&self, path: &Path) -> impl Future<Output = FileResult<String>>;

    /// Replace a document's text
    fn write_text(&self, path: &Path, content: &str) -> impl Future<Output = FileResult<()>>;

    /// Render markdown into view nodes
    ///
    /// Links to other documents are marked `a.internal-link[data-href]` and
    /// embed references become `span.internal-embed[src]` markers.
    fn render_markdown(&self, markdown: &str, source_path: &Path)
        -> impl Future<Output = Vec<Node>>;

    /// Navigate to a link target found in `source_path`
    fn open_link(&self, target: &str, source_path: &Path);

    /// Show a transient notice
    fn notify(&self, notice: Notice);
}
