//! Entry point for applications embedding nbview
//!
//! The plugin claims the notebook file extension, creates a view per opened
//! notebook and expands notebook embeds in rendered markdown documents.

use crate::config::Config;
use crate::dom::Element;
use crate::embed::{EmbedRenderer, EmbedSummary};
use crate::host::Host;
use crate::utils::path::NOTEBOOK_EXTENSION;
use crate::view::NotebookView;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier of the notebook view type
pub const VIEW_TYPE: &str = "jupyter-notebook-view";

/// File extensions opened with the notebook view
pub const EXTENSIONS: &[&str] = &[NOTEBOOK_EXTENSION];

/// Command that reopens the current file in the notebook view
pub const OPEN_COMMAND_ID: &str = "open-in-notebook-view";

/// A command offered to the host's command list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub id: &'static str,
    pub name: &'static str,
}

const COMMANDS: &[Command] = &[Command {
    id: OPEN_COMMAND_ID,
    name: "Open current file as notebook",
}];

/// Registration of the notebook view with a host
pub struct NotebookPlugin<H: Host> {
    host: Arc<H>,
    config: Config,
}

impl<H: Host> NotebookPlugin<H> {
    pub fn new(host: Arc<H>, config: Config) -> Self {
        log::debug!("Registering {} for {:?}", VIEW_TYPE, EXTENSIONS);
        Self { host, config }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the configuration used for views created from now on
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    /// Whether a file is opened with the notebook view
    pub fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
            .unwrap_or(false)
    }

    /// Create an unopened view for a notebook file
    pub fn create_view(&self, path: impl Into<PathBuf>) -> NotebookView<H> {
        NotebookView::new(Arc::clone(&self.host), path, self.config.clone())
    }

    /// Commands registered with the host
    pub fn commands(&self) -> &'static [Command] {
        COMMANDS
    }

    /// Run the open command for the file currently shown by the host
    ///
    /// Returns `None` when the file is not a notebook.
    pub fn open_current(&self, path: &Path) -> Option<NotebookView<H>> {
        if !self.handles(path) {
            log::debug!("{} is not a notebook, ignoring {}", path.display(), OPEN_COMMAND_ID);
            return None;
        }
        Some(self.create_view(path))
    }

    /// Post-processing hook for rendered markdown documents
    pub async fn post_process(&self, root: &mut Element, source_path: &Path) -> EmbedSummary {
        EmbedRenderer::new(self.host.as_ref(), &self.config)
            .process(root, source_path)
            .await
    }
}
