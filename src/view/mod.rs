//! Notebook view controller
//!
//! A `NotebookView` owns the rendered tree of one notebook file and reacts
//! to user actions on it:
//! - Opening the file and rendering every cell
//! - Editing, saving and cancelling cell edits
//! - Collapsing and expanding outputs
//! - Following links and keeping the code gutter in step with scrolling
//! - Completing image loads queued while rendering

pub mod edit;

pub use edit::{EditSession, EditState, EditableCell};

use crate::config::Config;
use crate::dom::{Element, Node};
use crate::error::{AppResult, RenderError, SaveError};
use crate::host::{Host, Notice};
use crate::notebook::{self, CellId, Notebook};
use crate::render::image::{decode_image, ImageFormat};
use crate::render::styles::{self, VIEW_CLASS};
use crate::render::{
    complete_image_load, set_outputs_collapsed, CellContext, CellMode, CellRenderer, ImageLoad,
    RenderContext,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Message shown after a successful save
pub const SAVED_MESSAGE: &str = "Cell saved";

/// Controller for one open notebook
pub struct NotebookView<H: Host> {
    host: Arc<H>,
    path: PathBuf,
    config: Config,
    notebook: Option<Notebook>,
    root: Element,
    sessions: HashMap<CellId, EditSession>,
    collapsed: HashSet<CellId>,
    pending_images: Vec<ImageLoad>,
}

impl<H: Host> NotebookView<H> {
    /// Create an empty view for `path`
    pub fn new(host: Arc<H>, path: impl Into<PathBuf>, config: Config) -> Self {
        let path = path.into();
        let root = empty_root(&path, &config);
        Self {
            host,
            path,
            config,
            notebook: None,
            root,
            sessions: HashMap::new(),
            collapsed: HashSet::new(),
            pending_images: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn notebook(&self) -> Option<&Notebook> {
        self.notebook.as_ref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Edit session of a cell, if one is open
    pub fn session(&self, id: CellId) -> Option<&EditSession> {
        self.sessions.get(&id)
    }

    /// Image loads not yet completed
    pub fn pending_images(&self) -> &[ImageLoad] {
        &self.pending_images
    }

    /// Rendered element of a cell
    pub fn cell_element(&self, id: CellId) -> Option<&Element> {
        self.root.find_by_attr("data-cell-id", &id.to_string())
    }

    fn cell_element_mut(&mut self, id: CellId) -> Option<&mut Element> {
        self.root.find_by_attr_mut("data-cell-id", &id.to_string())
    }

    /// Read, parse and render the file
    ///
    /// A file that cannot be read or parsed leaves a visible error in the
    /// view; the error is also returned.
    pub async fn open(&mut self) -> AppResult<()> {
        self.sessions.clear();
        self.collapsed.clear();
        self.pending_images.clear();
        self.root = empty_root(&self.path, &self.config);

        let loaded: AppResult<Notebook> = match self.host.read_text(&self.path).await {
            Ok(content) => notebook::parse_str(&content).map_err(Into::into),
            Err(e) => Err(e.into()),
        };

        match loaded {
            Ok(nb) => {
                log::info!("Opened {} ({} cells)", self.path.display(), nb.cells.len());
                self.notebook = Some(nb);
                self.render_all().await;
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to open {}: {}", self.path.display(), e);
                self.notebook = None;
                if let Some(cells) = self.root.find_by_class_mut("nb-cells") {
                    cells.push(
                        Element::new("div")
                            .class("nb-load-error")
                            .text(format!("Failed to load notebook: {}", e)),
                    );
                }
                Err(e)
            }
        }
    }

    /// Drop the rendered tree and all sessions
    pub fn close(&mut self) {
        self.sessions.clear();
        self.collapsed.clear();
        self.pending_images.clear();
        self.notebook = None;
        self.root = empty_root(&self.path, &self.config);
    }

    async fn render_all(&mut self) {
        let Some(nb) = self.notebook.as_ref() else {
            return;
        };
        let language = nb.language();
        let renderer = CellRenderer::new(self.host.as_ref());
        let mut images = RenderContext::new();

        let mut rendered = Vec::with_capacity(nb.cells.len());
        for cell in &nb.cells {
            let ctx = self.cell_context(&language, self.collapsed.contains(&cell.handle));
            rendered.push(Node::from(renderer.render(cell, &ctx, &mut images).await));
        }

        if let Some(cells) = self.root.find_by_class_mut("nb-cells") {
            cells.set_children(rendered);
        }
        self.pending_images.extend(images.take_pending());
    }

    fn cell_context<'a>(&'a self, language: &'a str, outputs_collapsed: bool) -> CellContext<'a> {
        CellContext {
            language,
            source_path: &self.path,
            max_output_height: self.config.view.max_output_height,
            show_line_numbers: self.config.view.show_line_numbers,
            outputs_collapsed,
            mode: CellMode::Interactive,
        }
    }

    /// Replace a cell's body with an editor
    ///
    /// Returns false when the cell is unknown or already being edited.
    pub fn begin_edit(&mut self, id: CellId) -> bool {
        if self.sessions.contains_key(&id) {
            log::debug!("Cell {} is already being edited", id);
            return false;
        }
        let Some(cell) = self.notebook.as_ref().and_then(|nb| nb.cell(id)).cloned() else {
            log::warn!("Edit requested for unknown cell {}", id);
            return false;
        };
        let Some(el) = self.cell_element_mut(id) else {
            return false;
        };

        if let Some(button) = el.find_by_class_mut("nb-edit-button") {
            button.set_attr("disabled", "");
        }
        let Some(body) = el.find_by_class_mut("nb-cell-body") else {
            return false;
        };
        let original = body.clone();
        *body = Element::new("div")
            .class("nb-cell-body")
            .class("nb-editing")
            .child(edit::editor_element(&cell.source_text()));

        self.sessions.insert(id, EditSession::begin(&cell, original));
        log::debug!("Editing cell {}", id);
        true
    }

    /// Replace the text in a cell's editor
    pub fn set_editor_text(&mut self, id: CellId, text: &str) -> bool {
        if !self.sessions.contains_key(&id) {
            return false;
        }
        match self.cell_element_mut(id) {
            Some(el) => edit::set_editor_text(el, text),
            None => false,
        }
    }

    /// Current text in a cell's editor
    pub fn editor_text(&self, id: CellId) -> Option<String> {
        self.sessions.get(&id)?;
        self.cell_element(id).and_then(edit::editor_text)
    }

    /// Persist the editor text of a cell
    ///
    /// On failure the editor stays open with its text intact and an error
    /// notice is shown.
    pub async fn save_edit(&mut self, id: CellId) -> Result<(), SaveError> {
        let Some(session) = self.sessions.get_mut(&id) else {
            return Err(SaveError::NoSession);
        };
        session.transition(EditState::Saving);

        match self.persist_edit(id).await {
            Ok(()) => {
                if let Some(mut session) = self.sessions.remove(&id) {
                    session.transition(EditState::Viewing);
                }
                self.rerender_body(id).await;
                self.host.notify(Notice::success(SAVED_MESSAGE));
                Ok(())
            }
            Err(e) => {
                log::error!("Saving cell {} failed: {}", id, e);
                if let Some(session) = self.sessions.get_mut(&id) {
                    session.transition(EditState::Editing);
                }
                self.host.notify(Notice::error(e.user_message()));
                Err(e)
            }
        }
    }

    /// Re-read the file, patch the cell and write it back
    async fn persist_edit(&mut self, id: CellId) -> Result<(), SaveError> {
        let text = self.editor_text(id).ok_or(SaveError::NoSession)?;
        let index = self
            .notebook
            .as_ref()
            .and_then(|nb| nb.cell_index(id))
            .ok_or(SaveError::NoSession)?;

        let content = self
            .host
            .read_text(&self.path)
            .await
            .map_err(SaveError::Read)?;
        let mut fresh = notebook::parse_str(&content).map_err(SaveError::Parse)?;

        let cell = fresh
            .cells
            .get_mut(index)
            .ok_or(SaveError::CellMissing { index })?;
        cell.set_source(&text);

        let serialized = notebook::serialize(&fresh).map_err(SaveError::Serialize)?;
        self.host
            .write_text(&self.path, &serialized)
            .await
            .map_err(SaveError::Write)?;

        if let Some(previous) = self.notebook.as_ref() {
            fresh.adopt_handles(previous);
        }
        log::info!("Saved cell {} of {}", index, self.path.display());
        self.notebook = Some(fresh);
        Ok(())
    }

    /// Render a cell's body again from the in-memory notebook
    async fn rerender_body(&mut self, id: CellId) {
        let Some(nb) = self.notebook.as_ref() else {
            return;
        };
        let Some(cell) = nb.cell(id) else {
            return;
        };
        let language = nb.language();
        let renderer = CellRenderer::new(self.host.as_ref());
        let mut images = RenderContext::new();
        let ctx = self.cell_context(&language, self.collapsed.contains(&id));
        let body = renderer.render_body(cell, &ctx, &mut images).await;

        let Some(el) = self.cell_element_mut(id) else {
            log::debug!("Cell {} left the view before it could be re-rendered", id);
            return;
        };
        if let Some(old) = el.find_by_class_mut("nb-cell-body") {
            *old = body;
        }
        if let Some(button) = el.find_by_class_mut("nb-edit-button") {
            button.remove_attr("disabled");
        }
        self.pending_images.extend(images.take_pending());
    }

    /// Put a cell back exactly as it was before editing
    pub fn cancel_edit(&mut self, id: CellId) -> bool {
        let Some(mut session) = self.sessions.remove(&id) else {
            return false;
        };
        session.transition(EditState::Cancelled);
        session.transition(EditState::Viewing);
        let original = session.into_original_body();

        let Some(el) = self.cell_element_mut(id) else {
            return false;
        };
        if let Some(body) = el.find_by_class_mut("nb-cell-body") {
            *body = original;
        }
        if let Some(button) = el.find_by_class_mut("nb-edit-button") {
            button.remove_attr("disabled");
        }
        log::debug!("Cancelled edit of cell {}", id);
        true
    }

    /// Flip the outputs of a cell; returns the new collapsed state
    pub fn toggle_outputs(&mut self, id: CellId) -> Option<bool> {
        let collapsed = !self.collapsed.contains(&id);
        let el = self.cell_element_mut(id)?;
        if !set_outputs_collapsed(el, collapsed) {
            return None;
        }
        if collapsed {
            self.collapsed.insert(id);
        } else {
            self.collapsed.remove(&id);
        }
        Some(collapsed)
    }

    /// Whether a cell's outputs are collapsed
    pub fn outputs_collapsed(&self, id: CellId) -> bool {
        self.collapsed.contains(&id)
    }

    /// Hand a clicked link to the host
    pub fn click_link(&self, href: &str) {
        if href.trim().is_empty() {
            return;
        }
        self.host.open_link(href, &self.path);
    }

    /// Record the scroll offset of a code block and mirror it on the gutter
    pub fn scroll_code(&mut self, id: CellId, scroll_top: u32) -> bool {
        let Some(el) = self.cell_element_mut(id) else {
            return false;
        };
        let offset = scroll_top.to_string();
        let mut updated = false;
        el.for_each_mut(&mut |e: &mut Element| {
            if e.has_class("nb-code") || e.has_class("nb-line-numbers") {
                e.set_attr("data-scroll-top", offset.as_str());
                updated = true;
            }
        });
        updated
    }

    /// Decode every queued image and apply the result to its container
    ///
    /// Returns how many containers were updated.
    pub async fn load_images(&mut self) -> usize {
        let loads = std::mem::take(&mut self.pending_images);
        let mut applied = 0;
        for load in &loads {
            let result = decode_image(&load.data).map(|(_, format)| format);
            if self.apply_image_result(load, result) {
                applied += 1;
            }
            tokio::task::yield_now().await;
        }
        applied
    }

    /// Apply a finished image load; a container that is gone is ignored
    ///
    /// Bodies set aside by open edit sessions are updated too, so a
    /// cancelled edit never brings back a loading placeholder.
    pub fn apply_image_result(
        &mut self,
        load: &ImageLoad,
        result: Result<ImageFormat, RenderError>,
    ) -> bool {
        if complete_image_load(&mut self.root, load, result.clone()) {
            return true;
        }
        self.sessions
            .values_mut()
            .any(|session| complete_image_load(session.original_body_mut(), load, result.clone()))
    }
}

fn empty_root(path: &Path, config: &Config) -> Element {
    Element::new("div")
        .class(VIEW_CLASS)
        .attr("data-path", path.display().to_string())
        .child(styles::stylesheet(config.view.max_output_height))
        .child(Element::new("div").class("nb-cells"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileError;
    use crate::host::{LocalHost, NoticeKind};
    use crate::render::cell::COLLAPSED_CLASS;
    use tempfile::TempDir;

    const NOTEBOOK: &str = r##"{
 "cells": [
  {
   "cell_type": "markdown",
   "id": "intro",
   "metadata": {},
   "source": ["# Intro\n", "See [[other.ipynb]]"]
  },
  {
   "cell_type": "code",
   "execution_count": 1,
   "id": "calc",
   "metadata": {"tags": ["keep"]},
   "outputs": [
    {"name": "stdout", "output_type": "stream", "text": ["2\n"]},
    {
     "data": {"text/plain": ["<Figure size 640x480 with 1 Axes>"]},
     "metadata": {"image/png": "iVBORw0KGgo="},
     "output_type": "display_data"
    }
   ],
   "source": ["x = 1\n", "print(x + 1)"]
  }
 ],
 "metadata": {"kernelspec": {"language": "python", "name": "python3"}},
 "nbformat": 4,
 "nbformat_minor": 5
}
"##;

    async fn open_view() -> (TempDir, PathBuf, NotebookView<LocalHost>) {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("test.ipynb");
        std::fs::write(&path, NOTEBOOK).unwrap();
        let mut view = NotebookView::new(Arc::new(LocalHost::new()), &path, Config::default());
        view.open().await.unwrap();
        (temp, path, view)
    }

    fn code_cell_id(view: &NotebookView<LocalHost>) -> CellId {
        view.notebook().unwrap().cells[1].handle
    }

    #[tokio::test]
    async fn test_open_renders_cells() {
        let (_temp, _path, view) = open_view().await;
        let root = view.root();
        assert!(root.has_class(VIEW_CLASS));
        assert_eq!(root.count_tag("style"), 1);
        assert_eq!(root.find_all(&|e: &Element| e.has_class("nb-cell")).len(), 2);
        assert_eq!(root.count_tag("h1"), 1);
        assert!(root.find_by_class("internal-link").is_some());
        assert_eq!(view.pending_images().len(), 1);
    }

    #[tokio::test]
    async fn test_open_invalid_file_shows_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.ipynb");
        std::fs::write(&path, "{ not json").unwrap();
        let mut view = NotebookView::new(Arc::new(LocalHost::new()), &path, Config::default());

        assert!(view.open().await.is_err());
        let error = view.root().find_by_class("nb-load-error").unwrap();
        assert!(error.text_content().starts_with("Failed to load notebook"));
        assert!(view.notebook().is_none());
    }

    #[tokio::test]
    async fn test_save_round_trip() {
        let (_temp, path, mut view) = open_view().await;
        let id = code_cell_id(&view);

        assert!(view.begin_edit(id));
        assert_eq!(view.editor_text(id).as_deref(), Some("x = 1\nprint(x + 1)"));
        assert!(view.set_editor_text(id, "y = 2\nprint(y)\n"));
        view.save_edit(id).await.unwrap();

        let stored = notebook::parse_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored.cells[1].source, vec!["y = 2\n", "print(y)\n"]);
        assert_eq!(stored.cells[1].extra.get("id"), Some(&serde_json::json!("calc")));
        assert_eq!(stored.cells[1].outputs().len(), 2);
        assert_eq!(stored.cells[0].source_text(), "# Intro\nSee [[other.ipynb]]");

        assert!(view.session(id).is_none());
        assert_eq!(view.notebook().unwrap().cells[1].handle, id);
        let el = view.cell_element(id).unwrap();
        assert!(el.find_by_class("nb-editor").is_none());
        assert_eq!(
            el.find(&|e: &Element| e.tag() == "code").unwrap().text_content(),
            "y = 2\nprint(y)\n"
        );
        assert_eq!(el.find_by_class("nb-edit-button").unwrap().get_attr("disabled"), None);

        let notices = view.host.notices();
        assert_eq!(notices.last().unwrap().kind, NoticeKind::Success);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_editor_open() {
        let (_temp, path, mut view) = open_view().await;
        let id = code_cell_id(&view);

        assert!(view.begin_edit(id));
        view.set_editor_text(id, "changed");
        std::fs::remove_file(&path).unwrap();

        let err = view.save_edit(id).await.unwrap_err();
        assert!(matches!(err, SaveError::Read(_)));
        assert_eq!(view.session(id).unwrap().state(), EditState::Editing);
        assert_eq!(view.editor_text(id).as_deref(), Some("changed"));

        let notice = view.host.notices().pop().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(notice.message.starts_with("Failed to save cell"));
    }

    #[tokio::test]
    async fn test_cancel_restores_body() {
        let (_temp, path, mut view) = open_view().await;
        let id = code_cell_id(&view);
        let before = view.cell_element(id).unwrap().clone();
        let on_disk = std::fs::read_to_string(&path).unwrap();

        assert!(view.begin_edit(id));
        assert!(!view.begin_edit(id));
        let editing = view.cell_element(id).unwrap();
        assert!(editing.find_by_class("nb-editor").is_some());
        assert!(editing.find_by_class("nb-edit-button").unwrap().get_attr("disabled").is_some());

        view.set_editor_text(id, "discarded");
        assert!(view.cancel_edit(id));
        assert_eq!(view.cell_element(id).unwrap(), &before);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), on_disk);
        assert!(!view.cancel_edit(id));
    }

    #[tokio::test]
    async fn test_save_without_session() {
        let (_temp, _path, mut view) = open_view().await;
        let id = code_cell_id(&view);
        assert!(matches!(view.save_edit(id).await, Err(SaveError::NoSession)));
    }

    #[tokio::test]
    async fn test_toggle_survives_save() {
        let (_temp, _path, mut view) = open_view().await;
        let id = code_cell_id(&view);

        assert_eq!(view.toggle_outputs(id), Some(true));
        assert!(view.outputs_collapsed(id));

        view.begin_edit(id);
        view.save_edit(id).await.unwrap();
        let region = view.cell_element(id).unwrap().find_by_class("nb-outputs").unwrap();
        assert!(region.has_class(COLLAPSED_CLASS));

        assert_eq!(view.toggle_outputs(id), Some(false));
        let region = view.cell_element(id).unwrap().find_by_class("nb-outputs").unwrap();
        assert!(!region.has_class(COLLAPSED_CLASS));

        let markdown = view.notebook().unwrap().cells[0].handle;
        assert_eq!(view.toggle_outputs(markdown), None);
    }

    #[tokio::test]
    async fn test_load_images() {
        let (_temp, _path, mut view) = open_view().await;
        assert_eq!(view.load_images().await, 1);
        assert!(view.pending_images().is_empty());

        let img = view.root().find(&|e: &Element| e.tag() == "img").unwrap();
        assert!(img.has_class("nb-image-loaded"));
        assert!(!img.has_class("nb-image-loading"));
        assert!(view.root().find_by_class("nb-image-placeholder").is_none());
    }

    #[tokio::test]
    async fn test_image_failure_and_stale_load() {
        let (_temp, _path, mut view) = open_view().await;
        let load = view.pending_images()[0].clone();

        assert!(view.apply_image_result(&load, Err(RenderError::ImageDecode("bad".into()))));
        assert!(view.root().find_by_class("nb-image-error").is_some());

        view.close();
        assert!(!view.apply_image_result(&load, Ok(ImageFormat::Png)));
        assert_eq!(view.load_images().await, 0);
    }

    #[tokio::test]
    async fn test_image_completes_while_editing() {
        let (_temp, _path, mut view) = open_view().await;
        let id = code_cell_id(&view);

        assert!(view.begin_edit(id));
        assert_eq!(view.load_images().await, 1);
        assert!(view.cancel_edit(id));

        let el = view.cell_element(id).unwrap();
        assert!(el.find_by_class("nb-image-placeholder").is_none());
        let img = el.find(&|e: &Element| e.tag() == "img").unwrap();
        assert!(img.has_class("nb-image-loaded"));
        assert!(!img.has_class("nb-image-loading"));
    }

    fn latin1_notebook() -> Vec<u8> {
        let mut bytes = NOTEBOOK.as_bytes().to_vec();
        let at = NOTEBOOK.find("Intro").unwrap();
        bytes[at] = 0xE9;
        bytes
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_not_opened() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("latin1.ipynb");
        std::fs::write(&path, latin1_notebook()).unwrap();
        let mut view = NotebookView::new(Arc::new(LocalHost::new()), &path, Config::default());

        assert!(view.open().await.is_err());
        assert!(view.root().find_by_class("nb-load-error").is_some());
        assert!(view.notebook().is_none());
    }

    #[tokio::test]
    async fn test_save_refuses_invalid_utf8_on_disk() {
        let (_temp, path, mut view) = open_view().await;
        let id = code_cell_id(&view);
        std::fs::write(&path, latin1_notebook()).unwrap();

        assert!(view.begin_edit(id));
        view.set_editor_text(id, "changed");
        let err = view.save_edit(id).await.unwrap_err();
        assert!(matches!(err, SaveError::Read(FileError::InvalidEncoding { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), latin1_notebook());
        assert_eq!(view.editor_text(id).as_deref(), Some("changed"));
    }

    #[tokio::test]
    async fn test_reopen_forgets_collapsed_cells() {
        let (_temp, _path, mut view) = open_view().await;
        let id = code_cell_id(&view);
        view.toggle_outputs(id);
        assert!(view.outputs_collapsed(id));

        view.open().await.unwrap();
        assert!(!view.outputs_collapsed(id));
        assert!(view.collapsed.is_empty());
    }

    #[tokio::test]
    async fn test_click_link_and_scroll() {
        let (_temp, path, mut view) = open_view().await;
        view.click_link("other.ipynb");
        assert_eq!(
            view.host.navigations(),
            vec![crate::host::Navigation::Internal(
                path.parent().unwrap().join("other.ipynb")
            )]
        );

        let id = code_cell_id(&view);
        assert!(view.scroll_code(id, 42));
        let el = view.cell_element(id).unwrap();
        assert_eq!(
            el.find_by_class("nb-line-numbers").unwrap().get_attr("data-scroll-top"),
            Some("42")
        );
    }
}
