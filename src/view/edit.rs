//! In-place cell editing
//!
//! An edit session lives from the click on a cell's edit button until the
//! edit is saved or cancelled. It owns the snapshot needed to put the cell
//! back exactly as it was.

use crate::dom::{Element, Node};
use crate::notebook::{Cell, CellId, CellKind, Output};

/// Label of the save button
pub const SAVE_LABEL: &str = "Save";
/// Label of the cancel button
pub const CANCEL_LABEL: &str = "Cancel";

/// Lifecycle of an edit session
///
/// ```text
/// Viewing -> Editing -> Saving -> Viewing
///                  \         \-> Editing (save failed)
///                   \-> Cancelled -> Viewing
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    Viewing,
    Editing,
    Saving,
    Cancelled,
}

impl EditState {
    /// Whether moving to `next` is allowed
    pub fn can_move_to(self, next: EditState) -> bool {
        use EditState::*;
        matches!(
            (self, next),
            (Viewing, Editing)
                | (Editing, Saving)
                | (Editing, Cancelled)
                | (Saving, Viewing)
                | (Saving, Editing)
                | (Cancelled, Viewing)
        )
    }
}

/// Snapshot of a cell taken when editing starts
#[derive(Debug, Clone, PartialEq)]
pub struct EditableCell {
    pub kind: CellKind,
    pub source: String,
    pub outputs: Vec<Output>,
}

impl From<&Cell> for EditableCell {
    fn from(cell: &Cell) -> Self {
        Self {
            kind: cell.cell_type,
            source: cell.source_text(),
            outputs: cell.outputs().to_vec(),
        }
    }
}

/// One open editor
#[derive(Debug, Clone)]
pub struct EditSession {
    cell: CellId,
    state: EditState,
    snapshot: EditableCell,
    original_body: Element,
}

impl EditSession {
    /// Start editing `cell`, remembering its rendered body
    pub fn begin(cell: &Cell, original_body: Element) -> Self {
        Self {
            cell: cell.handle,
            state: EditState::Editing,
            snapshot: EditableCell::from(cell),
            original_body,
        }
    }

    pub fn cell(&self) -> CellId {
        self.cell
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn snapshot(&self) -> &EditableCell {
        &self.snapshot
    }

    /// Body as it was before the editor replaced it
    pub fn original_body(&self) -> &Element {
        &self.original_body
    }

    pub(crate) fn original_body_mut(&mut self) -> &mut Element {
        &mut self.original_body
    }

    /// Move to `next`; returns false and stays put if the move is invalid
    pub fn transition(&mut self, next: EditState) -> bool {
        if !self.state.can_move_to(next) {
            log::warn!(
                "Ignoring edit transition {:?} -> {:?} for cell {}",
                self.state,
                next,
                self.cell
            );
            return false;
        }
        self.state = next;
        true
    }

    /// Finish the session, handing back the original body
    pub fn into_original_body(self) -> Element {
        self.original_body
    }
}

/// Build the editor shown in place of a cell body
pub fn editor_element(source: &str) -> Element {
    Element::new("div")
        .class("nb-editor")
        .child(
            Element::new("textarea")
                .class("nb-editor-input")
                .attr("spellcheck", "false")
                .text(source),
        )
        .child(
            Element::new("div")
                .class("nb-editor-actions")
                .child(
                    Element::new("button")
                        .class("nb-editor-save")
                        .attr("data-action", "save")
                        .text(SAVE_LABEL),
                )
                .child(
                    Element::new("button")
                        .class("nb-editor-cancel")
                        .attr("data-action", "cancel")
                        .text(CANCEL_LABEL),
                ),
        )
}

/// Text currently in the editor inside `el`
pub fn editor_text(el: &Element) -> Option<String> {
    el.find_by_class("nb-editor-input").map(Element::text_content)
}

/// Replace the text of the editor inside `el`
pub fn set_editor_text(el: &mut Element, text: &str) -> bool {
    match el.find_by_class_mut("nb-editor-input") {
        Some(input) => {
            input.set_children(vec![Node::text(text)]);
            true
        }
        None => false,
    }
}
