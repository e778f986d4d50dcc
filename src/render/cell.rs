//! Cell rendering
//!
//! Builds the view fragment for one cell:
//!
//! ```text
//! div.nb-cell.nb-cell-{kind}[data-cell-id]
//!   div.nb-cell-header   label, prompt, edit button
//!   div.nb-cell-body     markdown | code + outputs | raw text
//! ```
//!
//! The same renderer produces the read-only digest used for embedded
//! notebooks, which drops the gutter, the edit button and the output toggle.

use super::highlight::highlight_code;
use super::output::{render_output, RenderContext};
use crate::dom::{Element, Node};
use crate::host::Host;
use crate::notebook::{Cell, CellKind};
use std::path::Path;

/// Label of the toggle while outputs are shown
pub const HIDE_OUTPUTS_LABEL: &str = "Hide outputs";
/// Label of the toggle while outputs are hidden
pub const SHOW_OUTPUTS_LABEL: &str = "Show outputs";
/// Class applied to a collapsed outputs region
pub const COLLAPSED_CLASS: &str = "nb-collapsed";

/// How a cell is presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellMode {
    /// Full view with gutter, edit affordance and output toggle
    Interactive,
    /// Read-only digest inside another document
    Digest {
        /// Whether outputs are rendered at all
        render_outputs: bool,
    },
}

/// Per-cell rendering parameters
#[derive(Debug, Clone, Copy)]
pub struct CellContext<'a> {
    /// Language of code cells
    pub language: &'a str,
    /// Document the cell belongs to
    pub source_path: &'a Path,
    /// Maximum height of the outputs region in pixels
    pub max_output_height: u32,
    /// Whether the code gutter is drawn
    pub show_line_numbers: bool,
    /// Whether outputs start collapsed
    pub outputs_collapsed: bool,
    pub mode: CellMode,
}

/// Renders cells using the host for markdown
pub struct CellRenderer<'h, H: Host> {
    host: &'h H,
}

impl<'h, H: Host> CellRenderer<'h, H> {
    pub fn new(host: &'h H) -> Self {
        Self { host }
    }

    /// Render a whole cell
    pub async fn render(
        &self,
        cell: &Cell,
        ctx: &CellContext<'_>,
        images: &mut RenderContext,
    ) -> Element {
        let mut el = Element::new("div")
            .class("nb-cell")
            .class(&format!("nb-cell-{}", cell.cell_type.as_str()));
        if ctx.mode == CellMode::Interactive {
            el.set_attr("data-cell-id", cell.handle.to_string());
        }
        el.push(render_header(cell, ctx.mode));
        el.push(self.render_body(cell, ctx, images).await);
        el
    }

    /// Render the body of a cell
    pub async fn render_body(
        &self,
        cell: &Cell,
        ctx: &CellContext<'_>,
        images: &mut RenderContext,
    ) -> Element {
        let body = Element::new("div").class("nb-cell-body");
        match cell.cell_type {
            CellKind::Markdown => {
                let nodes = self
                    .host
                    .render_markdown(&cell.source_text(), ctx.source_path)
                    .await;
                body.class("nb-markdown").children_from(nodes)
            }
            CellKind::Code => {
                let mut body = body.child(render_code(cell, ctx));
                if let Some(outputs) = render_outputs(cell, ctx, images) {
                    body.push(outputs);
                }
                body
            }
            CellKind::Raw => body.child(
                Element::new("pre")
                    .class("nb-raw")
                    .text(cell.source_text()),
            ),
        }
    }
}

fn render_header(cell: &Cell, mode: CellMode) -> Element {
    let mut header = Element::new("div").class("nb-cell-header").child(
        Element::new("span")
            .class("nb-cell-type")
            .text(cell.cell_type.label()),
    );
    if let Some(count) = cell.execution_count() {
        header.push(
            Element::new("span")
                .class("nb-prompt")
                .text(format!("[{}]", count)),
        );
    }
    if mode == CellMode::Interactive {
        header.push(
            Element::new("button")
                .class("nb-edit-button")
                .attr("data-action", "edit")
                .attr("title", "Edit cell")
                .text("Edit"),
        );
    }
    header
}

fn render_code(cell: &Cell, ctx: &CellContext<'_>) -> Element {
    let source = cell.source_text();
    let language = language_token(ctx.language);

    let code = Element::new("code")
        .class(&format!("language-{}", language))
        .children_from(highlight_code(&source, ctx.language));
    let pre = Element::new("pre").class("nb-code").child(code);

    let mut container = Element::new("div").class("nb-code-container");
    if ctx.mode == CellMode::Interactive && ctx.show_line_numbers {
        container.push(line_numbers(source.lines().count().max(1)));
    }
    container.push(pre);
    container
}

fn line_numbers(count: usize) -> Element {
    let spans = (1..=count).map(|n| Node::from(Element::new("span").text(n.to_string())));
    Element::new("div")
        .class("nb-line-numbers")
        .attr("aria-hidden", "true")
        .children_from(spans)
}

fn render_outputs(
    cell: &Cell,
    ctx: &CellContext<'_>,
    images: &mut RenderContext,
) -> Option<Element> {
    if let CellMode::Digest {
        render_outputs: false,
    } = ctx.mode
    {
        return None;
    }

    let rendered: Vec<Node> = cell
        .outputs()
        .iter()
        .filter_map(|output| render_output(output, images))
        .collect();
    if rendered.is_empty() {
        return None;
    }

    let region = Element::new("div")
        .class("nb-outputs")
        .attr("style", format!("max-height: {}px", ctx.max_output_height))
        .children_from(rendered);

    let mut wrapper = Element::new("div").class("nb-outputs-wrapper");
    if ctx.mode == CellMode::Interactive {
        wrapper.push(
            Element::new("button")
                .class("nb-outputs-toggle")
                .attr("data-action", "toggle-outputs")
                .text(HIDE_OUTPUTS_LABEL),
        );
    }
    wrapper.push(region);
    if ctx.mode == CellMode::Interactive && ctx.outputs_collapsed {
        set_outputs_collapsed(&mut wrapper, true);
    }
    Some(wrapper)
}

/// Show or hide the outputs region inside `el`; returns whether one was found
pub fn set_outputs_collapsed(el: &mut Element, collapsed: bool) -> bool {
    let Some(region) = el.find_by_class_mut("nb-outputs") else {
        return false;
    };
    if collapsed {
        region.add_class(COLLAPSED_CLASS);
    } else {
        region.remove_class(COLLAPSED_CLASS);
    }
    if let Some(toggle) = el.find_by_class_mut("nb-outputs-toggle") {
        let label = if collapsed {
            SHOW_OUTPUTS_LABEL
        } else {
            HIDE_OUTPUTS_LABEL
        };
        toggle.set_children(vec![Node::text(label)]);
        toggle.set_attr("aria-expanded", (!collapsed).to_string());
    }
    true
}

fn language_token(language: &str) -> String {
    language
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '+' { c } else { '_' })
        .collect()
}
