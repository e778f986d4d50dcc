//! HTML export
//!
//! Wraps a rendered view tree in a standalone HTML document. The view's own
//! scoped stylesheet travels with it, so the exported page looks like the
//! view.

use crate::config::Config;
use crate::dom::{escape_html, Element, Node};
use crate::error::FileResult;
use crate::file_handler::write_file_atomic;
use crate::render::styles::{self, STYLE_MARKER, VIEW_CLASS};
use std::path::{Path, PathBuf};

/// Extension of exported files
pub const HTML_EXTENSION: &str = "html";

/// Options for HTML export
#[derive(Debug, Clone)]
pub struct HtmlExportOptions {
    /// Document title
    pub title: Option<String>,
    /// Keep the view stylesheet
    pub include_styles: bool,
    /// Custom CSS appended after the view stylesheet
    pub custom_css: Option<String>,
}

impl Default for HtmlExportOptions {
    fn default() -> Self {
        Self {
            title: None,
            include_styles: true,
            custom_css: None,
        }
    }
}

/// Serialize a view tree into a full HTML document
pub fn export_html(root: &Element, options: &HtmlExportOptions) -> String {
    let mut body = root.clone();
    if !options.include_styles {
        body.for_each_mut(&mut |el: &mut Element| {
            el.children_mut().retain(|n| {
                !matches!(n, Node::Element(e) if e.get_attr(STYLE_MARKER).is_some())
            });
        });
    }

    let custom = options
        .custom_css
        .as_deref()
        .map(|css| format!("<style>{}</style>", css))
        .unwrap_or_default();
    let title = options.title.as_deref().unwrap_or("Notebook");

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="nbview">
    <title>{}</title>
    {}
</head>
<body>
{}
</body>
</html>
"#,
        escape_html(title),
        custom,
        body.to_html()
    )
}

/// View-like root for a rendered markdown document
pub fn markdown_root(nodes: Vec<Node>, source_path: &Path, config: &Config) -> Element {
    Element::new("div")
        .class(VIEW_CLASS)
        .class("nb-markdown-document")
        .attr("data-path", source_path.display().to_string())
        .child(styles::stylesheet(config.view.max_output_height))
        .children_from(nodes)
}

/// Default output path next to the input: `dir/name.ipynb` -> `dir/name.html`
pub fn suggest_output_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("notebook");

    let mut output = input_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_default();

    output.push(format!("{}.{}", stem, HTML_EXTENSION));
    output
}

/// Export a view tree to an HTML file
pub async fn export_to_file(
    root: &Element,
    output_path: &Path,
    options: &HtmlExportOptions,
) -> FileResult<()> {
    let html = export_html(root, options);
    write_file_atomic(output_path, &html).await?;
    log::info!("Exported {}", output_path.display());
    Ok(())
}
