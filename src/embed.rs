//! Notebook embeds in markdown documents
//!
//! After a markdown document is rendered, every `span.internal-embed`
//! marker pointing at a notebook is filled with a read-only digest of that
//! notebook. Each marker is handled on its own: a notebook that cannot be
//! loaded or parsed leaves an inline error in its marker and the others are
//! still rendered.

use crate::config::Config;
use crate::dom::{Element, Node};
use crate::error::EmbedError;
use crate::host::markdown::EMBED_CLASS;
use crate::host::Host;
use crate::notebook;
use crate::render::{complete_image_loads, CellContext, CellMode, CellRenderer, RenderContext};
use crate::utils::path::{file_stem, is_notebook, resolve_link};
use std::path::Path;

/// Attribute numbering markers while a document is processed
const MARKER_INDEX_ATTR: &str = "data-embed-index";

/// Outcome of processing one document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbedSummary {
    pub rendered: usize,
    pub failed: usize,
}

/// Whether an element is a notebook embed marker
pub fn is_notebook_embed(el: &Element) -> bool {
    el.tag() == "span"
        && el.has_class(EMBED_CLASS)
        && el
            .get_attr("src")
            .map(|src| is_notebook(Path::new(strip_fragment(src))))
            .unwrap_or(false)
}

fn strip_fragment(src: &str) -> &str {
    src.split(['#', '^']).next().unwrap_or(src).trim()
}

/// Fills notebook embed markers with digests
pub struct EmbedRenderer<'h, H: Host> {
    host: &'h H,
    config: &'h Config,
}

impl<'h, H: Host> EmbedRenderer<'h, H> {
    pub fn new(host: &'h H, config: &'h Config) -> Self {
        Self { host, config }
    }

    /// Expand every notebook embed under `root`
    ///
    /// `source_path` is the markdown document; embed targets are resolved
    /// relative to it.
    pub async fn process(&self, root: &mut Element, source_path: &Path) -> EmbedSummary {
        let mut targets = Vec::new();
        root.for_each_mut(&mut |el: &mut Element| {
            if is_notebook_embed(el) {
                el.set_attr(MARKER_INDEX_ATTR, targets.len().to_string());
                targets.push(el.get_attr("src").unwrap_or_default().to_string());
            }
        });

        let mut summary = EmbedSummary::default();
        for (index, src) in targets.iter().enumerate() {
            let content = match self.render_embed(src, source_path).await {
                Ok(digest) => {
                    summary.rendered += 1;
                    digest
                }
                Err(e) => {
                    log::warn!("Embed {:?} in {} failed: {}", src, source_path.display(), e);
                    summary.failed += 1;
                    error_element(src, &e)
                }
            };

            if let Some(marker) = root.find_by_attr_mut(MARKER_INDEX_ATTR, &index.to_string()) {
                marker.remove_attr(MARKER_INDEX_ATTR);
                marker.set_children(vec![Node::from(content)]);
            }
        }

        if !targets.is_empty() {
            log::debug!(
                "Processed {} notebook embeds in {} ({} failed)",
                targets.len(),
                source_path.display(),
                summary.failed
            );
        }
        summary
    }

    /// Load one embedded notebook and build its digest
    pub async fn render_embed(&self, src: &str, source_path: &Path) -> Result<Element, EmbedError> {
        let path = resolve_link(source_path, src);
        let content = self
            .host
            .read_text(&path)
            .await
            .map_err(|source| EmbedError::Load {
                path: path.clone(),
                source,
            })?;
        let nb = notebook::parse_str(&content).map_err(|source| EmbedError::Parse {
            path: path.clone(),
            source,
        })?;

        let language = nb.language();
        let ctx = CellContext {
            language: &language,
            source_path: &path,
            max_output_height: self.config.view.max_output_height,
            show_line_numbers: false,
            outputs_collapsed: false,
            mode: CellMode::Digest {
                render_outputs: self.config.embed.render_outputs,
            },
        };
        let renderer = CellRenderer::new(self.host);
        let mut images = RenderContext::new();

        let title = file_stem(&path).unwrap_or_else(|| src.to_string());
        let mut digest = Element::new("div")
            .class("nb-embed")
            .attr("data-src", src)
            .child(Element::new("div").class("nb-embed-title").text(title));
        for cell in &nb.cells {
            digest.push(renderer.render(cell, &ctx, &mut images).await);
        }

        complete_image_loads(&mut digest, &images.take_pending());
        Ok(digest)
    }
}

fn error_element(src: &str, err: &EmbedError) -> Element {
    Element::new("div")
        .class("nb-embed-error")
        .attr("data-src", src)
        .text(format!("Failed to embed {}: {}", src, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalHost;
    use tempfile::TempDir;

    const EMBEDDED: &str = r###"{
 "cells": [
  {"cell_type": "markdown", "metadata": {}, "source": "## Analysis"},
  {
   "cell_type": "code",
   "execution_count": 2,
   "metadata": {},
   "outputs": [{"name": "stdout", "output_type": "stream", "text": "42\n"}],
   "source": "print(6 * 7)"
  }
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5
}"###;

    fn marker(src: &str) -> Element {
        Element::new("span").class(EMBED_CLASS).attr("src", src)
    }

    fn setup() -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("good.ipynb"), EMBEDDED).unwrap();
        std::fs::write(temp.path().join("bad.ipynb"), "{ nope").unwrap();
        let doc = temp.path().join("notes.md");
        (temp, doc)
    }

    #[test]
    fn test_marker_detection() {
        assert!(is_notebook_embed(&marker("a.ipynb")));
        assert!(is_notebook_embed(&marker("dir/A.IPYNB#cell")));
        assert!(!is_notebook_embed(&marker("image.png")));
        assert!(!is_notebook_embed(&Element::new("div").class(EMBED_CLASS).attr("src", "a.ipynb")));
    }

    #[tokio::test]
    async fn test_failing_embed_does_not_affect_sibling() {
        let (_temp, doc) = setup();
        let host = LocalHost::new();
        let config = Config::default();
        let mut root = Element::new("div")
            .child(Element::new("p").child(marker("bad.ipynb")))
            .child(Element::new("p").child(marker("good.ipynb")))
            .child(marker("missing.ipynb"));

        let summary = EmbedRenderer::new(&host, &config).process(&mut root, &doc).await;
        assert_eq!(summary, EmbedSummary { rendered: 1, failed: 2 });

        let errors = root.find_all(&|e: &Element| e.has_class("nb-embed-error"));
        assert_eq!(errors.len(), 2);
        assert!(errors[0].text_content().contains("bad.ipynb"));

        let digest = root.find_by_class("nb-embed").unwrap();
        assert_eq!(digest.find_by_class("nb-embed-title").unwrap().text_content(), "good");
        assert_eq!(digest.count_tag("h2"), 1);
        assert_eq!(digest.find_by_class("nb-stream").unwrap().text_content(), "42\n");
        assert!(digest.find_by_class("nb-edit-button").is_none());
        assert!(digest.find_by_class("nb-line-numbers").is_none());
        assert!(digest.find_by_class("nb-outputs-toggle").is_none());
        assert!(root.find_by_attr("data-embed-index", "0").is_none());
    }

    #[tokio::test]
    async fn test_outputs_can_be_disabled() {
        let (_temp, doc) = setup();
        let host = LocalHost::new();
        let mut config = Config::default();
        config.embed.render_outputs = false;
        let mut root = Element::new("div").child(marker("good.ipynb"));

        EmbedRenderer::new(&host, &config).process(&mut root, &doc).await;
        let digest = root.find_by_class("nb-embed").unwrap();
        assert!(digest.find_by_class("nb-outputs").is_none());
        assert_eq!(digest.find_by_class("nb-prompt").unwrap().text_content(), "[2]");
    }

    #[tokio::test]
    async fn test_non_notebook_markers_untouched() {
        let (_temp, doc) = setup();
        let host = LocalHost::new();
        let config = Config::default();
        let mut root = Element::new("div").child(marker("picture.png"));
        let before = root.clone();

        let summary = EmbedRenderer::new(&host, &config).process(&mut root, &doc).await;
        assert_eq!(summary, EmbedSummary::default());
        assert_eq!(root, before);
    }
}
