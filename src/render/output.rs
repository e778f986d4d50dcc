//! Output rendering
//!
//! Turns one output record into at most one view fragment, dispatching on
//! the output kind and, for rich outputs, on the MIME keys present.

use super::image::{decode_image, looks_like_image_handle, ImageFormat, ImageSearch, LocatedImage};
use super::sanitize::sanitize_html;
use crate::dom::{Element, Node};
use crate::error::RenderError;
use crate::notebook::{
    Output, OutputKind, MIME_HTML, MIME_JPEG, MIME_JSON, MIME_PNG, MIME_SVG, MIME_TEXT,
};
use crate::utils::text::strip_ansi;
use base64::Engine;
use uuid::Uuid;

/// Text shown when an image-like output carries no image bytes
pub const IMAGE_MISSING_TEXT: &str = "Image data not available";

/// Text shown while an image is being loaded
pub const IMAGE_LOADING_TEXT: &str = "Loading image…";

/// An image waiting for load completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLoad {
    /// Value of the container's `data-image-id` attribute
    pub id: String,
    /// MIME type the payload was found under
    pub mime: &'static str,
    /// Base64 payload to decode
    pub data: String,
}

/// Shared state for rendering outputs
pub struct RenderContext {
    images: ImageSearch,
    pending: Vec<ImageLoad>,
}

impl RenderContext {
    /// Context with the default image search
    pub fn new() -> Self {
        Self::with_image_search(ImageSearch::default())
    }

    /// Context with a custom image search
    pub fn with_image_search(images: ImageSearch) -> Self {
        Self {
            images,
            pending: Vec::new(),
        }
    }

    /// Image loads registered since the last call
    pub fn take_pending(&mut self) -> Vec<ImageLoad> {
        std::mem::take(&mut self.pending)
    }

    fn image_element(&mut self, image: LocatedImage) -> Element {
        let id = Uuid::new_v4().to_string();
        let element = Element::new("div")
            .class("nb-image-container")
            .attr("data-image-id", id.clone())
            .child(
                Element::new("div")
                    .class("nb-image-placeholder")
                    .text(IMAGE_LOADING_TEXT),
            )
            .child(
                Element::new("img")
                    .class("nb-image")
                    .class("nb-image-loading")
                    .attr("src", image.data_url())
                    .attr("alt", "Output image"),
            );
        self.pending.push(ImageLoad {
            id,
            mime: image.mime,
            data: image.base64,
        });
        element
    }
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a finished image load to its container under `root`
///
/// Returns false when the container is gone, which happens when the view
/// was closed or the cell re-rendered while the image was loading.
pub fn complete_image_load(
    root: &mut Element,
    load: &ImageLoad,
    result: Result<ImageFormat, RenderError>,
) -> bool {
    let Some(container) = root.find_by_attr_mut("data-image-id", &load.id) else {
        log::debug!("Image {} has no container any more", load.id);
        return false;
    };

    match result {
        Ok(format) => {
            container.children_mut().retain(
                |n| !matches!(n, Node::Element(e) if e.has_class("nb-image-placeholder")),
            );
            if let Some(img) = container.find_mut(&|e: &Element| e.tag() == "img") {
                img.remove_class("nb-image-loading");
                img.add_class("nb-image-loaded");
                if format.mime() != load.mime {
                    img.set_attr("src", format!("data:{};base64,{}", format.mime(), load.data));
                }
            }
        }
        Err(e) => {
            log::warn!("Image {} failed to load: {}", load.id, e);
            container.set_children(vec![Node::from(
                Element::new("div").class("nb-image-error").text(e.to_string()),
            )]);
        }
    }
    true
}

/// Decode and apply every load in `loads`; returns how many were applied
pub fn complete_image_loads(root: &mut Element, loads: &[ImageLoad]) -> usize {
    let mut applied = 0;
    for load in loads {
        let result = decode_image(&load.data).map(|(_, format)| format);
        if complete_image_load(root, load, result) {
            applied += 1;
        }
    }
    applied
}

/// Render one output; `None` when nothing is recognizable
pub fn render_output(output: &Output, ctx: &mut RenderContext) -> Option<Node> {
    let rendered = match output.kind() {
        OutputKind::Stream => render_stream(output),
        OutputKind::ExecuteResult | OutputKind::DisplayData => render_rich(output, ctx),
        OutputKind::Error => render_error(output),
        OutputKind::Unknown => {
            log::debug!("Skipping output of type {:?}", output.output_type);
            None
        }
    };
    rendered.map(Node::from)
}

fn render_stream(output: &Output) -> Option<Element> {
    let text = output.stream_text()?;
    let name = output.stream_name();
    Some(
        Element::new("pre")
            .class("nb-output")
            .class("nb-stream")
            .class(&format!("nb-stream-{}", css_token(name)))
            .attr("data-stream", name)
            .text(text),
    )
}

fn render_rich(output: &Output, ctx: &mut RenderContext) -> Option<Element> {
    let plain = output.data_text(MIME_TEXT);

    if plain.as_deref().map(looks_like_image_handle).unwrap_or(false) {
        let body = match ctx.images.locate(output) {
            Ok(image) => ctx.image_element(image),
            Err(e) => {
                log::debug!("Image-like output without payload: {}", e);
                Element::new("div")
                    .class("nb-image-missing")
                    .text(IMAGE_MISSING_TEXT)
            }
        };
        return Some(rich_wrapper("nb-image-output").child(body));
    }

    if let Some(html) = output.data_text(MIME_HTML) {
        return Some(rich_wrapper("nb-html").children_from(sanitize_html(&html)));
    }

    for mime in [MIME_PNG, MIME_JPEG] {
        if let Some(payload) = output.data_text(mime) {
            let image = LocatedImage {
                mime,
                base64: payload.chars().filter(|c| !c.is_whitespace()).collect(),
            };
            let body = ctx.image_element(image);
            return Some(rich_wrapper("nb-image-output").child(body));
        }
    }

    if let Some(svg) = output.data_text(MIME_SVG) {
        let image = LocatedImage {
            mime: MIME_SVG,
            base64: base64::engine::general_purpose::STANDARD.encode(svg.as_bytes()),
        };
        let body = ctx.image_element(image);
        return Some(rich_wrapper("nb-image-output").child(body));
    }

    if let Some(text) = plain {
        return Some(
            Element::new("pre")
                .class("nb-output")
                .class("nb-text")
                .text(text),
        );
    }

    if let Some(json) = output.data_value(MIME_JSON) {
        let pretty = serde_json::to_string_pretty(json).unwrap_or_else(|_| json.to_string());
        return Some(
            Element::new("pre")
                .class("nb-output")
                .class("nb-json")
                .text(pretty),
        );
    }

    None
}

fn render_error(output: &Output) -> Option<Element> {
    let header = match (output.ename.as_deref(), output.evalue.as_deref()) {
        (Some(name), Some(value)) => Some(format!("{}: {}", name, value)),
        (Some(single), None) | (None, Some(single)) => Some(single.to_string()),
        (None, None) => None,
    };
    let traceback = output
        .traceback
        .as_ref()
        .map(|lines| strip_ansi(&lines.join("\n")));

    if header.is_none() && traceback.is_none() {
        return None;
    }

    let mut el = Element::new("div").class("nb-output").class("nb-error");
    if let Some(header) = header {
        el.push(Element::new("div").class("nb-error-header").text(header));
    }
    if let Some(traceback) = traceback {
        el.push(Element::new("pre").class("nb-traceback").text(traceback));
    }
    Some(el)
}

fn rich_wrapper(kind: &str) -> Element {
    Element::new("div").class("nb-output").class(kind)
}

/// Restrict a value to characters safe inside a class name
fn css_token(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::JsonMap;
    use serde_json::{json, Value};

    fn map(value: Value) -> Option<JsonMap> {
        value.as_object().cloned()
    }

    fn render(output: &Output) -> (Option<Element>, Vec<ImageLoad>) {
        let mut ctx = RenderContext::new();
        let node = render_output(output, &mut ctx);
        let el = node.map(|n| match n {
            Node::Element(el) => el,
            Node::Text(_) => panic!("expected element"),
        });
        (el, ctx.take_pending())
    }

    #[test]
    fn test_stderr_stream() {
        let mut out = Output::new("stream");
        out.name = Some("stderr".to_string());
        out.text = Some(vec!["err\n".to_string(), "line2".to_string()]);
        let (el, _) = render(&out);
        let el = el.unwrap();
        assert_eq!(el.text_content(), "err\nline2");
        assert!(el.has_class("nb-stream-stderr"));
        assert!(!el.has_class("nb-stream-stdout"));
        assert_eq!(el.get_attr("data-stream"), Some("stderr"));
    }

    #[test]
    fn test_stream_defaults_to_stdout() {
        let mut out = Output::new("stream");
        out.text = Some(vec!["hi".to_string()]);
        let (el, _) = render(&out);
        assert!(el.unwrap().has_class("nb-stream-stdout"));
    }

    #[test]
    fn test_html_is_sanitized() {
        let mut out = Output::new("display_data");
        out.data = map(json!({"text/html": "<script>alert(1)</script><p>ok</p>"}));
        let (el, _) = render(&out);
        let el = el.unwrap();
        assert_eq!(el.count_tag("script"), 0);
        let p = el.find(&|e: &Element| e.tag() == "p").unwrap();
        assert_eq!(p.text_content(), "ok");
    }

    #[test]
    fn test_error_output() {
        let mut out = Output::new("error");
        out.ename = Some("ValueError".to_string());
        out.evalue = Some("bad input".to_string());
        out.traceback = Some(vec![
            "Traceback...".to_string(),
            "ValueError: bad input".to_string(),
        ]);
        let (el, _) = render(&out);
        let el = el.unwrap();
        let header = el.find_by_class("nb-error-header").unwrap();
        assert_eq!(header.text_content(), "ValueError: bad input");
        let body = el.find_by_class("nb-traceback").unwrap();
        assert_eq!(body.text_content(), "Traceback...\nValueError: bad input");
    }

    #[test]
    fn test_error_traceback_ansi_stripped() {
        let mut out = Output::new("error");
        out.traceback = Some(vec!["\u{1b}[0;31mKeyError\u{1b}[0m".to_string()]);
        let (el, _) = render(&out);
        let el = el.unwrap();
        assert!(el.find_by_class("nb-error-header").is_none());
        assert_eq!(el.text_content(), "KeyError");
    }

    #[test]
    fn test_image_handle_with_metadata_png() {
        let mut out = Output::new("display_data");
        out.data = map(json!({"text/plain": "<Figure size 640x480 with 1 Axes>"}));
        out.metadata = map(json!({"image/png": "AAAA"}));
        let (el, pending) = render(&out);
        let el = el.unwrap();
        let img = el.find(&|e: &Element| e.tag() == "img").unwrap();
        assert_eq!(img.get_attr("src"), Some("data:image/png;base64,AAAA"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].data, "AAAA");
    }

    #[test]
    fn test_image_handle_without_payload() {
        let mut out = Output::new("execute_result");
        out.data = map(json!({"text/plain": "<Figure size 640x480 with 1 Axes>"}));
        let (el, pending) = render(&out);
        let el = el.unwrap();
        assert_eq!(el.count_tag("img"), 0);
        assert_eq!(el.text_content(), IMAGE_MISSING_TEXT);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_html_preferred_over_image_and_text() {
        let mut out = Output::new("execute_result");
        out.data = map(json!({
            "text/plain": "df",
            "text/html": "<table><tr><td>1</td></tr></table>",
            "image/png": "AAAA"
        }));
        let (el, pending) = render(&out);
        let el = el.unwrap();
        assert!(el.has_class("nb-html"));
        assert_eq!(el.count_tag("table"), 1);
        assert!(pending.is_empty());
    }

    #[test]
    fn test_png_then_plain_text() {
        let mut out = Output::new("display_data");
        out.data = map(json!({"image/png": "iVBO\nRw0K", "text/plain": "<Image>"}));
        let (el, pending) = render(&out);
        let img = el.as_ref().unwrap().find(&|e: &Element| e.tag() == "img").unwrap();
        assert_eq!(img.get_attr("src"), Some("data:image/png;base64,iVBORw0K"));
        assert_eq!(pending[0].data, "iVBORw0K");

        let mut out = Output::new("execute_result");
        out.data = map(json!({"text/plain": ["4", "2"]}));
        let (el, _) = render(&out);
        let el = el.unwrap();
        assert!(el.has_class("nb-text"));
        assert_eq!(el.tag(), "pre");
        assert_eq!(el.text_content(), "42");
    }

    #[test]
    fn test_svg_is_embedded_as_image() {
        let mut out = Output::new("display_data");
        out.data = map(json!({"image/svg+xml": "<svg></svg>"}));
        let (el, _) = render(&out);
        let img = el.as_ref().unwrap().find(&|e: &Element| e.tag() == "img").unwrap();
        assert!(img.get_attr("src").unwrap().starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_json_fallback() {
        let mut out = Output::new("display_data");
        out.data = map(json!({"application/json": {"a": 1}}));
        let (el, _) = render(&out);
        assert!(el.unwrap().text_content().contains("\"a\": 1"));
    }

    #[test]
    fn test_nothing_recognizable() {
        assert!(render(&Output::new("display_data")).0.is_none());
        assert!(render(&Output::new("stream")).0.is_none());
        assert!(render(&Output::new("error")).0.is_none());
        assert!(render(&Output::new("clear_output")).0.is_none());
    }
}
