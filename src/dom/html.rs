//! HTML serialization and fragment parsing for the view tree

use super::{Element, Node};
use scraper::{ElementRef, Html};

/// Elements that never have children or a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is written without escaping
const RAW_TEXT_ELEMENTS: &[&str] = &["style"];

/// Escape text for HTML element content and attribute values
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

impl Element {
    /// Serialize the element and its subtree to HTML
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(self, &mut out);
        out
    }
}

impl Node {
    /// Serialize the node to HTML
    pub fn to_html(&self) -> String {
        match self {
            Node::Element(el) => el.to_html(),
            Node::Text(text) => escape_html(text),
        }
    }
}

fn write_element(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(el.tag());
    for (name, value) in el.attrs() {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape_html(value));
        out.push('"');
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&el.tag()) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&el.tag());
    for child in el.children() {
        match child {
            Node::Element(child) => write_element(child, out),
            Node::Text(text) if raw => out.push_str(text),
            Node::Text(text) => out.push_str(&escape_html(text)),
        }
    }

    out.push_str("</");
    out.push_str(el.tag());
    out.push('>');
}

/// Parse an HTML fragment into view nodes
///
/// Comments, doctypes and processing instructions are dropped.
pub fn parse_fragment(html: &str) -> Vec<Node> {
    let fragment = Html::parse_fragment(html);
    convert_children(fragment.root_element())
}

fn convert_children(parent: ElementRef<'_>) -> Vec<Node> {
    let mut nodes = Vec::new();
    for child in parent.children() {
        match child.value() {
            scraper::Node::Text(text) => {
                let content: &str = text;
                nodes.push(Node::Text(content.to_string()));
            }
            scraper::Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    nodes.push(Node::Element(convert_element(el)));
                }
            }
            _ => {}
        }
    }
    nodes
}

fn convert_element(el: ElementRef<'_>) -> Element {
    let value = el.value();
    let mut element = Element::new(value.name());
    for (name, attr_value) in value.attrs() {
        element.set_attr(name, attr_value);
    }
    element.set_children(convert_children(el));
    element
}
