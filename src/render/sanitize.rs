//! Allow-list sanitizer for HTML found in notebook outputs
//!
//! Output HTML comes from whatever code ran in the notebook, so it is parsed
//! with html5ever (via scraper) and rebuilt from an explicit allow-list:
//! - Disallowed elements become a text node holding their text content
//! - Disallowed attributes are dropped
//! - `src` values must use the `data:`, `http:` or `https:` scheme

use crate::dom::{parse_fragment, Element, Node};

/// Structural tags kept as elements
pub const ALLOWED_TAGS: &[&str] = &[
    "div", "span", "p", "br", "b", "i", "em", "strong", "u", "small", "sub", "sup", "pre", "code",
    "table", "thead", "tbody", "tfoot", "tr", "th", "td", "caption", "img",
];

/// Attributes kept on allowed tags
pub const ALLOWED_ATTRIBUTES: &[&str] = &["class", "id", "src", "alt", "width", "height"];

/// URL schemes accepted in `src`
pub const ALLOWED_SRC_SCHEMES: &[&str] = &["data", "http", "https"];

/// URL schemes accepted in markdown link targets
pub const ALLOWED_LINK_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Parse and sanitize an HTML string
pub fn sanitize_html(html: &str) -> Vec<Node> {
    sanitize_nodes(parse_fragment(html))
}

/// Sanitize already-parsed nodes
pub fn sanitize_nodes(nodes: Vec<Node>) -> Vec<Node> {
    nodes.into_iter().map(sanitize_node).collect()
}

fn sanitize_node(node: Node) -> Node {
    match node {
        Node::Text(text) => Node::Text(text),
        Node::Element(el) => {
            if !ALLOWED_TAGS.contains(&el.tag()) {
                log::trace!("Sanitizer replaced <{}> with its text", el.tag());
                return Node::Text(el.text_content());
            }
            Node::Element(sanitize_element(el))
        }
    }
}

fn sanitize_element(el: Element) -> Element {
    let mut clean = Element::new(el.tag());
    for (name, value) in el.attrs() {
        let name = name.to_ascii_lowercase();
        if !ALLOWED_ATTRIBUTES.contains(&name.as_str()) {
            continue;
        }
        if name == "src" && !is_allowed_src(value) {
            continue;
        }
        clean.set_attr(&name, value.as_str());
    }
    let children = el.children().to_vec();
    clean.set_children(sanitize_nodes(children));
    clean
}

/// Whether a `src` value uses an accepted scheme
pub fn is_allowed_src(value: &str) -> bool {
    let value = value.trim();
    match value.split_once(':') {
        Some((scheme, _)) => ALLOWED_SRC_SCHEMES
            .iter()
            .any(|allowed| scheme.eq_ignore_ascii_case(allowed)),
        None => false,
    }
}

/// Scheme of a URL, or `None` for a relative reference
pub fn url_scheme(value: &str) -> Option<&str> {
    let head = value.trim().split(['/', '?', '#']).next().unwrap_or_default();
    head.split_once(':').map(|(scheme, _)| scheme)
}

/// Whether a link target may be kept; relative targets always are
pub fn is_allowed_link(value: &str) -> bool {
    match url_scheme(value) {
        Some(scheme) => ALLOWED_LINK_SCHEMES
            .iter()
            .any(|allowed| scheme.trim().eq_ignore_ascii_case(allowed)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(html: &str) -> Element {
        Element::new("div").children_from(sanitize_html(html))
    }

    #[test]
    fn test_script_removed_paragraph_kept() {
        let root = render("<script>alert(1)</script><p>ok</p>");
        assert_eq!(root.count_tag("script"), 0);
        let p = root.find(&|e: &Element| e.tag() == "p").unwrap();
        assert_eq!(p.text_content(), "ok");
    }

    #[test]
    fn test_disallowed_tag_keeps_text() {
        let root = render("<div><a href=\"https://x\">link <b>bold</b></a></div>");
        assert_eq!(root.count_tag("a"), 0);
        assert_eq!(root.count_tag("b"), 0);
        assert_eq!(root.text_content(), "link bold");
    }

    #[test]
    fn test_attributes_filtered() {
        let root = render("<img src=\"data:image/png;base64,AAAA\" onerror=\"x()\" alt=\"a\" style=\"s\">");
        let img = root.find(&|e: &Element| e.tag() == "img").unwrap();
        assert_eq!(img.get_attr("src"), Some("data:image/png;base64,AAAA"));
        assert_eq!(img.get_attr("alt"), Some("a"));
        assert_eq!(img.get_attr("onerror"), None);
        assert_eq!(img.get_attr("style"), None);
    }

    #[test]
    fn test_src_scheme_allow_list() {
        assert!(is_allowed_src("https://example.com/a.png"));
        assert!(is_allowed_src(" HTTP://example.com/a.png"));
        assert!(is_allowed_src("data:image/png;base64,AAAA"));
        assert!(!is_allowed_src("javascript:alert(1)"));
        assert!(!is_allowed_src("relative/path.png"));

        let root = render("<img src=\"javascript:alert(1)\" alt=\"x\">");
        let img = root.find(&|e: &Element| e.tag() == "img").unwrap();
        assert_eq!(img.get_attr("src"), None);
    }

    #[test]
    fn test_link_scheme_allow_list() {
        assert!(is_allowed_link("other.ipynb"));
        assert!(is_allowed_link("../notes/a.md#part"));
        assert!(is_allowed_link("#top"));
        assert!(is_allowed_link("mailto:team@example.com"));
        assert!(is_allowed_link("HTTPS://example.com"));
        assert!(!is_allowed_link("javascript:alert(1)"));
        assert!(!is_allowed_link("java\tscript:alert(1)"));
        assert!(!is_allowed_link("data:text/html,<b>x</b>"));
        assert_eq!(url_scheme("dir/a:b.md"), None);
    }

    #[test]
    fn test_dataframe_table_survives() {
        let html = "<div><table class=\"dataframe\" border=\"1\"><thead><tr><th>a</th></tr></thead>\
                    <tbody><tr><td>1</td></tr></tbody></table></div>";
        let root = render(html);
        let table = root.find(&|e: &Element| e.tag() == "table").unwrap();
        assert_eq!(table.get_attr("class"), Some("dataframe"));
        assert_eq!(table.get_attr("border"), None);
        assert_eq!(root.count_tag("td"), 1);
    }
}
