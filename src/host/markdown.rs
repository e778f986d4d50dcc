//! Markdown rendering for the local host
//!
//! Markdown goes through pulldown-cmark and comes back as view nodes. Raw
//! HTML in the source is shown as text. Wiki-style references are expanded:
//! `[[note]]` becomes an internal link and `![[analysis.ipynb]]` becomes an
//! embed marker for the embed renderer to fill in. Link targets and image
//! sources with a scheme outside the allow-list are removed.

use crate::dom::{escape_html, parse_fragment, Element, Node};
use crate::render::sanitize::{is_allowed_link, is_allowed_src, url_scheme};
use crate::utils::path::is_external_link;
use pulldown_cmark::{CowStr, Event, Options, Parser, Tag};
use regex::Regex;
use std::sync::OnceLock;

/// Class of embed markers
pub const EMBED_CLASS: &str = "internal-embed";

/// Class of links to other documents
pub const INTERNAL_LINK_CLASS: &str = "internal-link";

/// Parser options used for all markdown
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options
}

/// Render markdown into view nodes
pub fn render_markdown(markdown: &str) -> Vec<Node> {
    let mut nodes = parse_fragment(&markdown_to_html(markdown));
    for node in &mut nodes {
        if let Node::Element(el) = node {
            el.for_each_mut(&mut |e: &mut Element| {
                drop_unsafe_urls(e);
                mark_internal_link(e);
            });
        }
    }
    nodes
}

/// Render markdown into an HTML string
pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options());

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut pending = String::new();
    let mut in_code_block = false;

    for event in parser {
        match event {
            Event::Text(text) if !in_code_block => pending.push_str(&text),
            Event::Html(html) => pending.push_str(&html),
            other => {
                flush_text(&mut pending, &mut events);
                match &other {
                    Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
                    Event::End(Tag::CodeBlock(_)) => in_code_block = false,
                    _ => {}
                }
                events.push(other);
            }
        }
    }
    flush_text(&mut pending, &mut events);

    let mut html = String::new();
    pulldown_cmark::html::push_html(&mut html, events.into_iter());
    html
}

fn wiki_pattern() -> &'static Regex {
    static WIKI: OnceLock<Regex> = OnceLock::new();
    WIKI.get_or_init(|| {
        Regex::new(r"(!?)\[\[([^\[\]|]+?)(?:\|([^\[\]]*))?\]\]").expect("valid wiki link pattern")
    })
}

/// Emit accumulated text, expanding wiki references
fn flush_text(pending: &mut String, events: &mut Vec<Event<'_>>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    let mut last = 0;

    for caps in wiki_pattern().captures_iter(&text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            events.push(Event::Text(CowStr::from(text[last..whole.start()].to_string())));
        }
        let target = caps.get(2).map(|m| m.as_str().trim()).unwrap_or_default();
        let is_embed = caps.get(1).map(|m| !m.as_str().is_empty()).unwrap_or(false);
        let markup = if is_embed {
            format!(
                "<span class=\"{}\" src=\"{}\"></span>",
                EMBED_CLASS,
                escape_html(target)
            )
        } else {
            let label = caps
                .get(3)
                .map(|m| m.as_str().trim())
                .filter(|l| !l.is_empty())
                .unwrap_or(target);
            format!(
                "<a class=\"{}\" data-href=\"{}\" href=\"{}\">{}</a>",
                INTERNAL_LINK_CLASS,
                escape_html(target),
                escape_html(target),
                escape_html(label)
            )
        };
        events.push(Event::Html(CowStr::from(markup)));
        last = whole.end();
    }

    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Remove `href` and `src` values whose scheme is not allowed
fn drop_unsafe_urls(el: &mut Element) {
    if el.tag() == "a" {
        let unsafe_href = el.get_attr("href").map(|h| !is_allowed_link(h)).unwrap_or(false);
        if unsafe_href {
            log::debug!("Dropped link target {:?}", el.get_attr("href"));
            el.remove_attr("href");
            el.remove_attr("data-href");
            el.remove_class(INTERNAL_LINK_CLASS);
        }
    } else if el.tag() == "img" {
        let unsafe_src = el
            .get_attr("src")
            .map(|src| url_scheme(src).is_some() && !is_allowed_src(src))
            .unwrap_or(false);
        if unsafe_src {
            log::debug!("Dropped image source {:?}", el.get_attr("src"));
            el.remove_attr("src");
        }
    }
}

/// Mark relative markdown links as internal
fn mark_internal_link(el: &mut Element) {
    if el.tag() != "a" || el.has_class(INTERNAL_LINK_CLASS) {
        return;
    }
    let Some(href) = el.get_attr("href").map(str::to_string) else {
        return;
    };
    if href.is_empty() || href.starts_with('#') || is_external_link(&href) {
        return;
    }
    el.add_class(INTERNAL_LINK_CLASS);
    el.set_attr("data-href", href);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> Element {
        Element::new("div").children_from(render_markdown(markdown))
    }

    #[test]
    fn test_basic_markdown() {
        let root = render("# Title\n\nSome **bold** text.");
        assert_eq!(root.count_tag("h1"), 1);
        assert_eq!(root.count_tag("strong"), 1);
        assert!(root.text_content().contains("Some bold text."));
    }

    #[test]
    fn test_raw_html_is_text() {
        let root = render("before <script>alert(1)</script> after");
        assert_eq!(root.count_tag("script"), 0);
        assert!(root.text_content().contains("<script>alert(1)</script>"));
    }

    #[test]
    fn test_embed_marker() {
        let root = render("Results:\n\n![[analysis.ipynb]]\n");
        let marker = root.find_by_class(EMBED_CLASS).unwrap();
        assert_eq!(marker.tag(), "span");
        assert_eq!(marker.get_attr("src"), Some("analysis.ipynb"));
    }

    #[test]
    fn test_wiki_link_with_alias() {
        let root = render("See [[notes/intro.md|the intro]] first.");
        let link = root.find_by_class(INTERNAL_LINK_CLASS).unwrap();
        assert_eq!(link.get_attr("data-href"), Some("notes/intro.md"));
        assert_eq!(link.text_content(), "the intro");
        assert!(root.text_content().starts_with("See "));
        assert!(root.text_content().trim_end().ends_with(" first."));
    }

    #[test]
    fn test_relative_links_are_internal() {
        let root = render("[local](other.ipynb) and [web](https://example.com) and [top](#top)");
        let links = root.find_all(&|e: &Element| e.tag() == "a");
        assert_eq!(links.len(), 3);
        assert!(links[0].has_class(INTERNAL_LINK_CLASS));
        assert_eq!(links[0].get_attr("data-href"), Some("other.ipynb"));
        assert!(!links[1].has_class(INTERNAL_LINK_CLASS));
        assert!(!links[2].has_class(INTERNAL_LINK_CLASS));
    }

    #[test]
    fn test_script_urls_removed() {
        let root = render(
            "[click](javascript:alert(1)) ![i](javascript:alert(2)) [[javascript:alert(3)]] \
             [mail](mailto:a@example.com) ![ok](https://example.com/a.png) ![local](img/a.png)",
        );
        let links = root.find_all(&|e: &Element| e.tag() == "a");
        assert_eq!(links.len(), 3);
        assert_eq!(links[0].get_attr("href"), None);
        assert_eq!(links[1].get_attr("href"), None);
        assert_eq!(links[1].get_attr("data-href"), None);
        assert!(!links[1].has_class(INTERNAL_LINK_CLASS));
        assert_eq!(links[2].get_attr("href"), Some("mailto:a@example.com"));

        let images = root.find_all(&|e: &Element| e.tag() == "img");
        assert_eq!(images.len(), 3);
        assert_eq!(images[0].get_attr("src"), None);
        assert_eq!(images[1].get_attr("src"), Some("https://example.com/a.png"));
        assert_eq!(images[2].get_attr("src"), Some("img/a.png"));
        assert!(!root.to_html().contains("=\"javascript:"));
    }

    #[test]
    fn test_code_block_left_alone() {
        let root = render("```\n![[x.ipynb]]\n```\n");
        assert!(root.find_by_class(EMBED_CLASS).is_none());
        assert!(root.text_content().contains("![[x.ipynb]]"));
    }
}
