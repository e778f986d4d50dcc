//! View tree for nbview
//!
//! A minimal element tree standing in for the host's DOM. Renderers build
//! it, the view controller mutates it in response to user actions, and the
//! exporter serializes it to HTML.

pub mod html;

pub use html::{escape_html, parse_fragment};

/// A node in the view tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// An element with attributes and children
    Element(Element),
    /// A text node
    Text(String),
}

impl Node {
    /// Create a text node
    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    /// Borrow the element, if this is one
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(el) => Some(el),
            Node::Text(_) => None,
        }
    }

    /// Concatenated text of this node and its descendants
    pub fn text_content(&self) -> String {
        match self {
            Node::Element(el) => el.text_content(),
            Node::Text(text) => text.clone(),
        }
    }
}

impl From<Element> for Node {
    fn from(el: Element) -> Self {
        Node::Element(el)
    }
}

/// An element in the view tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder: add a class
    pub fn class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Builder: set an attribute
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child
    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: append children
    pub fn children_from(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    /// Builder: append a text child
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Tag name
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attributes in insertion order
    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    /// Attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set or replace an attribute
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(k, _)| k != name);
    }

    /// Whether the element carries `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// Add a class if not already present
    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let classes = match self.get_attr("class") {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
    }

    /// Remove a class
    pub fn remove_class(&mut self, class: &str) {
        if let Some(existing) = self.get_attr("class") {
            let classes: Vec<&str> = existing.split_whitespace().filter(|c| *c != class).collect();
            let joined = classes.join(" ");
            self.set_attr("class", joined);
        }
    }

    /// Child nodes
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Mutable child nodes
    pub fn children_mut(&mut self) -> &mut Vec<Node> {
        &mut self.children
    }

    /// Replace all children
    pub fn set_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    /// Append a child
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Child elements, skipping text
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Concatenated text of all descendants
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(el) => el.collect_text(out),
            }
        }
    }

    /// First element (self included, depth first) matching `pred`
    pub fn find<F: Fn(&Element) -> bool>(&self, pred: &F) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|el| el.find(pred))
    }

    /// Mutable variant of [`Element::find`]
    pub fn find_mut<F: Fn(&Element) -> bool>(&mut self, pred: &F) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in &mut self.children {
            if let Node::Element(el) = child {
                if let Some(found) = el.find_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// All elements (self included, depth first) matching `pred`
    pub fn find_all<F: Fn(&Element) -> bool>(&self, pred: &F) -> Vec<&Element> {
        let mut found = Vec::new();
        self.collect_matches(pred, &mut found);
        found
    }

    fn collect_matches<'a, F: Fn(&Element) -> bool>(&'a self, pred: &F, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for el in self.child_elements() {
            el.collect_matches(pred, out);
        }
    }

    /// First descendant with `class`
    pub fn find_by_class(&self, class: &str) -> Option<&Element> {
        self.find(&|el: &Element| el.has_class(class))
    }

    /// Mutable first descendant with `class`
    pub fn find_by_class_mut(&mut self, class: &str) -> Option<&mut Element> {
        self.find_mut(&|el: &Element| el.has_class(class))
    }

    /// First descendant whose attribute `name` equals `value`
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<&Element> {
        self.find(&|el: &Element| el.get_attr(name) == Some(value))
    }

    /// Mutable first descendant whose attribute `name` equals `value`
    pub fn find_by_attr_mut(&mut self, name: &str, value: &str) -> Option<&mut Element> {
        self.find_mut(&|el: &Element| el.get_attr(name) == Some(value))
    }

    /// Number of elements with the given tag
    pub fn count_tag(&self, tag: &str) -> usize {
        self.find_all(&|el: &Element| el.tag() == tag).len()
    }

    /// Visit every element mutably, parents before children
    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(el) = child {
                el.for_each_mut(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div")
            .class("outer")
            .child(Element::new("p").class("first").text("Hello "))
            .child(
                Element::new("div")
                    .attr("data-id", "x")
                    .child(Element::new("span").class("first").text("world")),
            )
    }

    #[test]
    fn test_text_content() {
        assert_eq!(sample().text_content(), "Hello world");
    }

    #[test]
    fn test_class_manipulation() {
        let mut el = Element::new("div").class("a");
        el.add_class("b");
        el.add_class("a");
        assert_eq!(el.get_attr("class"), Some("a b"));
        el.remove_class("a");
        assert!(!el.has_class("a"));
        assert!(el.has_class("b"));
    }

    #[test]
    fn test_find_depth_first() {
        let root = sample();
        assert_eq!(root.find_by_class("first").map(|e| e.tag()), Some("p"));
        assert_eq!(root.find_all(&|e: &Element| e.has_class("first")).len(), 2);
        assert_eq!(root.count_tag("div"), 2);
    }

    #[test]
    fn test_find_mut_and_replace() {
        let mut root = sample();
        let target = root.find_by_attr_mut("data-id", "x").unwrap();
        target.set_children(vec![Node::text("replaced")]);
        assert_eq!(root.text_content(), "Hello replaced");
    }

    #[test]
    fn test_set_attr_replaces() {
        let mut el = Element::new("img").attr("src", "a");
        el.set_attr("src", "b");
        assert_eq!(el.attrs().len(), 1);
        assert_eq!(el.get_attr("src"), Some("b"));
        el.remove_attr("src");
        assert_eq!(el.get_attr("src"), None);
    }
}
