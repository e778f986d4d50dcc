//! Code highlighting for code cells
//!
//! With the `highlight` feature, source is tokenized by syntect and emitted
//! as class-annotated `span`s (prefix `hl-`) styled by the view stylesheet.
//! Without it, code is emitted as plain text.

use crate::dom::Node;

/// Highlight `code` written in `language` into view nodes
#[cfg(feature = "highlight")]
pub fn highlight_code(code: &str, language: &str) -> Vec<Node> {
    use syntect::html::{ClassStyle, ClassedHTMLGenerator};
    use syntect::parsing::SyntaxSet;
    use syntect::util::LinesWithEndings;

    static SYNTAXES: std::sync::OnceLock<SyntaxSet> = std::sync::OnceLock::new();
    let syntaxes = SYNTAXES.get_or_init(SyntaxSet::load_defaults_newlines);

    let Some(syntax) = syntaxes.find_syntax_by_token(language) else {
        log::debug!("No syntax for language {:?}, rendering plain", language);
        return plain(code);
    };

    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        syntaxes,
        ClassStyle::SpacedPrefixed { prefix: "hl-" },
    );
    for line in LinesWithEndings::from(code) {
        if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
            log::warn!("Highlighting failed, rendering plain: {}", e);
            return plain(code);
        }
    }

    crate::dom::parse_fragment(&generator.finalize())
}

/// Highlight `code` written in `language` into view nodes
#[cfg(not(feature = "highlight"))]
pub fn highlight_code(code: &str, _language: &str) -> Vec<Node> {
    plain(code)
}

fn plain(code: &str) -> Vec<Node> {
    if code.is_empty() {
        Vec::new()
    } else {
        vec![Node::text(code)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_highlight_preserves_text() {
        let code = "def f(x):\n    return x < 2\n";
        let root = Element::new("code").children_from(highlight_code(code, "python"));
        assert_eq!(root.text_content(), code);
    }

    #[test]
    fn test_unknown_language_is_plain() {
        let nodes = highlight_code("??? <x>", "no-such-language");
        assert_eq!(nodes, vec![Node::text("??? <x>")]);
    }

    #[test]
    fn test_empty_code() {
        assert!(highlight_code("", "python").is_empty());
    }

    #[cfg(feature = "highlight")]
    #[test]
    fn test_highlight_emits_spans() {
        let root = Element::new("code").children_from(highlight_code("import os\n", "python"));
        assert!(root.count_tag("span") > 0);
    }
}
