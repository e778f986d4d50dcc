//! Utilities module for nbview
//!
//! Shared helper functions including:
//! - Path utilities
//! - Text utilities (ANSI stripping)

use std::path::{Path, PathBuf};

/// Path utilities
pub mod path {
    use super::*;

    /// Notebook file extension handled by the viewer
    pub const NOTEBOOK_EXTENSION: &str = "ipynb";

    /// Get the file name without extension
    pub fn file_stem(path: &Path) -> Option<String> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s.to_string())
    }

    /// Check if path has the notebook extension
    pub fn is_notebook(path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(NOTEBOOK_EXTENSION))
            .unwrap_or(false)
    }

    /// Check if path has a markdown extension
    pub fn is_markdown(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("md" | "markdown" | "mdown" | "mkd")
        )
    }

    /// Check whether a link target leaves the document set (has a URL scheme)
    pub fn is_external_link(href: &str) -> bool {
        let Some((scheme, _)) = href.split_once(':') else {
            return false;
        };
        !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
            && scheme.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
            // Windows drive letters are paths, not schemes
            && scheme.len() > 1
    }

    /// Resolve a link target relative to the document that contains it
    ///
    /// Fragments (`#...`) and block references (`^...`) are dropped.
    pub fn resolve_link(source_path: &Path, target: &str) -> PathBuf {
        let target = target
            .split(['#', '^'])
            .next()
            .unwrap_or(target)
            .trim();
        let target = Path::new(target);
        if target.is_absolute() {
            return target.to_path_buf();
        }
        source_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(target)
    }
}

/// Text utilities
pub mod text {
    use regex::Regex;
    use std::sync::OnceLock;

    /// Remove ANSI terminal escape sequences (colored tracebacks)
    pub fn strip_ansi(s: &str) -> String {
        static ANSI: OnceLock<Regex> = OnceLock::new();
        let re = ANSI.get_or_init(|| {
            Regex::new(r"\x1b\[[0-9;?]*[ -/]*[@-~]|\x1b[@-Z\\-_]").expect("valid ANSI pattern")
        });
        re.replace_all(s, "").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_notebook() {
        assert!(path::is_notebook(Path::new("analysis.ipynb")));
        assert!(path::is_notebook(Path::new("ANALYSIS.IPYNB")));
        assert!(!path::is_notebook(Path::new("notes.md")));
        assert!(!path::is_notebook(Path::new("ipynb")));
    }

    #[test]
    fn test_is_markdown() {
        assert!(path::is_markdown(Path::new("test.md")));
        assert!(path::is_markdown(Path::new("test.markdown")));
        assert!(!path::is_markdown(Path::new("test.txt")));
    }

    #[test]
    fn test_external_links() {
        assert!(path::is_external_link("https://example.com"));
        assert!(path::is_external_link("mailto:someone@example.com"));
        assert!(!path::is_external_link("Other Note.md"));
        assert!(!path::is_external_link("docs/tour.ipynb#Section"));
        assert!(!path::is_external_link("C:/notes/a.md"));
    }

    #[test]
    fn test_resolve_link() {
        let source = Path::new("/vault/notes/index.md");
        assert_eq!(
            path::resolve_link(source, "tour.ipynb#Intro"),
            PathBuf::from("/vault/notes/tour.ipynb")
        );
        assert_eq!(
            path::resolve_link(source, "/abs/x.ipynb"),
            PathBuf::from("/abs/x.ipynb")
        );
    }

    #[test]
    fn test_strip_ansi() {
        let colored = "\u{1b}[0;31mValueError\u{1b}[0m: bad input";
        assert_eq!(text::strip_ansi(colored), "ValueError: bad input");
        assert_eq!(text::strip_ansi("plain"), "plain");
    }
}
