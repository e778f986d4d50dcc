//! Stylesheet for notebook views
//!
//! Every rule is scoped under `.nb-view` so the sheet can live inside the
//! view itself. Nothing is installed globally and the sheet goes away with
//! the view that owns it.

use crate::dom::Element;

/// Class of a view root; all rules are scoped under it
pub const VIEW_CLASS: &str = "nb-view";

/// Attribute marking the stylesheet element of a view
pub const STYLE_MARKER: &str = "data-nbview-styles";

/// Build the stylesheet element for a view
pub fn stylesheet(max_output_height: u32) -> Element {
    Element::new("style")
        .attr(STYLE_MARKER, "")
        .text(css(max_output_height))
}

/// Scoped stylesheet text
pub fn css(max_output_height: u32) -> String {
    format!(
        r#"
.nb-view {{
    --nb-bg: #ffffff;
    --nb-text: #24292e;
    --nb-muted: #6a737d;
    --nb-code-bg: #f6f8fa;
    --nb-border: #e1e4e8;
    --nb-error: #cb2431;
    --nb-error-bg: #ffeef0;
    --nb-link: #0366d6;
    --nb-max-output-height: {max}px;
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Helvetica, Arial, sans-serif;
    color: var(--nb-text);
    background-color: var(--nb-bg);
}}

@media (prefers-color-scheme: dark) {{
    .nb-view {{
        --nb-bg: #0d1117;
        --nb-text: #c9d1d9;
        --nb-muted: #8b949e;
        --nb-code-bg: #161b22;
        --nb-border: #30363d;
        --nb-error: #f85149;
        --nb-error-bg: #2d1619;
        --nb-link: #58a6ff;
    }}
}}

.nb-view .nb-cell {{
    border: 1px solid var(--nb-border);
    border-radius: 6px;
    margin: 12px 0;
}}

.nb-view .nb-cell-header {{
    display: flex;
    align-items: center;
    gap: 8px;
    padding: 4px 8px;
    font-size: 12px;
    color: var(--nb-muted);
    border-bottom: 1px solid var(--nb-border);
}}

.nb-view .nb-prompt {{
    font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
}}

.nb-view .nb-edit-button {{
    margin-left: auto;
}}

.nb-view .nb-edit-button[disabled] {{
    opacity: 0.4;
}}

.nb-view .nb-cell-body {{
    padding: 8px;
}}

.nb-view .nb-code-container {{
    display: flex;
    background-color: var(--nb-code-bg);
    border-radius: 6px;
    overflow: hidden;
}}

.nb-view .nb-line-numbers {{
    display: flex;
    flex-direction: column;
    padding: 8px 6px;
    text-align: right;
    color: var(--nb-muted);
    user-select: none;
    border-right: 1px solid var(--nb-border);
    overflow: hidden;
}}

.nb-view pre {{
    margin: 0;
    font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
    font-size: 13px;
    line-height: 1.45;
}}

.nb-view .nb-line-numbers span {{
    font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
    font-size: 13px;
    line-height: 1.45;
}}

.nb-view .nb-code {{
    flex: 1;
    padding: 8px;
    overflow: auto;
}}

.nb-view .nb-outputs-wrapper {{
    margin-top: 8px;
}}

.nb-view .nb-outputs {{
    max-height: var(--nb-max-output-height);
    overflow: auto;
}}

.nb-view .nb-outputs.nb-collapsed {{
    display: none;
}}

.nb-view .nb-output {{
    padding: 4px 0;
    white-space: pre-wrap;
}}

.nb-view .nb-stream-stderr {{
    background-color: var(--nb-error-bg);
}}

.nb-view .nb-error {{
    color: var(--nb-error);
}}

.nb-view .nb-error-header {{
    font-weight: 600;
}}

.nb-view .nb-html table {{
    border-collapse: collapse;
}}

.nb-view .nb-html th,
.nb-view .nb-html td {{
    padding: 4px 8px;
    border: 1px solid var(--nb-border);
}}

.nb-view .nb-image-container {{
    position: relative;
}}

.nb-view .nb-image {{
    max-width: 100%;
    height: auto;
    transition: opacity 0.3s ease-in;
}}

.nb-view .nb-image-loading {{
    opacity: 0;
}}

.nb-view .nb-image-loaded {{
    opacity: 1;
}}

.nb-view .nb-image-placeholder,
.nb-view .nb-image-missing {{
    color: var(--nb-muted);
    font-style: italic;
}}

.nb-view .nb-image-error {{
    color: var(--nb-error);
}}

.nb-view .nb-raw {{
    color: var(--nb-muted);
}}

.nb-view .nb-editor textarea {{
    width: 100%;
    min-height: 120px;
    font-family: "SFMono-Regular", Consolas, "Liberation Mono", Menlo, monospace;
    font-size: 13px;
}}

.nb-view .nb-editor-actions {{
    display: flex;
    gap: 8px;
    margin-top: 4px;
}}

.nb-view .nb-embed {{
    border-left: 3px solid var(--nb-border);
    padding-left: 8px;
}}

.nb-view .nb-embed-title {{
    font-weight: 600;
}}

.nb-view .nb-embed-error {{
    color: var(--nb-error);
    background-color: var(--nb-error-bg);
    padding: 8px;
}}

.nb-view .internal-link {{
    color: var(--nb-link);
}}

.nb-view .hl-comment {{ color: #6a737d; font-style: italic; }}
.nb-view .hl-keyword, .nb-view .hl-storage {{ color: #d73a49; }}
.nb-view .hl-string {{ color: #032f62; }}
.nb-view .hl-constant {{ color: #005cc5; }}
.nb-view .hl-entity {{ color: #6f42c1; }}
.nb-view .hl-support {{ color: #005cc5; }}
"#,
        max = max_output_height
    )
}
