//! Multi-line text fields
//!
//! nbformat stores `source`, stream `text` and most MIME payloads either as a
//! single string or as a list of lines. In memory we always keep lines, each
//! ending in `\n` except possibly the last.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Split text into stored lines
///
/// Every line except the last carries its trailing `\n`. No empty trailing
/// line is produced, and joining the result reproduces `text` exactly.
pub fn split_source(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

/// Join stored lines back into text
pub fn join_lines(lines: &[String]) -> String {
    lines.concat()
}

/// Text carried by a JSON value that is either a string or a list of strings
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let mut text = String::new();
            for item in items {
                text.push_str(item.as_str()?);
            }
            Some(text)
        }
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MultilineRepr {
    Text(String),
    Lines(Vec<String>),
}

/// Deserialize a string-or-lines field into lines
pub fn deserialize_lines<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match MultilineRepr::deserialize(deserializer)? {
        MultilineRepr::Text(text) => split_source(&text),
        MultilineRepr::Lines(lines) => lines,
    })
}

/// Optional variant of [`deserialize_lines`]
pub fn deserialize_opt_lines<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        match Option::<MultilineRepr>::deserialize(deserializer)? {
            None => None,
            Some(MultilineRepr::Text(text)) => Some(split_source(&text)),
            Some(MultilineRepr::Lines(lines)) => Some(lines),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_terminates_all_but_last() {
        assert_eq!(split_source("a\nb\nc"), vec!["a\n", "b\n", "c"]);
    }

    #[test]
    fn test_split_trailing_newline() {
        assert_eq!(split_source("x = 1\n"), vec!["x = 1\n"]);
        assert_eq!(split_source("x\n\n"), vec!["x\n", "\n"]);
    }

    #[test]
    fn test_split_empty() {
        assert!(split_source("").is_empty());
    }

    #[test]
    fn test_split_rejoin_reproduces_input() {
        for text in [
            "",
            "\n",
            "single",
            "a\r\nb",
            "print('hi')\n\n# done\n",
            "  indented\n\ttabs\n",
        ] {
            assert_eq!(join_lines(&split_source(text)), text, "input {:?}", text);
        }
    }

    #[test]
    fn test_value_text() {
        assert_eq!(value_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(value_text(&json!(["a\n", "b"])), Some("a\nb".to_string()));
        assert_eq!(value_text(&json!(["a", 1])), None);
        assert_eq!(value_text(&json!({"a": 1})), None);
    }
}
