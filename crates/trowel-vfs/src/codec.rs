//! Structured text formats handled on top of raw bytes.
//!
//! JSON is read leniently (comments are stripped before parsing) and written
//! pretty-printed with two-space indentation. YAML is written in block style
//! with two-space indentation and parse errors carry their location.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{VfsError, VfsResult};

/// A structured document format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON, comments tolerated on read.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl Format {
    /// Pick a format from a file name: `.yaml`/`.yml` is YAML, anything else JSON.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let ext = path
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase());
        match ext.as_deref() {
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Json,
        }
    }

    /// Decode `text` read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Parse`] if the content is malformed or does not
    /// match `T`.
    pub fn decode<T: DeserializeOwned>(self, text: &str, path: &str) -> VfsResult<T> {
        let parsed = match self {
            Self::Json => {
                serde_json::from_str(&strip_json_comments(text)).map_err(|e| e.to_string())
            },
            Self::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| VfsError::Parse {
            path: path.to_owned(),
            format: self,
            message,
        })
    }

    /// Encode `value` into canonical text.
    ///
    /// # Errors
    ///
    /// Returns [`VfsError::Encode`] if `value` cannot be represented.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> VfsResult<String> {
        let encoded = match self {
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| VfsError::Encode {
            format: self,
            message,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "JSON"),
            Self::Yaml => write!(f, "YAML"),
        }
    }
}

/// Remove `//` and `/* */` comments from JSON text.
///
/// String literals are left untouched. Comments are replaced by whitespace
/// and newlines inside them are preserved so parser positions still match
/// the source.
#[must_use]
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                },
                '"' => in_string = false,
                _ => {},
            }
            continue;
        }

        let lookahead = chars.peek().copied();
        match (ch, lookahead) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            },
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            },
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    if next == '\n' {
                        out.push('\n');
                    }
                    prev = next;
                }
                out.push(' ');
            },
            _ => out.push(ch),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_line_and_block_comments() {
        let src = "{\n  // name\n  \"a\": 1, /* inline */ \"b\": 2\n}";
        let stripped = strip_json_comments(src);
        assert!(!stripped.contains("name"));
        assert!(!stripped.contains("inline"));
        let value: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(value, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn test_comment_markers_inside_strings_survive() {
        let src = r#"{"url": "http://example.com/*x*/", "q": "say \"//hi\""}"#;
        assert_eq!(strip_json_comments(src), src);
    }

    #[test]
    fn test_block_comment_keeps_line_numbers() {
        let src = "{\n/* one\ntwo */\n\"a\": }";
        let err = Format::Json
            .decode::<serde_json::Value>(src, "broken.json")
            .unwrap_err();
        match err {
            VfsError::Parse { path, format, message } => {
                assert_eq!(path, "broken.json");
                assert_eq!(format, Format::Json);
                assert!(message.contains("line 4"), "{message}");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_json_is_pretty_printed_with_two_spaces() {
        let text = Format::Json.encode(&json!({"a": {"b": 1}})).unwrap();
        assert_eq!(text, "{\n  \"a\": {\n    \"b\": 1\n  }\n}");
    }

    #[test]
    fn test_yaml_round_trip() {
        let value = json!({"name": "demo", "list": [1, 2]});
        let text = Format::Yaml.encode(&value).unwrap();
        assert!(text.contains("name: demo"));
        let back: serde_json::Value = Format::Yaml.decode(&text, "x.yaml").unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_yaml_error_reports_location() {
        let err = Format::Yaml
            .decode::<serde_json::Value>("a: [1, 2\nb: 3", "bad.yaml")
            .unwrap_err();
        assert!(matches!(err, VfsError::Parse { format: Format::Yaml, .. }));
        assert!(err.to_string().contains("line"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("a/b.yaml"), Format::Yaml);
        assert_eq!(Format::from_path("c.YML"), Format::Yaml);
        assert_eq!(Format::from_path("package.json"), Format::Json);
        assert_eq!(Format::from_path("Makefile"), Format::Json);
    }
}
