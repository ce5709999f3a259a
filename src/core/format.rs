//! Purpose: Serialization settings applied whenever a document is written to disk.
//! Exports: `SerializationSettings`, `DEFAULT_INDENT`.
//! Role: Single place for on-disk text layout policy (indent, key order, escaping).
//! Invariants: Defaults are 4-space indent, sorted keys, raw UTF-8 output.
//! Invariants: Settings are plain data; embedding them in host config via serde is supported.

use serde::{Deserialize, Serialize};

pub const DEFAULT_INDENT: usize = 4;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerializationSettings {
    /// Spaces per nesting level; `None` writes compact single-line JSON.
    pub indent: Option<usize>,
    /// Emit object keys in sorted order instead of insertion order.
    pub sort_keys: bool,
    /// Escape every non-ASCII character as `\uXXXX`.
    pub ensure_ascii: bool,
}

impl SerializationSettings {
    pub fn new() -> Self {
        Self {
            indent: Some(DEFAULT_INDENT),
            sort_keys: true,
            ensure_ascii: false,
        }
    }

    pub fn compact() -> Self {
        Self {
            indent: None,
            ..Self::new()
        }
    }

    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_sort_keys(mut self, sort_keys: bool) -> Self {
        self.sort_keys = sort_keys;
        self
    }

    pub fn with_ensure_ascii(mut self, ensure_ascii: bool) -> Self {
        self.ensure_ascii = ensure_ascii;
        self
    }
}

impl Default for SerializationSettings {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::SerializationSettings;

    #[test]
    fn defaults_match_documented_values() {
        let settings = SerializationSettings::default();
        assert_eq!(settings.indent, Some(4));
        assert!(settings.sort_keys);
        assert!(!settings.ensure_ascii);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults_when_deserialized() {
        let settings: SerializationSettings =
            serde_json::from_str(r#"{"ensure_ascii": true}"#).expect("settings");
        assert_eq!(
            settings,
            SerializationSettings::new().with_ensure_ascii(true)
        );

        let compact: SerializationSettings =
            serde_json::from_str(r#"{"indent": null}"#).expect("settings");
        assert_eq!(compact, SerializationSettings::compact());
    }
}
