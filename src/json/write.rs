//! Purpose: Encode an in-memory document to bytes according to `SerializationSettings`.
//! Exports: `to_vec`.
//! Role: Owns the serde_json formatter that implements indent, key order, and ASCII escaping.
//! Invariants: Output is valid UTF-8 JSON with no trailing newline.
//! Invariants: Key sorting is applied recursively and never mutates the source value.

use std::io;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};

use crate::core::format::SerializationSettings;

pub(crate) fn to_vec(
    value: &Value,
    settings: &SerializationSettings,
) -> Result<Vec<u8>, serde_json::Error> {
    let indent = settings.indent.map(|width| vec![b' '; width]);
    let layout = match &indent {
        Some(bytes) => Layout::Pretty(PrettyFormatter::with_indent(bytes)),
        None => Layout::Compact(CompactFormatter),
    };
    let formatter = TextFormatter {
        layout,
        ensure_ascii: settings.ensure_ascii,
    };

    let mut out = Vec::new();
    {
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        Ordered {
            value,
            sort_keys: settings.sort_keys,
        }
        .serialize(&mut serializer)?;
    }
    Ok(out)
}

// Serializes a borrowed value, optionally visiting object keys in sorted order.
struct Ordered<'a> {
    value: &'a Value,
    sort_keys: bool,
}

impl Serialize for Ordered<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                if self.sort_keys {
                    entries.sort_by(|a, b| a.0.cmp(b.0));
                }
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(
                        key,
                        &Ordered {
                            value,
                            sort_keys: self.sort_keys,
                        },
                    )?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for value in items {
                    out.serialize_element(&Ordered {
                        value,
                        sort_keys: self.sort_keys,
                    })?;
                }
                out.end()
            }
            other => other.serialize(serializer),
        }
    }
}

enum Layout<'a> {
    Compact(CompactFormatter),
    Pretty(PrettyFormatter<'a>),
}

struct TextFormatter<'a> {
    layout: Layout<'a>,
    ensure_ascii: bool,
}

macro_rules! delegate_layout {
    ($($name:ident($($arg:ident: $ty:ty),*);)*) => {
        $(
            fn $name<W>(&mut self, writer: &mut W $(, $arg: $ty)*) -> io::Result<()>
            where
                W: ?Sized + io::Write,
            {
                match &mut self.layout {
                    Layout::Compact(inner) => inner.$name(writer $(, $arg)*),
                    Layout::Pretty(inner) => inner.$name(writer $(, $arg)*),
                }
            }
        )*
    };
}

impl Formatter for TextFormatter<'_> {
    delegate_layout! {
        begin_array();
        end_array();
        begin_array_value(first: bool);
        end_array_value();
        begin_object();
        end_object();
        begin_object_key(first: bool);
        end_object_key();
        begin_object_value();
        end_object_value();
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if !self.ensure_ascii {
            return writer.write_all(fragment.as_bytes());
        }
        let bytes = fragment.as_bytes();
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }
            writer.write_all(&bytes[start..idx])?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{unit:04x}")?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(&bytes[start..])
    }
}

#[cfg(test)]
mod tests {
    use super::to_vec;
    use crate::core::format::SerializationSettings;
    use serde_json::json;

    fn text(value: &serde_json::Value, settings: &SerializationSettings) -> String {
        String::from_utf8(to_vec(value, settings).expect("encode")).expect("utf8")
    }

    #[test]
    fn default_settings_indent_four_and_sort() {
        let value = json!({"b": 1, "a": [true, null]});
        assert_eq!(
            text(&value, &SerializationSettings::default()),
            "{\n    \"a\": [\n        true,\n        null\n    ],\n    \"b\": 1\n}"
        );
    }

    #[test]
    fn sorting_is_recursive() {
        let value = json!({"z": {"y": 1, "x": 2}, "a": [{"d": 0, "c": 0}]});
        let settings = SerializationSettings::compact();
        assert_eq!(
            text(&value, &settings),
            r#"{"a":[{"c":0,"d":0}],"z":{"x":2,"y":1}}"#
        );
    }

    #[test]
    fn unsorted_output_keeps_insertion_order() {
        let value = json!({"z": 1, "a": 2, "m": 3});
        let settings = SerializationSettings::compact().with_sort_keys(false);
        assert_eq!(text(&value, &settings), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn ensure_ascii_escapes_keys_values_and_astral_chars() {
        let value = json!({"clé": "naïve 😀"});
        let settings = SerializationSettings::compact().with_ensure_ascii(true);
        assert_eq!(
            text(&value, &settings),
            r#"{"cl\u00e9":"na\u00efve \ud83d\ude00"}"#
        );

        let raw = SerializationSettings::compact();
        assert_eq!(text(&value, &raw), "{\"clé\":\"naïve 😀\"}");
    }

    #[test]
    fn zero_indent_still_breaks_lines() {
        let value = json!({"a": 1});
        let settings = SerializationSettings::new().with_indent(Some(0));
        assert_eq!(text(&value, &settings), "{\n\"a\": 1\n}");
    }
}
