//! JSON string tables: an object mapping each label to `{ "Value": ..., "Extra": ... }`.
//!
//! The file carries no header, so the version and language of a loaded table
//! are the defaults.

use std::{
    collections::BTreeMap,
    io::{BufRead, Write},
};

use serde::{Deserialize, Deserializer, Serialize, de::Error as _};
use serde_json::{Map, Value, ser::PrettyFormatter};

use crate::{
    error::Error,
    traits::Parser,
    types::{DEFAULT_CSF_VERSION, Language, LabelTable},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonValue {
    #[serde(rename = "Value")]
    pub value: Option<String>,

    #[serde(rename = "Extra", skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
}

/// Property names are matched case-insensitively; unknown ones are ignored.
impl<'de> Deserialize<'de> for JsonValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let properties = Map::<String, Value>::deserialize(deserializer)?;
        let mut entry = JsonValue {
            value: None,
            extra: None,
        };
        for (name, property) in properties {
            let slot = if name.eq_ignore_ascii_case("Value") {
                &mut entry.value
            } else if name.eq_ignore_ascii_case("Extra") {
                &mut entry.extra
            } else {
                continue;
            };
            *slot = match property {
                Value::Null => None,
                Value::String(text) => Some(text),
                other => {
                    return Err(D::Error::custom(format!(
                        "property \"{name}\" should be a string, found {other}"
                    )));
                }
            };
        }
        Ok(entry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Format {
    pub labels: BTreeMap<String, JsonValue>,
}

impl Parser for Format {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let labels: BTreeMap<String, JsonValue> = serde_json::from_reader(reader)?;
        Ok(Format { labels })
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
        self.labels.serialize(&mut serializer)?;
        Ok(())
    }
}

impl TryFrom<Format> for LabelTable {
    type Error = Error;

    fn try_from(format: Format) -> Result<Self, Self::Error> {
        let mut table = LabelTable::new(Language::default(), DEFAULT_CSF_VERSION);
        for (label, entry) in format.labels {
            let value = entry.value.ok_or_else(|| {
                Error::validation_error(format!(
                    "The value of label \"{label}\" should not be null."
                ))
            })?;
            table.add_label(&label, value)?;
        }
        Ok(table)
    }
}

impl From<&LabelTable> for Format {
    fn from(table: &LabelTable) -> Self {
        Format {
            labels: table
                .iter()
                .map(|(label, value)| {
                    (
                        label.to_string(),
                        JsonValue {
                            value: Some(value.to_string()),
                            extra: None,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_four_space_indent_without_escaping_unicode() {
        let table = LabelTable::from_pairs(Language::Chinese, 3, [("GUI:OK", "确定")]).unwrap();
        let text = String::from_utf8(Format::from(&table).to_bytes().unwrap()).unwrap();
        assert_eq!(
            text,
            "{\n    \"gui:ok\": {\n        \"Value\": \"确定\"\n    }\n}"
        );
    }

    #[test]
    fn test_property_names_are_case_insensitive() {
        let text = r#"{ "A": { "value": "x", "extra": "e" }, "B": { "Value": "y" },
                        "C": { "vAlUe": "z", "Note": 5 } }"#;
        let format = Format::from_str(text).unwrap();
        assert_eq!(format.labels["A"].extra.as_deref(), Some("e"));
        let table = LabelTable::try_from(format).unwrap();
        assert_eq!(table.get("a"), Some("x"));
        assert_eq!(table.get("b"), Some("y"));
        assert_eq!(table.get("c"), Some("z"));
        assert_eq!(table.version, 3);
        assert_eq!(table.language, Language::EnUs);
    }

    #[test]
    fn test_null_value_is_rejected() {
        let text = r#"{ "A": { "Value": null } }"#;
        let err = LabelTable::try_from(Format::from_str(text).unwrap()).unwrap_err();
        assert!(err.to_string().contains("should not be null"));
    }

    #[test]
    fn test_non_string_value_is_rejected() {
        assert!(matches!(
            Format::from_str(r#"{ "A": { "Value": 1 } }"#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_label_is_rejected() {
        let text = r#"{ "bad]": { "Value": "x" } }"#;
        let err = LabelTable::try_from(Format::from_str(text).unwrap()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
