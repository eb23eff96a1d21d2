//! `SadPencil.Ra2CsfFile.Yaml`: a flat YAML mapping of label → value with three
//! namespaced header keys.

use std::io::{BufRead, Write};

use serde_yaml::{Mapping, Value};

use crate::{
    error::Error,
    traits::Parser,
    types::{Language, LabelTable},
};

pub const YAML_TYPE_NAME: &str = "SadPencil.Ra2CsfFile.Yaml";
pub const YAML_VERSION: i32 = 1;

const KEY_YAML_VERSION: &str = "SadPencil.Ra2CsfFile.Yaml:YamlVersion";
const KEY_CSF_VERSION: &str = "SadPencil.Ra2CsfFile.Yaml:CsfVersion";
const KEY_CSF_LANG: &str = "SadPencil.Ra2CsfFile.Yaml:CsfLang";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub version: i32,
    pub language: Language,
    /// Labels in file order.
    pub labels: Vec<(String, String)>,
}

fn scalar_to_string(key: &str, value: &Value) -> Result<String, Error> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        _ => Err(Error::invalid_data(format!(
            "the value of \"{key}\" must be a scalar"
        ))),
    }
}

fn header_int(map: &[(String, String)], key: &str) -> Result<i32, Error> {
    let short = key.rsplit(':').next().unwrap_or(key);
    let raw = map
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
        .ok_or_else(|| {
            Error::invalid_data(format!(
                "Invalid {YAML_TYPE_NAME} file. Missing key \"{short}\" in {key}."
            ))
        })?;
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_data(format!("{key} is not an integer: `{raw}`")))
}

impl Parser for Format {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        let mapping: Mapping = serde_yaml::from_reader(reader)?;
        let mut entries = Vec::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let key = match key {
                Value::String(s) => s.clone(),
                other => scalar_to_string("key", other)?,
            };
            let value = scalar_to_string(&key, value)?;
            entries.push((key, value));
        }

        let version = header_int(&entries, KEY_CSF_VERSION)?;
        let yaml_version = header_int(&entries, KEY_YAML_VERSION)?;
        if yaml_version != YAML_VERSION {
            return Err(Error::UnsupportedFormat(format!(
                "Unknown {YAML_TYPE_NAME} file version. The version should be {YAML_VERSION}. Is this a {YAML_TYPE_NAME} file from future?"
            )));
        }
        let language = Language::from(header_int(&entries, KEY_CSF_LANG)?);

        let labels = entries
            .into_iter()
            .filter(|(key, _)| !key.starts_with(YAML_TYPE_NAME))
            .collect();

        Ok(Format {
            version,
            language,
            labels,
        })
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        let mut mapping = Mapping::new();
        mapping.insert(KEY_YAML_VERSION.into(), YAML_VERSION.to_string().into());
        mapping.insert(KEY_CSF_VERSION.into(), self.version.to_string().into());
        mapping.insert(KEY_CSF_LANG.into(), self.language.id().to_string().into());
        for (label, value) in &self.labels {
            mapping.insert(label.as_str().into(), value.as_str().into());
        }
        serde_yaml::to_writer(writer, &mapping)?;
        Ok(())
    }
}

impl TryFrom<Format> for LabelTable {
    type Error = Error;

    fn try_from(format: Format) -> Result<Self, Self::Error> {
        LabelTable::from_pairs(format.language, format.version, format.labels)
    }
}

impl From<&LabelTable> for Format {
    fn from(table: &LabelTable) -> Self {
        Format {
            version: table.version,
            language: table.language,
            labels: table
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}
