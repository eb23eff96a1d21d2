//! Core, format-agnostic types for csfkit.
//! Parsers decode into these; encoders serialize these.

use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{error::Error, formats::ini::HEADER_SECTION};

/// Printable ASCII without the INI section brackets.
static LABEL_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\x20-\x5A\x5C\x5E-\x7E]+$").expect("label name pattern is valid")
});

/// Returns `true` if `name` may be used as a label name.
///
/// A label name is non-empty printable ASCII, has no surrounding spaces and
/// contains neither `[` nor `]`. The INI header section name is reserved.
pub fn validate_label_name(name: &str) -> bool {
    LABEL_NAME.is_match(name)
        && name.trim() == name
        && !name.eq_ignore_ascii_case(HEADER_SECTION)
}

/// Canonical storage form of a label name.
pub fn canonical_label_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Language ids understood by the game engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Language {
    #[default]
    EnUs,
    EnUk,
    German,
    French,
    Spanish,
    Italian,
    Japanese,
    Jabberwockie,
    Korean,
    Chinese,
    /// Any id outside the known table, kept verbatim.
    Unknown(i32),
}

impl Language {
    pub fn id(self) -> i32 {
        match self {
            Language::EnUs => 0,
            Language::EnUk => 1,
            Language::German => 2,
            Language::French => 3,
            Language::Spanish => 4,
            Language::Italian => 5,
            Language::Japanese => 6,
            Language::Jabberwockie => 7,
            Language::Korean => 8,
            Language::Chinese => 9,
            Language::Unknown(id) => id,
        }
    }
}

impl From<i32> for Language {
    fn from(id: i32) -> Self {
        match id {
            0 => Language::EnUs,
            1 => Language::EnUk,
            2 => Language::German,
            3 => Language::French,
            4 => Language::Spanish,
            5 => Language::Italian,
            6 => Language::Japanese,
            7 => Language::Jabberwockie,
            8 => Language::Korean,
            9 => Language::Chinese,
            other => Language::Unknown(other),
        }
    }
}

impl From<Language> for i32 {
    fn from(language: Language) -> Self {
        language.id()
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::EnUs => write!(f, "en_US"),
            Language::EnUk => write!(f, "en_UK"),
            Language::German => write!(f, "German"),
            Language::French => write!(f, "French"),
            Language::Spanish => write!(f, "Spanish"),
            Language::Italian => write!(f, "Italian"),
            Language::Japanese => write!(f, "Japanese"),
            Language::Jabberwockie => write!(f, "Jabberwockie"),
            Language::Korean => write!(f, "Korean"),
            Language::Chinese => write!(f, "Chinese"),
            Language::Unknown(id) => write!(f, "Unknown({id})"),
        }
    }
}

/// The version written by the original game files.
pub const DEFAULT_CSF_VERSION: i32 = 3;

/// A complete string table (corresponds to one `.csf`, `.ini`, `.yaml` or `.json` file).
///
/// Labels are stored under their canonical lower-case name, so lookups are
/// case-insensitive and iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelTable {
    pub language: Language,
    pub version: i32,
    labels: BTreeMap<String, String>,
}

impl Default for LabelTable {
    fn default() -> Self {
        Self::new(Language::default(), DEFAULT_CSF_VERSION)
    }
}

impl LabelTable {
    pub fn new(language: Language, version: i32) -> Self {
        Self {
            language,
            version,
            labels: BTreeMap::new(),
        }
    }

    /// Builds a table from `(label, value)` pairs, rejecting invalid names.
    pub fn from_pairs<I, K, V>(language: Language, version: i32, pairs: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut table = Self::new(language, version);
        for (label, value) in pairs {
            table.add_label(label.as_ref(), value)?;
        }
        Ok(table)
    }

    /// Adds or replaces a label. Returns `true` if a label with the same
    /// (case-insensitive) name already existed.
    pub fn add_label(&mut self, label: &str, value: impl Into<String>) -> Result<bool, Error> {
        if !validate_label_name(label) {
            return Err(Error::invalid_label(label));
        }
        Ok(self
            .labels
            .insert(canonical_label_name(label), value.into())
            .is_some())
    }

    /// Removes a label. Returns `true` if it existed.
    pub fn remove_label(&mut self, label: &str) -> bool {
        self.labels.remove(&canonical_label_name(label)).is_some()
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels
            .get(&canonical_label_name(label))
            .map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains_key(&canonical_label_name(label))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Iterates `(canonical label, value)` in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    /// Checks every stored label name. Tables built through [`LabelTable::add_label`]
    /// always pass; deserialized tables may not.
    pub fn validate(&self) -> Result<(), Error> {
        match self.labels.keys().find(|label| !validate_label_name(label)) {
            Some(label) => Err(Error::invalid_label(label)),
            None => Ok(()),
        }
    }
}

impl Display for LabelTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "This string table file contains {} labels, with language {}.",
            self.len(),
            self.language
        )
    }
}
