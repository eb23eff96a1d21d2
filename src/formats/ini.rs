//! Generic INI section/key container and the `SadPencil.Ra2CsfFile.Ini` table format.
//!
//! The container is shared by two readers: the strict one used for string
//! tables and work files (no comments, no duplicates, values kept verbatim),
//! and a lenient one for game map files.

use std::{
    collections::HashMap,
    io::{BufRead, Write},
};

use tracing::debug;

use crate::{
    error::Error,
    traits::Parser,
    types::{Language, LabelTable, canonical_label_name},
    workfile::{KeyFamily, join_lines},
};

/// Name of the header section written before any label section.
pub const HEADER_SECTION: &str = "SadPencil.Ra2CsfFile.Ini";
pub const INI_VERSION: i32 = 2;

const NEWLINE: &str = "\r\n";

/// One `[section]` with its ordered `key=value` pairs. Keys compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    name: String,
    entries: Vec<(String, String)>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Sets `key`, replacing the value in place if the key is already present.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
        {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An ordered collection of sections. Section names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    sections: Vec<Section>,
    index: HashMap<String, usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        let index = *self.index.get(&canonical_label_name(name))?;
        self.sections.get(index)
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        let index = *self.index.get(&canonical_label_name(name))?;
        self.sections.get_mut(index)
    }

    pub fn contains_section(&self, name: &str) -> bool {
        self.index.contains_key(&canonical_label_name(name))
    }

    /// Returns the section called `name`, appending an empty one if needed.
    /// The flag is `true` when the section was created by this call.
    pub fn ensure_section(&mut self, name: &str) -> (&mut Section, bool) {
        let key = canonical_label_name(name);
        let (index, created) = match self.index.get(&key) {
            Some(&index) => (index, false),
            None => {
                self.sections.push(Section::new(name));
                let index = self.sections.len() - 1;
                self.index.insert(key, index);
                (index, true)
            }
        };
        (&mut self.sections[index], created)
    }

    /// Appends a section. Fails if a section with the same name exists.
    pub fn add_section(&mut self, section: Section) -> Result<(), Error> {
        let key = canonical_label_name(section.name());
        if self.index.contains_key(&key) {
            return Err(Error::invalid_data(format!(
                "duplicate section [{}]",
                section.name()
            )));
        }
        self.sections.push(section);
        self.index.insert(key, self.sections.len() - 1);
        Ok(())
    }

    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        let index = self.index.remove(&canonical_label_name(name))?;
        let removed = self.sections.remove(index);
        for slot in self.index.values_mut() {
            if *slot > index {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Parses loosely formatted INI text such as game map files.
    ///
    /// `;` starts a comment, keys and values are trimmed, repeated sections are
    /// merged and a repeated key keeps its last value. Lines that are neither a
    /// section header nor an assignment are ignored.
    pub fn parse_lenient(text: &str) -> Self {
        let mut document = Document::new();
        let mut current: Option<String> = None;

        for raw in text.lines() {
            let line = match raw.find(';') {
                Some(pos) => &raw[..pos],
                None => raw,
            }
            .trim();
            if line.is_empty() {
                continue;
            }
            if let Some(name) = section_header(line) {
                document.ensure_section(name);
                current = Some(name.to_string());
                continue;
            }
            let (Some(section), Some((key, value))) = (current.as_deref(), line.split_once('='))
            else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            document.ensure_section(section).0.set(key, value.trim());
        }

        document
    }
}

fn section_header(line: &str) -> Option<&str> {
    let inner = line.strip_prefix('[')?.strip_suffix(']')?.trim();
    (!inner.is_empty()).then_some(inner)
}

impl Parser for Document {
    /// Strict parse: no comments, no duplicate sections or keys, no keys outside
    /// a section. Values are kept verbatim apart from the line terminator.
    fn from_reader<R: BufRead>(mut reader: R) -> Result<Self, Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(&text);

        let mut document = Document::new();
        let mut current: Option<Section> = None;

        for (number, raw) in text.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if let Some(name) = section_header(trimmed) {
                if let Some(done) = current.take() {
                    document.add_section(done)?;
                }
                if document.contains_section(name) {
                    return Err(Error::invalid_data(format!(
                        "line {}: duplicate section [{}]",
                        number + 1,
                        name
                    )));
                }
                current = Some(Section::new(name));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(Error::invalid_data(format!(
                    "line {}: expected `key=value`, found `{}`",
                    number + 1,
                    trimmed
                )));
            };
            let key = key.trim();
            let Some(section) = current.as_mut() else {
                return Err(Error::invalid_data(format!(
                    "line {}: key `{}` appears outside of any section",
                    number + 1,
                    key
                )));
            };
            if key.is_empty() || section.contains_key(key) {
                return Err(Error::invalid_data(format!(
                    "line {}: empty or duplicate key `{}` in section [{}]",
                    number + 1,
                    key,
                    section.name()
                )));
            }
            section.entries.push((key.to_string(), value.to_string()));
        }

        if let Some(done) = current.take() {
            document.add_section(done)?;
        }
        Ok(document)
    }

    fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                writer.write_all(NEWLINE.as_bytes())?;
            }
            write!(writer, "[{}]{}", section.name(), NEWLINE)?;
            for (key, value) in section.entries() {
                write!(writer, "{}={}{}", key, value, NEWLINE)?;
            }
        }
        Ok(())
    }
}

fn header_int(header: &Section, key: &str) -> Result<i32, Error> {
    let raw = header.get(key).ok_or_else(|| {
        Error::invalid_data(format!(
            "Invalid {HEADER_SECTION} file. Missing key \"{key}\" in section [{HEADER_SECTION}]."
        ))
    })?;
    raw.trim()
        .parse()
        .map_err(|_| Error::invalid_data(format!("{key} is not an integer: `{raw}`")))
}

/// Reads the header section and returns `(version, language)`.
pub(crate) fn read_header(document: &Document) -> Result<(i32, Language), Error> {
    let header = document.section(HEADER_SECTION).ok_or_else(|| {
        Error::invalid_data(format!(
            "Invalid {HEADER_SECTION} file. Missing section [{HEADER_SECTION}]."
        ))
    })?;
    let ini_version = header_int(header, "IniVersion")?;
    if ini_version != INI_VERSION {
        return Err(Error::UnsupportedFormat(format!(
            "Unknown {HEADER_SECTION} file version {ini_version}. The version should be {INI_VERSION}."
        )));
    }
    Ok((
        header_int(header, "CsfVersion")?,
        Language::from(header_int(header, "CsfLang")?),
    ))
}

pub(crate) fn header_section(version: i32, language: Language) -> Section {
    let mut header = Section::new(HEADER_SECTION);
    header.set("IniVersion", INI_VERSION.to_string());
    header.set("CsfVersion", version.to_string());
    header.set("CsfLang", language.id().to_string());
    header
}

impl TryFrom<&Document> for LabelTable {
    type Error = Error;

    /// Collects the live value lines of every label section. Sections without a
    /// `Value` key carry annotations only and are skipped.
    fn try_from(document: &Document) -> Result<Self, Self::Error> {
        let (version, language) = read_header(document)?;
        let mut table = LabelTable::new(language, version);

        for section in document.sections() {
            if section.name().eq_ignore_ascii_case(HEADER_SECTION) {
                continue;
            }
            let lines = section.lines(KeyFamily::Value);
            if lines.is_empty() {
                debug!(label = section.name(), "skipping section without a value");
                continue;
            }
            table.add_label(section.name(), join_lines(&lines))?;
        }

        Ok(table)
    }
}

impl From<&LabelTable> for Document {
    fn from(table: &LabelTable) -> Self {
        let mut document = Document {
            sections: vec![header_section(table.version, table.language)],
            index: HashMap::from([(canonical_label_name(HEADER_SECTION), 0)]),
        };
        for (label, value) in table.iter() {
            document.ensure_section(label).0.set_lines(KeyFamily::Value, value);
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn test_strict_parse_keeps_values_verbatim() {
        let text = "[SadPencil.Ra2CsfFile.Ini]\r\nIniVersion=2\r\nCsfVersion=3\r\nCsfLang=0\r\n\r\n[GUI:OK]\r\nValue=  spaced = value \r\n";
        let document = Document::from_str(text).unwrap();
        assert_eq!(document.len(), 2);
        assert_eq!(
            document.section("gui:ok").unwrap().get("value"),
            Some("  spaced = value ")
        );
    }

    #[test]
    fn test_strict_parse_rejects_duplicates_and_orphans() {
        assert!(Document::from_str("[a]\nValue=1\n[A]\nValue=2\n").is_err());
        assert!(Document::from_str("[a]\nValue=1\nvalue=2\n").is_err());
        assert!(Document::from_str("Value=1\n[a]\n").is_err());
        assert!(Document::from_str("[a]\njust text\n").is_err());
    }

    #[test]
    fn test_comments_are_not_special_in_strict_mode() {
        let document = Document::from_str("[a]\nValue=; not a comment\n").unwrap();
        assert_eq!(
            document.section("a").unwrap().get("Value"),
            Some("; not a comment")
        );
    }

    #[test]
    fn test_lenient_parse_merges_and_ignores_noise() {
        let text = indoc! {"
            ; map header
            [Basic]
            Name=Test Map ; comment
            garbage line
            [Basic]
            Name=Renamed
            [Actions]
            1=1,11,0,LABEL:One,0,0,0,0,A
        "};
        let document = Document::parse_lenient(text);
        assert_eq!(document.len(), 2);
        assert_eq!(document.section("basic").unwrap().get("name"), Some("Renamed"));
        assert!(document.section("actions").unwrap().get("1").is_some());
    }

    #[test]
    fn test_header_name_cannot_be_a_label() {
        let err = LabelTable::from_pairs(
            Language::EnUs,
            3,
            [("SadPencil.Ra2CsfFile.Ini", "hello"), ("b", "x")],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_table_round_trip_with_multiline_values() {
        let table = LabelTable::from_pairs(
            Language::Chinese,
            3,
            [("GUI:OK", "确定"), ("TXT:Multi", "line one\nline two\n"), ("Empty", "")],
        )
        .unwrap();
        let bytes = Document::from(&table).to_bytes().unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(
            "[SadPencil.Ra2CsfFile.Ini]\r\nIniVersion=2\r\nCsfVersion=3\r\nCsfLang=9\r\n"
        ));
        assert!(text.contains(
            "[txt:multi]\r\nValue=line one\r\nValueLine2=line two\r\nValueLine3=\r\n"
        ));
        let parsed = Document::from_bytes(&bytes).unwrap();
        assert_eq!(LabelTable::try_from(&parsed).unwrap(), table);
    }

    #[test]
    fn test_missing_header_is_rejected() {
        let document = Document::from_str("[a]\nValue=1\n").unwrap();
        let err = LabelTable::try_from(&document).unwrap_err();
        assert!(err.to_string().contains("Missing section"));
    }

    #[test]
    fn test_unknown_ini_version_is_rejected() {
        let text = "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=1\nCsfVersion=3\nCsfLang=0\n";
        let document = Document::from_str(text).unwrap();
        assert!(matches!(
            LabelTable::try_from(&document),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_invalid_label_section_is_rejected() {
        let text = "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=2\nCsfVersion=3\nCsfLang=0\n[bad\u{7f}]\nValue=x\n";
        let document = Document::from_str(text).unwrap();
        assert!(matches!(
            LabelTable::try_from(&document),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_annotation_only_sections_are_skipped() {
        let text = indoc! {"
            [SadPencil.Ra2CsfFile.Ini]
            IniVersion=2
            CsfVersion=3
            CsfLang=0

            [removed]
            UpstreamOld=gone
        "};
        let table = LabelTable::try_from(&Document::from_str(text).unwrap()).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_remove_section_keeps_index_consistent() {
        let mut document = Document::new();
        document.ensure_section("a");
        document.ensure_section("b");
        document.ensure_section("c");
        assert!(document.remove_section("A").is_some());
        assert_eq!(document.section("c").unwrap().name(), "c");
        assert_eq!(document.section("b").unwrap().name(), "b");
        assert!(document.section("a").is_none());
    }
}
