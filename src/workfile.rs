//! The annotated work file a translator edits.
//!
//! Each label becomes one INI section. Its *live* keys (`Value`, `ValueLine2`, …)
//! hold the text that gets compiled; its *reference* keys (`Upstream…`,
//! `UpstreamOld…`, `TranslationNew…`, …) carry read-only context. Every key
//! family follows the same rule: the bare name for line 1, `{Name}Line{N}` for
//! line N ≥ 2.

use std::io::{BufRead, Write};

use crate::{
    error::Error,
    formats::ini::{Document, HEADER_SECTION, Section, header_section, read_header},
    traits::Parser,
    types::{Language, LabelTable},
};

/// A section of a work file; one per label.
pub type AnnotatedSection = Section;

/// Key families of the work-file grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyFamily {
    Value,
    Upstream,
    UpstreamOld,
    UpstreamNew,
    TranslationOld,
    TranslationNew,
}

impl KeyFamily {
    /// Longest prefixes first, so `UpstreamOld` is never read as `Upstream` + `Old`.
    const PARSE_ORDER: [KeyFamily; 6] = [
        KeyFamily::TranslationOld,
        KeyFamily::TranslationNew,
        KeyFamily::UpstreamOld,
        KeyFamily::UpstreamNew,
        KeyFamily::Upstream,
        KeyFamily::Value,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            KeyFamily::Value => "Value",
            KeyFamily::Upstream => "Upstream",
            KeyFamily::UpstreamOld => "UpstreamOld",
            KeyFamily::UpstreamNew => "UpstreamNew",
            KeyFamily::TranslationOld => "TranslationOld",
            KeyFamily::TranslationNew => "TranslationNew",
        }
    }

    /// Live keys are compiled into the string table; all others are references.
    pub fn is_live(self) -> bool {
        self == KeyFamily::Value
    }

    /// Key name for the 1-based `line` of this family.
    pub fn key(self, line: usize) -> String {
        if line <= 1 {
            self.prefix().to_string()
        } else {
            format!("{}Line{}", self.prefix(), line)
        }
    }
}

/// Splits a key into its family and 1-based line number.
///
/// Returns `None` for keys outside the grammar, including `…Line1` and `…Line0`.
pub fn parse_key(key: &str) -> Option<(KeyFamily, usize)> {
    KeyFamily::PARSE_ORDER.iter().find_map(|&family| {
        let prefix = family.prefix();
        if !key.get(..prefix.len())?.eq_ignore_ascii_case(prefix) {
            return None;
        }
        let rest = &key[prefix.len()..];
        if rest.is_empty() {
            return Some((family, 1));
        }
        if !rest.get(..4)?.eq_ignore_ascii_case("Line") {
            return None;
        }
        let digits = &rest[4..];
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        match digits.parse::<usize>() {
            Ok(line) if line >= 2 => Some((family, line)),
            _ => None,
        }
    })
}

/// Splits a value into work-file lines. Joining the result with `\n` gives
/// back the input unchanged.
pub fn split_lines(value: &str) -> Vec<&str> {
    value.split('\n').collect()
}

pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    lines
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\n")
}

impl Section {
    /// Lines of `family`, in index order, stopping at the first missing line.
    pub fn lines(&self, family: KeyFamily) -> Vec<&str> {
        (1..)
            .map(|line| self.get(&family.key(line)))
            .take_while(Option::is_some)
            .flatten()
            .collect()
    }

    /// Reconstructs the multi-line value of `family`, if line 1 is present.
    pub fn reconstruct(&self, family: KeyFamily) -> Option<String> {
        let lines = self.lines(family);
        (!lines.is_empty()).then(|| join_lines(&lines))
    }

    /// Writes `value` into the keys of `family`, one key per line.
    pub fn set_lines(&mut self, family: KeyFamily, value: &str) {
        for (i, line) in split_lines(value).into_iter().enumerate() {
            self.set(family.key(i + 1), line);
        }
    }

    /// Fills `count` lines of `family` with the same text.
    pub fn seed_lines(&mut self, family: KeyFamily, count: usize, text: &str) {
        for line in 1..=count.max(1) {
            self.set(family.key(line), text);
        }
    }

    pub fn has_live_keys(&self) -> bool {
        self.entries()
            .any(|(key, _)| parse_key(key).is_some_and(|(family, _)| family.is_live()))
    }
}

/// An annotated working file: header metadata plus one section per label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkFile {
    pub language: Language,
    pub version: i32,
    document: Document,
}

impl WorkFile {
    pub fn new(language: Language, version: i32) -> Self {
        Self {
            language,
            version,
            document: Document::new(),
        }
    }

    /// The work file derived from a plain table: one section per label with
    /// its live value lines and no annotations.
    pub fn from_table(table: &LabelTable) -> Self {
        let mut work_file = Self::new(table.language, table.version);
        for (label, value) in table.iter() {
            work_file
                .ensure_section(label)
                .0
                .set_lines(KeyFamily::Value, value);
        }
        work_file
    }

    pub fn section(&self, label: &str) -> Option<&AnnotatedSection> {
        self.document.section(label)
    }

    pub fn section_mut(&mut self, label: &str) -> Option<&mut AnnotatedSection> {
        self.document.section_mut(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.document.contains_section(label)
    }

    /// Returns the section for `label`, creating it if absent. The flag is
    /// `true` when the section was created by this call.
    pub fn ensure_section(&mut self, label: &str) -> (&mut AnnotatedSection, bool) {
        self.document.ensure_section(label)
    }

    pub fn remove_section(&mut self, label: &str) -> bool {
        self.document.remove_section(label).is_some()
    }

    pub fn sections(&self) -> impl Iterator<Item = &AnnotatedSection> {
        self.document.sections()
    }

    pub fn len(&self) -> usize {
        self.document.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.is_empty()
    }

    /// Compiles the live values back into a table, dropping every annotation.
    pub fn to_table(&self) -> Result<LabelTable, Error> {
        LabelTable::try_from(&Document::from(self))
    }
}

impl From<&WorkFile> for Document {
    fn from(work_file: &WorkFile) -> Self {
        let mut document = Document::new();
        let (header, _) = document.ensure_section(HEADER_SECTION);
        *header = header_section(work_file.version, work_file.language);
        for section in work_file.sections() {
            let (target, _) = document.ensure_section(section.name());
            *target = section.clone();
        }
        document
    }
}

impl TryFrom<Document> for WorkFile {
    type Error = Error;

    fn try_from(mut document: Document) -> Result<Self, Self::Error> {
        let (version, language) = read_header(&document)?;
        document.remove_section(HEADER_SECTION);
        Ok(Self {
            language,
            version,
            document,
        })
    }
}

impl Parser for WorkFile {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        WorkFile::try_from(Document::from_reader(reader)?)
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        Document::from(self).to_writer(writer)
    }
}
