//! The label reconciliation engine.
//!
//! Every operation takes immutable [`LabelTable`] snapshots and returns a
//! freshly built [`WorkFile`] or [`LabelTable`]. Nothing here performs I/O,
//! and every input is validated before any output is built, so a failing
//! operation never yields a partial result.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

use tracing::debug;

use crate::{
    error::Error,
    placeholder::{TRANSLATION_DELETE_NEEDED, TRANSLATION_NEEDED},
    types::LabelTable,
    workfile::{KeyFamily, WorkFile, split_lines},
};

/// A label whose value differs between two upstream snapshots.
///
/// A label missing from one snapshot is compared as an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff {
    pub label: String,
    pub old_value: String,
    pub new_value: String,
}

/// Computes the diff of two upstream snapshots, keyed by canonical label.
pub fn diff_upstreams(old: &LabelTable, new: &LabelTable) -> BTreeMap<String, Diff> {
    union_labels(&[old, new])
        .into_iter()
        .filter_map(|label| {
            let old_value = old.get(label).unwrap_or_default();
            let new_value = new.get(label).unwrap_or_default();
            (old_value != new_value).then(|| {
                (
                    label.to_string(),
                    Diff {
                        label: label.to_string(),
                        old_value: old_value.to_string(),
                        new_value: new_value.to_string(),
                    },
                )
            })
        })
        .collect()
}

fn union_labels<'a>(tables: &[&'a LabelTable]) -> BTreeSet<&'a str> {
    tables.iter().flat_map(|table| table.labels()).collect()
}

fn validate_all(tables: &[&LabelTable]) -> Result<(), Error> {
    tables.iter().try_for_each(|table| table.validate())
}

fn line_count(value: &str) -> usize {
    split_lines(value).len()
}

/// Seeds a fresh translation package: every value moves into `Upstream`
/// keys and every live key becomes the translation-needed placeholder.
pub fn new_translation(table: &LabelTable) -> Result<WorkFile, Error> {
    validate_all(&[table])?;

    let mut work_file = WorkFile::new(table.language, table.version);
    for (label, value) in table.iter() {
        let (section, _) = work_file.ensure_section(label);
        section.seed_lines(KeyFamily::Value, line_count(value), TRANSLATION_NEEDED);
        section.set_lines(KeyFamily::Upstream, value);
    }

    debug!(labels = work_file.len(), "new translation package");
    Ok(work_file)
}

/// Aligns a translation package with the upstream label set.
///
/// Labels missing from `translated` get a placeholder; existing translations
/// are kept. Every upstream label receives `Upstream` keys, and labels only
/// present in `translated` pass through untouched.
pub fn tile(upstream: &LabelTable, translated: &LabelTable) -> Result<WorkFile, Error> {
    validate_all(&[upstream, translated])?;

    let mut work_file = WorkFile::from_table(translated);
    let mut seeded = 0usize;
    for (label, value) in upstream.iter() {
        let (section, created) = work_file.ensure_section(label);
        section.set_lines(KeyFamily::Upstream, value);
        if created {
            section.seed_lines(KeyFamily::Value, line_count(value), TRANSLATION_NEEDED);
            seeded += 1;
        }
    }

    debug!(labels = work_file.len(), seeded, "tiled translation package");
    Ok(work_file)
}

/// Adds upstream annotations for every label of `old ∪ new`.
///
/// Changed labels get `UpstreamOld` keys when the old snapshot had them.
/// Labels present in `new` get `Upstream` keys, and sections with no live
/// value yet are then seeded with the placeholder sized to the new value.
fn annotate_upstream(
    work_file: &mut WorkFile,
    old_upstream: &LabelTable,
    new_upstream: &LabelTable,
    diffs: &BTreeMap<String, Diff>,
) {
    for label in union_labels(&[old_upstream, new_upstream]) {
        let (section, _) = work_file.ensure_section(label);
        let had_live_value = section.has_live_keys();

        if diffs.contains_key(label)
            && let Some(old_value) = old_upstream.get(label)
        {
            section.set_lines(KeyFamily::UpstreamOld, old_value);
        }
        if let Some(value) = new_upstream.get(label) {
            section.set_lines(KeyFamily::Upstream, value);
            if !had_live_value {
                section.seed_lines(KeyFamily::Value, line_count(value), TRANSLATION_NEEDED);
            }
        }
    }
}

/// Three-way merge after an upstream version bump.
///
/// Drafts of labels whose upstream value changed are discarded and replaced
/// by a placeholder, annotated with both upstream values. Labels that
/// disappeared upstream are not cleaned up; they are left for review.
pub fn update(
    old_upstream: &LabelTable,
    new_upstream: &LabelTable,
    old_translated: &LabelTable,
) -> Result<WorkFile, Error> {
    validate_all(&[old_upstream, new_upstream, old_translated])?;

    let diffs = diff_upstreams(old_upstream, new_upstream);
    let mut work_file = WorkFile::from_table(old_translated);
    for label in diffs.keys() {
        work_file.remove_section(label);
    }
    annotate_upstream(&mut work_file, old_upstream, new_upstream, &diffs);

    debug!(
        labels = work_file.len(),
        changed = diffs.len(),
        "updated translation package"
    );
    Ok(work_file)
}

/// Compiles a deployable table: `translated` wins, `upstream` fills the gaps.
///
/// The result carries `translated`'s language and version.
pub fn override_translation(
    upstream: &LabelTable,
    translated: &LabelTable,
) -> Result<LabelTable, Error> {
    validate_all(&[upstream, translated])?;

    let mut table = LabelTable::new(translated.language, translated.version);
    for label in union_labels(&[upstream, translated]) {
        let value = translated
            .get(label)
            .or_else(|| upstream.get(label))
            .ok_or_else(|| {
                Error::Internal(format!("label \"{label}\" vanished from both tables"))
            })?;
        table.add_label(label, value)?;
    }

    debug!(labels = table.len(), "overrode upstream with translation");
    Ok(table)
}

/// The result of [`update_check`]: the compiled table and its annotated
/// companion work file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub table: LabelTable,
    pub work_file: WorkFile,
}

enum Verdict {
    Keep(String),
    Review(&'static str),
    Accept(String),
    Omit,
}

fn judge(
    label: &str,
    new_upstream: &LabelTable,
    diffs: &BTreeMap<String, Diff>,
    old_translated: &LabelTable,
    new_translated: &LabelTable,
) -> Verdict {
    let new_draft = new_translated.get(label);
    if !new_upstream.contains(label) {
        return match new_draft {
            Some(_) => Verdict::Review(TRANSLATION_DELETE_NEEDED),
            None => Verdict::Omit,
        };
    }
    if !diffs.contains_key(label) {
        return match new_draft {
            Some(value) => Verdict::Keep(value.to_string()),
            None => Verdict::Keep(TRANSLATION_NEEDED.to_string()),
        };
    }
    match (old_translated.get(label), new_draft) {
        (_, None) => Verdict::Review(TRANSLATION_NEEDED),
        (Some(old), Some(new)) if old == new => Verdict::Review(TRANSLATION_NEEDED),
        (_, Some(new)) => Verdict::Accept(new.to_string()),
    }
}

/// Four-way reconciliation checking a translation against an upstream bump.
///
/// For a changed upstream label the translator's new draft is accepted only
/// if it differs from the old draft. Labels removed upstream but still
/// translated are flagged for deletion. Wherever a label needed review, the
/// companion work file also records both drafts.
pub fn update_check(
    old_upstream: &LabelTable,
    new_upstream: &LabelTable,
    old_translated: &LabelTable,
    new_translated: &LabelTable,
) -> Result<UpdateCheck, Error> {
    validate_all(&[old_upstream, new_upstream, old_translated, new_translated])?;

    let diffs = diff_upstreams(old_upstream, new_upstream);
    let all_labels = union_labels(&[old_upstream, new_upstream, old_translated, new_translated]);

    let mut table = LabelTable::new(new_translated.language, new_translated.version);
    let mut reviewed = BTreeSet::new();
    for label in &all_labels {
        let value = match judge(label, new_upstream, &diffs, old_translated, new_translated) {
            Verdict::Omit => continue,
            Verdict::Keep(value) => value,
            Verdict::Accept(value) => {
                reviewed.insert(*label);
                value
            }
            Verdict::Review(placeholder) => {
                reviewed.insert(*label);
                placeholder.to_string()
            }
        };
        table.add_label(label, value)?;
    }

    let mut work_file = WorkFile::from_table(&table);
    annotate_upstream(&mut work_file, old_upstream, new_upstream, &diffs);
    for label in &reviewed {
        let (section, _) = work_file.ensure_section(label);
        if let Some(value) = old_translated.get(label) {
            section.set_lines(KeyFamily::TranslationOld, value);
        }
        if let Some(value) = new_translated.get(label) {
            section.set_lines(KeyFamily::TranslationNew, value);
        }
    }

    debug!(
        labels = table.len(),
        changed = diffs.len(),
        reviewed = reviewed.len(),
        "checked translation update"
    );
    Ok(UpdateCheck { table, work_file })
}

/// The five operating modes of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    New,
    Tile,
    Update,
    Override,
    UpdateCheck,
}

impl Mode {
    /// The input slots this mode reads, in argument order.
    pub fn roles(self) -> &'static [Role] {
        match self {
            Mode::New => &[Role::NewUpstream],
            Mode::Tile | Mode::Override => &[Role::NewUpstream, Role::OldTranslated],
            Mode::Update => &[Role::OldUpstream, Role::NewUpstream, Role::OldTranslated],
            Mode::UpdateCheck => &[
                Role::OldUpstream,
                Role::NewUpstream,
                Role::OldTranslated,
                Role::NewTranslated,
            ],
        }
    }
}

/// One of the four input slots.
///
/// The two-input modes call their inputs "upstream" and "translated"; they
/// read the [`Role::NewUpstream`] and [`Role::OldTranslated`] slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    OldUpstream,
    NewUpstream,
    OldTranslated,
    NewTranslated,
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::OldUpstream => "old upstream",
            Role::NewUpstream => "upstream",
            Role::OldTranslated => "translated",
            Role::NewTranslated => "new translated",
        })
    }
}

/// Input tables loaded so far. Slots may be filled in any order.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    pub old_upstream: Option<LabelTable>,
    pub new_upstream: Option<LabelTable>,
    pub old_translated: Option<LabelTable>,
    pub new_translated: Option<LabelTable>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, role: Role, table: LabelTable) -> Self {
        self.set(role, table);
        self
    }

    pub fn set(&mut self, role: Role, table: LabelTable) {
        *self.slot_mut(role) = Some(table);
    }

    pub fn get(&self, role: Role) -> Option<&LabelTable> {
        match role {
            Role::OldUpstream => self.old_upstream.as_ref(),
            Role::NewUpstream => self.new_upstream.as_ref(),
            Role::OldTranslated => self.old_translated.as_ref(),
            Role::NewTranslated => self.new_translated.as_ref(),
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<LabelTable> {
        match role {
            Role::OldUpstream => &mut self.old_upstream,
            Role::NewUpstream => &mut self.new_upstream,
            Role::OldTranslated => &mut self.old_translated,
            Role::NewTranslated => &mut self.new_translated,
        }
    }

    /// Returns the table in `role`, or a precondition error naming it.
    pub fn require(&self, role: Role) -> Result<&LabelTable, Error> {
        self.get(role).ok_or_else(|| {
            Error::Precondition(format!("Please load the {role} string table file first."))
        })
    }
}

/// What an engine run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    WorkFile(WorkFile),
    Table(LabelTable),
    Checked { table: LabelTable, work_file: WorkFile },
}

/// Runs `mode` over the loaded inputs.
///
/// All required slots are checked before anything is computed.
pub fn run(mode: Mode, inputs: &Inputs) -> Result<Outcome, Error> {
    let tables = mode
        .roles()
        .iter()
        .map(|role| inputs.require(*role))
        .collect::<Result<Vec<_>, _>>()?;

    match (mode, tables.as_slice()) {
        (Mode::New, [file]) => new_translation(file).map(Outcome::WorkFile),
        (Mode::Tile, [upstream, translated]) => tile(upstream, translated).map(Outcome::WorkFile),
        (Mode::Update, [old_upstream, new_upstream, old_translated]) => {
            update(old_upstream, new_upstream, old_translated).map(Outcome::WorkFile)
        }
        (Mode::Override, [upstream, translated]) => {
            override_translation(upstream, translated).map(Outcome::Table)
        }
        (Mode::UpdateCheck, [old_upstream, new_upstream, old_translated, new_translated]) => {
            let UpdateCheck { table, work_file } =
                update_check(old_upstream, new_upstream, old_translated, new_translated)?;
            Ok(Outcome::Checked { table, work_file })
        }
        _ => Err(Error::Internal(format!(
            "mode {mode:?} received {} inputs",
            tables.len()
        ))),
    }
}
