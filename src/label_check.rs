//! Finding labels that game maps reference but a string table lacks.

use std::{
    collections::BTreeSet,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{
    error::Error,
    formats::IniDocument,
    placeholder::MISSING_LABEL,
    types::{LabelTable, canonical_label_name, validate_label_name},
};

const MAP_EXTENSIONS: [&str; 2] = ["map", "ypr"];
const ACTION_FIELDS: usize = 8;
const TEXT_TRIGGER_ACTION: &str = "11";

/// Labels collected from a folder of map files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapScan {
    /// Canonical names of every referenced label.
    pub labels: BTreeSet<String>,
    pub files_scanned: usize,
    /// Files that could not be used, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

fn is_map_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MAP_EXTENSIONS.iter().any(|m| ext.eq_ignore_ascii_case(m)))
}

fn checked(label: &str) -> Result<String, Error> {
    if validate_label_name(label) {
        Ok(canonical_label_name(label))
    } else {
        Err(Error::invalid_label(label))
    }
}

/// Extracts every label referenced by one map file.
///
/// Labels come from the `UIName` key of any section and from text trigger
/// actions (type 11) in `[Actions]`, where each entry is a count followed by
/// groups of eight fields and the label is the third field of a group.
pub fn labels_in_map(text: &str) -> Result<Vec<String>, Error> {
    let document = IniDocument::parse_lenient(text);
    let mut labels = Vec::new();

    for section in document.sections() {
        if let Some(label) = section.get("UIName") {
            labels.push(checked(label)?);
        }
    }

    if let Some(actions) = document.section("Actions") {
        for (_, value) in actions.entries() {
            let fields: Vec<&str> = value.split(',').map(str::trim).collect();
            let count = match fields.first().and_then(|f| f.parse::<usize>().ok()) {
                Some(count) if count > 0 => count,
                _ => continue,
            };
            for start in (1..=count.saturating_mul(ACTION_FIELDS)).step_by(ACTION_FIELDS) {
                if fields.get(start) != Some(&TEXT_TRIGGER_ACTION) {
                    continue;
                }
                if let Some(label) = fields.get(start + 2) {
                    labels.push(checked(label)?);
                }
            }
        }
    }

    Ok(labels)
}

/// Scans `dir` recursively for `.map` and `.ypr` files.
///
/// A file that cannot be read or names an invalid label is recorded in
/// [`MapScan::failures`] and skipped.
pub fn scan_map_folder<P: AsRef<Path>>(dir: P) -> Result<MapScan, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::Precondition(format!(
            "Folder {} does not exist!",
            dir.display()
        )));
    }

    let mut scan = MapScan::default();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_map_file(path) {
            continue;
        }
        scan.files_scanned += 1;

        let result = std::fs::read(path)
            .map_err(Error::from)
            .and_then(|bytes| labels_in_map(&String::from_utf8_lossy(&bytes)));
        match result {
            Ok(labels) => scan.labels.extend(labels),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping map file");
                scan.failures.push((path.to_path_buf(), e.to_string()));
            }
        }
    }

    debug!(
        files = scan.files_scanned,
        labels = scan.labels.len(),
        failures = scan.failures.len(),
        "scanned map folder"
    );
    Ok(scan)
}

/// Returns a copy of `table` where every label in `labels` it lacks is added
/// with the missing-label placeholder, plus the number of labels added.
pub fn add_missing_labels<I, S>(table: &LabelTable, labels: I) -> Result<(LabelTable, usize), Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let labels = labels
        .into_iter()
        .map(|label| checked(label.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let mut output = table.clone();
    let mut added = 0;
    for label in labels {
        if !output.contains(&label) {
            output.add_label(&label, MISSING_LABEL)?;
            added += 1;
        }
    }
    Ok((output, added))
}
