use std::path::Path;

use csfkit::{
    CsfOptions, FormatType, Inputs, LabelTable, Mode, Outcome, Parser, Role, WorkFile,
    codec::{format_of, table_to_bytes},
    formats::infer_format_from_extension,
    read_table_with, run,
};

/// Where each engine result is written.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    /// The work file (`.ini`), or the table for modes that produce one.
    pub output: String,
    /// For `update-check`: also write the compiled table here.
    pub table_output: Option<String>,
}

/// Loads every `(role, path)` input into the matching slot.
pub fn load_inputs(files: &[(Role, &str)], options: &CsfOptions) -> Result<Inputs, String> {
    let mut inputs = Inputs::new();
    for (role, path) in files {
        let table = read_table_with(path, options)
            .map_err(|e| format!("Failed to read {role} file {path}: {e}"))?;
        println!("Loaded {role} file {path}: {table}");
        inputs.set(*role, table);
    }
    Ok(inputs)
}

fn require_ini(path: &str) -> Result<(), String> {
    match infer_format_from_extension(Path::new(path)) {
        Some(FormatType::Ini) => Ok(()),
        _ => Err(format!("Work files are written as .ini, got {path}")),
    }
}

/// An encoded output waiting to be written.
struct Pending {
    path: String,
    bytes: Vec<u8>,
    labels: usize,
}

/// Encodes every result of `outcome` before anything touches the disk, so a
/// bad output path fails the command without writing any file.
fn encode_outcome(
    outcome: &Outcome,
    paths: &OutputPaths,
    options: &CsfOptions,
) -> Result<Vec<Pending>, String> {
    let table = |table: &LabelTable, path: &str| -> Result<Pending, String> {
        let format = format_of(path).map_err(|e| e.to_string())?;
        Ok(Pending {
            path: path.to_string(),
            bytes: table_to_bytes(table, format, options).map_err(|e| e.to_string())?,
            labels: table.len(),
        })
    };
    let work_file = |work_file: &WorkFile, path: &str| -> Result<Pending, String> {
        require_ini(path)?;
        Ok(Pending {
            path: path.to_string(),
            bytes: work_file.to_bytes().map_err(|e| e.to_string())?,
            labels: work_file.len(),
        })
    };

    match outcome {
        Outcome::WorkFile(wf) => Ok(vec![work_file(wf, &paths.output)?]),
        Outcome::Table(t) => Ok(vec![table(t, &paths.output)?]),
        Outcome::Checked {
            table: t,
            work_file: wf,
        } => {
            let mut pending = vec![work_file(wf, &paths.output)?];
            if let Some(table_output) = &paths.table_output {
                pending.push(table(t, table_output)?);
            }
            Ok(pending)
        }
    }
}

/// Runs an engine mode and writes its result.
pub fn run_translate_command(
    mode: Mode,
    files: &[(Role, &str)],
    paths: &OutputPaths,
    options: &CsfOptions,
) -> Result<(), String> {
    let inputs = load_inputs(files, options)?;
    let outcome = run(mode, &inputs).map_err(|e| e.to_string())?;

    for pending in encode_outcome(&outcome, paths, options)? {
        std::fs::write(&pending.path, &pending.bytes)
            .map_err(|e| format!("Failed to write {}: {e}", pending.path))?;
        println!("✅ Wrote {} labels to {}", pending.labels, pending.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use csfkit::Language;

    fn checked() -> Outcome {
        let table = LabelTable::from_pairs(Language::EnUs, 3, [("GUI:OK", "OK")]).unwrap();
        Outcome::Checked {
            work_file: WorkFile::from_table(&table),
            table,
        }
    }

    #[test]
    fn test_bad_table_output_fails_before_encoding_anything() {
        let paths = OutputPaths {
            output: "work.ini".to_string(),
            table_output: Some("out.txt".to_string()),
        };
        let err = encode_outcome(&checked(), &paths, &CsfOptions::default())
            .err()
            .unwrap();
        assert!(err.contains("txt"), "{err}");
    }

    #[test]
    fn test_checked_outcome_encodes_both_files() {
        let paths = OutputPaths {
            output: "work.ini".to_string(),
            table_output: Some("out.csf".to_string()),
        };
        let pending = encode_outcome(&checked(), &paths, &CsfOptions::default()).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(&pending[1].bytes[..4], b" FSC");
    }
}
