use csfkit::{
    CsfOptions,
    label_check::{add_missing_labels, scan_map_folder},
    read_table_with, write_table_with,
};

/// Adds a placeholder for every label referenced by the maps in `maps` but
/// missing from `input`, and writes the result to `output`.
pub fn run_label_check_command(
    input: &str,
    maps: &str,
    output: &str,
    options: &CsfOptions,
) -> Result<(), String> {
    let table =
        read_table_with(input, options).map_err(|e| format!("Failed to read {input}: {e}"))?;
    let scan = scan_map_folder(maps).map_err(|e| e.to_string())?;

    for (path, reason) in &scan.failures {
        eprintln!("Failed to read map file {}: {reason}", path.display());
    }

    let (checked, missing) =
        add_missing_labels(&table, &scan.labels).map_err(|e| e.to_string())?;
    println!(
        "Scanned {} map files, {} labels referenced.",
        scan.files_scanned,
        scan.labels.len()
    );
    println!("{missing} labels are missing.");

    write_table_with(&checked, output, options).map_err(|e| e.to_string())?;
    println!("✅ Wrote {} labels to {output}", checked.len());
    Ok(())
}
