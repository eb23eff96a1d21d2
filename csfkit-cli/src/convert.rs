use csfkit::{CsfOptions, LabelTable, convert_auto_with, read_table_with};

const PREVIEW_CHARS: usize = 50;

/// Converts `input` into `output`, both formats inferred from the extension.
pub fn run_convert_command(input: &str, output: &str, options: &CsfOptions) -> Result<(), String> {
    let table = convert_auto_with(input, output, options)
        .map_err(|e| format!("Conversion failed: {e}"))?;
    println!("✅ Converted {input} -> {output}");
    println!("{table}");
    Ok(())
}

fn preview(value: &str, full: bool) -> String {
    let flat = value.replace('\n', "\\n");
    if full || flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let truncated: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{truncated}...")
    }
}

/// Print a view of the labels in a table.
pub fn print_view(table: &LabelTable, label_filter: Option<&str>, full: bool) {
    println!("{table}");
    println!("Version: {}", table.version);

    let filter = label_filter.map(str::to_ascii_lowercase);
    let mut shown = 0;
    for (label, value) in table.iter() {
        if filter.as_deref().is_some_and(|f| !label.contains(f)) {
            continue;
        }
        shown += 1;
        println!("\n  {label}");
        println!("    Value: {}", preview(value, full));
    }

    if shown == 0 {
        eprintln!("No labels found");
    }
}

pub fn run_view_command(
    input: &str,
    label_filter: Option<&str>,
    full: bool,
    json: bool,
    options: &CsfOptions,
) -> Result<(), String> {
    let table =
        read_table_with(input, options).map_err(|e| format!("Failed to read {input}: {e}"))?;
    if json {
        let body = serde_json::to_string_pretty(&table).map_err(|e| e.to_string())?;
        println!("{body}");
    } else {
        print_view(&table, label_filter, full);
    }
    Ok(())
}
