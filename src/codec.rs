//! Reading and writing [`LabelTable`]s and [`WorkFile`]s by file format.
//!
//! Every format converts through the same `LabelTable` model, so any format
//! can be converted into any other.

use std::{
    io::{BufRead, Cursor},
    path::Path,
};

use tracing::debug;

use crate::{
    error::Error,
    formats::{
        CsfFormat, CsfOptions, FormatType, IniDocument, JsonFormat, YamlFormat,
        infer_format_from_extension,
    },
    traits::Parser,
    types::LabelTable,
    workfile::WorkFile,
};

/// Infers the format of `path` from its extension, rejecting unknown ones.
pub fn format_of<P: AsRef<Path>>(path: P) -> Result<FormatType, Error> {
    let path = path.as_ref();
    infer_format_from_extension(path).ok_or_else(|| {
        Error::UnsupportedFormat(format!(
            "Unexpected file extension {:?}. Only .csf, .ini, .yaml, and .json files are accepted.",
            path.extension().unwrap_or_default()
        ))
    })
}

/// Parses a table of the given format from any reader.
///
/// `options` only affect `.csf` input.
pub fn table_from_reader<R: BufRead>(
    reader: R,
    format: FormatType,
    options: &CsfOptions,
) -> Result<LabelTable, Error> {
    match format {
        FormatType::Csf => LabelTable::try_from(CsfFormat::from_reader_with(reader, options)?),
        FormatType::Ini => LabelTable::try_from(&IniDocument::from_reader(reader)?),
        FormatType::Yaml => LabelTable::try_from(YamlFormat::from_reader(reader)?),
        FormatType::Json => LabelTable::try_from(JsonFormat::from_reader(reader)?),
    }
}

/// Serializes a table into an in-memory buffer of the given format.
pub fn table_to_bytes(
    table: &LabelTable,
    format: FormatType,
    options: &CsfOptions,
) -> Result<Vec<u8>, Error> {
    match format {
        FormatType::Csf => {
            let mut bytes = Vec::new();
            CsfFormat::from(table).to_writer_with(&mut bytes, options)?;
            Ok(bytes)
        }
        FormatType::Ini => IniDocument::from(table).to_bytes(),
        FormatType::Yaml => YamlFormat::from(table).to_bytes(),
        FormatType::Json => JsonFormat::from(table).to_bytes(),
    }
}

/// Reads a table, inferring the format from the file extension.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<LabelTable, Error> {
    read_table_with(path, &CsfOptions::default())
}

pub fn read_table_with<P: AsRef<Path>>(path: P, options: &CsfOptions) -> Result<LabelTable, Error> {
    let format = format_of(&path)?;
    read_table_by_type(path, format, options)
}

pub fn read_table_by_type<P: AsRef<Path>>(
    path: P,
    format: FormatType,
    options: &CsfOptions,
) -> Result<LabelTable, Error> {
    let bytes = std::fs::read(path.as_ref())?;
    let table = table_from_reader(Cursor::new(bytes), format, options)?;
    debug!(
        path = %path.as_ref().display(),
        %format,
        labels = table.len(),
        "loaded string table"
    );
    Ok(table)
}

/// Writes a table, inferring the format from the file extension.
///
/// The whole file is encoded in memory before the destination is truncated,
/// so an encoding failure never leaves a half-written file behind.
pub fn write_table<P: AsRef<Path>>(table: &LabelTable, path: P) -> Result<(), Error> {
    write_table_with(table, path, &CsfOptions::default())
}

pub fn write_table_with<P: AsRef<Path>>(
    table: &LabelTable,
    path: P,
    options: &CsfOptions,
) -> Result<(), Error> {
    let format = format_of(&path)?;
    write_table_by_type(table, path, format, options)
}

pub fn write_table_by_type<P: AsRef<Path>>(
    table: &LabelTable,
    path: P,
    format: FormatType,
    options: &CsfOptions,
) -> Result<(), Error> {
    let bytes = table_to_bytes(table, format, options)?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

pub fn read_work_file<P: AsRef<Path>>(path: P) -> Result<WorkFile, Error> {
    WorkFile::read_from(path)
}

pub fn write_work_file<P: AsRef<Path>>(work_file: &WorkFile, path: P) -> Result<(), Error> {
    let bytes = work_file.to_bytes()?;
    std::fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Converts a file between explicit formats.
pub fn convert<P: AsRef<Path>>(
    input: P,
    input_format: FormatType,
    output: P,
    output_format: FormatType,
    options: &CsfOptions,
) -> Result<LabelTable, Error> {
    let table = read_table_by_type(&input, input_format, options)?;
    write_table_by_type(&table, &output, output_format, options)?;
    Ok(table)
}

/// Converts a file, inferring both formats from the extensions.
///
/// # Example
/// ```rust,no_run
/// csfkit::convert_auto("ra2md.csf", "ra2md.ini")?;
/// # Ok::<(), csfkit::Error>(())
/// ```
pub fn convert_auto<P: AsRef<Path>>(input: P, output: P) -> Result<LabelTable, Error> {
    convert_auto_with(input, output, &CsfOptions::default())
}

pub fn convert_auto_with<P: AsRef<Path>>(
    input: P,
    output: P,
    options: &CsfOptions,
) -> Result<LabelTable, Error> {
    let input_format = format_of(&input)?;
    let output_format = format_of(&output)?;
    convert(input, input_format, output, output_format, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reconcile::new_translation, types::Language};
    use tempfile::TempDir;

    fn sample() -> LabelTable {
        LabelTable::from_pairs(
            Language::French,
            3,
            [("GUI:OK", "D'accord"), ("TXT:Long", "ligne 1\nligne 2")],
        )
        .unwrap()
    }

    #[test]
    fn test_every_format_round_trips() {
        let dir = TempDir::new().unwrap();
        for format in [FormatType::Csf, FormatType::Ini, FormatType::Yaml] {
            let path = dir.path().join(format!("table.{}", format.extension()));
            write_table(&sample(), &path).unwrap();
            assert_eq!(read_table(&path).unwrap(), sample(), "format {format}");
        }
    }

    #[test]
    fn test_json_drops_header_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.json");
        write_table(&sample(), &path).unwrap();
        let table = read_table(&path).unwrap();
        assert_eq!(table.language, Language::EnUs);
        assert_eq!(table.get("txt:long"), Some("ligne 1\nligne 2"));
    }

    #[test]
    fn test_convert_auto_between_formats() {
        let dir = TempDir::new().unwrap();
        let ini = dir.path().join("in.ini");
        let csf = dir.path().join("out.csf");
        write_table(&sample(), &ini).unwrap();
        convert_auto(&ini, &csf).unwrap();
        assert_eq!(read_table(&csf).unwrap(), sample());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let err = read_table("table.txt").unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn test_convert_applies_cp1252_options() {
        let dir = TempDir::new().unwrap();
        let ini = dir.path().join("in.ini");
        let csf = dir.path().join("out.csf");
        let table = LabelTable::from_pairs(Language::EnUs, 3, [("TXT:Cost", "5 €")]).unwrap();
        write_table(&table, &ini).unwrap();

        let options = CsfOptions {
            read_1252_workaround: false,
            write_1252_workaround: true,
        };
        convert_auto_with(&ini, &csf, &options).unwrap();
        let raw = read_table_with(&csf, &options).unwrap();
        assert_eq!(raw.get("txt:cost"), Some("5 \u{80}"));
        assert_eq!(read_table(&csf).unwrap().get("txt:cost"), Some("5 €"));
    }

    #[test]
    fn test_work_file_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("work.ini");
        let work_file = new_translation(&sample()).unwrap();
        write_work_file(&work_file, &path).unwrap();
        assert_eq!(read_work_file(&path).unwrap(), work_file);
    }
}
