//! The binary `.csf` string table read by the game.
//!
//! All integers are little-endian `i32`. Values are UTF-16LE with every byte
//! bitwise inverted.

use std::{
    io::{BufRead, Read, Write},
    sync::LazyLock,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use encoding_rs::WINDOWS_1252;

use crate::{
    error::Error,
    traits::Parser,
    types::{Language, LabelTable},
};

const FILE_MAGIC: &[u8; 4] = b" FSC";
const LABEL_MAGIC: &[u8; 4] = b" LBL";
const STRING_MAGIC: &[u8; 4] = b" RTS";
const WIDE_STRING_MAGIC: &[u8; 4] = b"WRTS";

/// Characters Windows-1252 assigns to the bytes 0x80..=0x9F. Undefined bytes
/// decode to the C1 control of the same value.
static CP1252_HIGH: LazyLock<[char; 32]> = LazyLock::new(|| {
    std::array::from_fn(|i| {
        let byte = 0x80 + i as u8;
        let bytes = [byte];
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        text.chars().next().unwrap_or(char::from(byte))
    })
});

/// Windows-1252 compatibility switches for string values.
///
/// Some tables were written by tools that stored Windows-1252 bytes as raw
/// UTF-16 code units, so characters such as `€` or `…` appear as C1 control
/// codes U+0080..=U+009F.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsfOptions {
    /// Turn C1 control codes into their Windows-1252 characters on read.
    pub read_1252_workaround: bool,
    /// Turn those characters back into C1 control codes on write.
    pub write_1252_workaround: bool,
}

impl Default for CsfOptions {
    fn default() -> Self {
        Self {
            read_1252_workaround: true,
            write_1252_workaround: false,
        }
    }
}

fn decode_1252(value: String) -> String {
    if !value.chars().any(|c| ('\u{80}'..='\u{9f}').contains(&c)) {
        return value;
    }
    value
        .chars()
        .map(|c| match u32::from(c) {
            code @ 0x80..=0x9F => CP1252_HIGH[(code - 0x80) as usize],
            _ => c,
        })
        .collect()
}

fn encode_1252(value: &str) -> String {
    value
        .chars()
        .map(|c| match CP1252_HIGH.iter().position(|&high| high == c) {
            Some(i) if c > '\u{ff}' => char::from(0x80 + i as u8),
            _ => c,
        })
        .collect()
}

/// A `.csf` file as laid out on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    pub version: i32,
    pub language: Language,
    pub labels: Vec<Label>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub value: String,
    /// Optional ASCII payload of a `WRTS` string.
    pub extra: Option<String>,
}

fn read_magic<R: Read>(reader: &mut R) -> Result<[u8; 4], Error> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    Ok(magic)
}

fn read_len<R: Read>(reader: &mut R, what: &str) -> Result<usize, Error> {
    let len = reader.read_i32::<LittleEndian>()?;
    usize::try_from(len).map_err(|_| Error::invalid_data(format!("negative {what}: {len}")))
}

fn read_ascii<R: Read>(reader: &mut R, len: usize) -> Result<String, Error> {
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes)?;
    String::from_utf8(bytes).map_err(|_| Error::invalid_data("label name is not valid ASCII"))
}

fn read_value<R: Read>(reader: &mut R, options: &CsfOptions) -> Result<String, Error> {
    let units = read_len(reader, "string length")?;
    let mut bytes = vec![0u8; units * 2];
    reader.read_exact(&mut bytes)?;
    let utf16: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([!pair[0], !pair[1]]))
        .collect();
    let value = String::from_utf16(&utf16)
        .map_err(|_| Error::invalid_data("string value is not valid UTF-16"))?;
    Ok(if options.read_1252_workaround {
        decode_1252(value)
    } else {
        value
    })
}

fn len_i32(len: usize) -> Result<i32, Error> {
    i32::try_from(len).map_err(|_| Error::invalid_data(format!("length {len} does not fit in i32")))
}

impl Parser for Format {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error> {
        Format::from_reader_with(reader, &CsfOptions::default())
    }

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error> {
        self.to_writer_with(writer, &CsfOptions::default())
    }
}

impl Format {
    /// Reads a table, applying the Windows-1252 read switch to every value.
    pub fn from_reader_with<R: BufRead>(
        mut reader: R,
        options: &CsfOptions,
    ) -> Result<Self, Error> {
        if &read_magic(&mut reader)? != FILE_MAGIC {
            return Err(Error::invalid_data("not a CSF file (bad header magic)"));
        }
        let version = reader.read_i32::<LittleEndian>()?;
        let label_count = read_len(&mut reader, "label count")?;
        let _string_count = reader.read_i32::<LittleEndian>()?;
        let _reserved = reader.read_i32::<LittleEndian>()?;
        let language = Language::from(reader.read_i32::<LittleEndian>()?);

        let mut labels = Vec::with_capacity(label_count.min(1 << 16));
        for _ in 0..label_count {
            if &read_magic(&mut reader)? != LABEL_MAGIC {
                return Err(Error::invalid_data("bad label magic"));
            }
            let pair_count = read_len(&mut reader, "string count")?;
            let name_len = read_len(&mut reader, "label name length")?;
            let name = read_ascii(&mut reader, name_len)?;

            let mut first: Option<(String, Option<String>)> = None;
            for _ in 0..pair_count {
                let magic = read_magic(&mut reader)?;
                let value = match &magic {
                    STRING_MAGIC => (read_value(&mut reader, options)?, None),
                    WIDE_STRING_MAGIC => {
                        let value = read_value(&mut reader, options)?;
                        let extra_len = read_len(&mut reader, "extra length")?;
                        let mut extra = vec![0u8; extra_len];
                        reader.read_exact(&mut extra)?;
                        (value, Some(String::from_utf8_lossy(&extra).into_owned()))
                    }
                    _ => {
                        return Err(Error::invalid_data(format!(
                            "bad string magic in label {name}"
                        )));
                    }
                };
                // Only the first string of a label is ever displayed.
                first.get_or_insert(value);
            }

            let (value, extra) = first.unwrap_or_default();
            labels.push(Label { name, value, extra });
        }

        Ok(Format {
            version,
            language,
            labels,
        })
    }

    pub fn to_writer_with<W: Write>(
        &self,
        mut writer: W,
        options: &CsfOptions,
    ) -> Result<(), Error> {
        let count = len_i32(self.labels.len())?;
        writer.write_all(FILE_MAGIC)?;
        writer.write_i32::<LittleEndian>(self.version)?;
        writer.write_i32::<LittleEndian>(count)?;
        writer.write_i32::<LittleEndian>(count)?;
        writer.write_i32::<LittleEndian>(0)?;
        writer.write_i32::<LittleEndian>(self.language.id())?;

        for label in &self.labels {
            writer.write_all(LABEL_MAGIC)?;
            writer.write_i32::<LittleEndian>(1)?;
            writer.write_i32::<LittleEndian>(len_i32(label.name.len())?)?;
            writer.write_all(label.name.as_bytes())?;

            writer.write_all(if label.extra.is_some() {
                WIDE_STRING_MAGIC
            } else {
                STRING_MAGIC
            })?;
            let utf16: Vec<u16> = if options.write_1252_workaround {
                encode_1252(&label.value).encode_utf16().collect()
            } else {
                label.value.encode_utf16().collect()
            };
            writer.write_i32::<LittleEndian>(len_i32(utf16.len())?)?;
            for unit in utf16 {
                let [lo, hi] = unit.to_le_bytes();
                writer.write_all(&[!lo, !hi])?;
            }
            if let Some(extra) = &label.extra {
                writer.write_i32::<LittleEndian>(len_i32(extra.len())?)?;
                writer.write_all(extra.as_bytes())?;
            }
        }
        Ok(())
    }
}

impl TryFrom<Format> for LabelTable {
    type Error = Error;

    fn try_from(format: Format) -> Result<Self, Self::Error> {
        LabelTable::from_pairs(
            format.language,
            format.version,
            format.labels.into_iter().map(|label| (label.name, label.value)),
        )
    }
}

impl From<&LabelTable> for Format {
    fn from(table: &LabelTable) -> Self {
        Format {
            version: table.version,
            language: table.language,
            labels: table
                .iter()
                .map(|(name, value)| Label {
                    name: name.to_string(),
                    value: value.to_string(),
                    extra: None,
                })
                .collect(),
        }
    }
}
