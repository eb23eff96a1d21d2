//! The [`Parser`] trait shared by every on-disk representation.

use std::{
    fs,
    io::{BufRead, Write},
    path::Path,
};

use crate::error::Error;

/// Decoding and encoding of one file representation.
///
/// Implementors provide [`Parser::from_reader`] and [`Parser::to_writer`];
/// the whole-file helpers build on those. [`Parser::write_to`] encodes into
/// memory first, so a failed encode leaves an existing file untouched.
///
/// # Example
///
/// ```rust,no_run
/// use csfkit::{Parser, WorkFile};
/// let work_file = WorkFile::read_from("ra2md_work.ini")?;
/// work_file.write_to("ra2md_work_copy.ini")?;
/// Ok::<(), csfkit::Error>(())
/// ```
pub trait Parser: Sized {
    fn from_reader<R: BufRead>(reader: R) -> Result<Self, Error>;

    fn to_writer<W: Write>(&self, writer: W) -> Result<(), Error>;

    fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_reader(bytes)
    }

    fn from_str(text: &str) -> Result<Self, Error> {
        Self::from_bytes(text.as_bytes())
    }

    fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut buffer = Vec::new();
        self.to_writer(&mut buffer)?;
        Ok(buffer)
    }

    fn read_from<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        Self::from_bytes(&fs::read(path)?)
    }

    fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::IniDocument;
    use tempfile::TempDir;

    #[test]
    fn test_failed_encode_keeps_existing_file() {
        struct Broken;

        impl Parser for Broken {
            fn from_reader<R: BufRead>(_reader: R) -> Result<Self, Error> {
                Ok(Broken)
            }

            fn to_writer<W: Write>(&self, mut writer: W) -> Result<(), Error> {
                writer.write_all(b"partial")?;
                Err(Error::invalid_data("cannot encode"))
            }
        }

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.ini");
        fs::write(&path, "original").unwrap();

        assert!(Broken.write_to(&path).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn test_read_from_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = IniDocument::read_from(dir.path().join("missing.ini")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
