//! All supported string table file formats for csfkit.
//!
//! This module re-exports the main types for each format and provides
//! the [`FormatType`] enum for generic format handling across the crate.

pub mod csf;
pub mod ini;
pub mod json;
pub mod yaml;

use std::{
    fmt::{Display, Formatter},
    path::Path,
    str::FromStr,
};

// Reexporting the formats for easier access
pub use csf::{CsfOptions, Format as CsfFormat};
pub use ini::Document as IniDocument;
pub use json::Format as JsonFormat;
pub use yaml::Format as YamlFormat;

use crate::Error;

/// Represents all supported string table file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatType {
    /// Westwood binary string table (`.csf`).
    Csf,
    /// `SadPencil.Ra2CsfFile.Ini` text (`.ini`).
    Ini,
    /// `SadPencil.Ra2CsfFile.Yaml` text (`.yaml`).
    Yaml,
    /// Label → `{Value, Extra}` object map (`.json`).
    Json,
}

/// Implements [`std::fmt::Display`] for [`FormatType`].
///
/// # Example
/// ```rust
/// use csfkit::formats::FormatType;
/// assert_eq!(FormatType::Csf.to_string(), "csf");
/// assert_eq!(FormatType::Ini.to_string(), "ini");
/// ```
impl Display for FormatType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Implements [`std::str::FromStr`] for [`FormatType`].
///
/// Accepts the case-insensitive names `csf`, `ini`, `yaml`/`yml` and `json`.
///
/// # Example
/// ```rust
/// use csfkit::formats::FormatType;
/// use std::str::FromStr;
/// assert_eq!(FormatType::from_str("CSF").unwrap(), FormatType::Csf);
/// assert_eq!(FormatType::from_str("yml").unwrap(), FormatType::Yaml);
/// assert!(FormatType::from_str("strings").is_err());
/// ```
impl FromStr for FormatType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches('.').to_ascii_lowercase();
        match s.as_str() {
            "csf" => Ok(FormatType::Csf),
            "ini" => Ok(FormatType::Ini),
            "yaml" | "yml" => Ok(FormatType::Yaml),
            "json" => Ok(FormatType::Json),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl FormatType {
    pub const ALL: [FormatType; 4] = [
        FormatType::Csf,
        FormatType::Ini,
        FormatType::Yaml,
        FormatType::Json,
    ];

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            FormatType::Csf => "csf",
            FormatType::Ini => "ini",
            FormatType::Yaml => "yaml",
            FormatType::Json => "json",
        }
    }
}

/// Infers the format from a path's extension, case-insensitively.
pub fn infer_format_from_extension<P: AsRef<Path>>(path: P) -> Option<FormatType> {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| FormatType::from_str(ext).ok())
}
