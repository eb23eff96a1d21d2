//! Watch-mode configuration: parsing `source,target` lines and persisting
//! the text outside any project tree.

use std::{
    fmt::{Display, Formatter},
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::error::Error;

pub const CONFIG_DIR_NAME: &str = "csfkit";
pub const CONFIG_FILE_NAME: &str = "watch_mode_config.dat";

/// A (source, target) pair: whenever `source` is written, `target` is
/// recompiled from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchRule {
    pub source: PathBuf,
    pub target: PathBuf,
}

impl WatchRule {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// Parses one `source,target` line. Fields are trimmed and anything
    /// after the second field is ignored.
    pub fn parse_line(line: &str) -> Result<Self, Error> {
        let mut fields = line.split(',').map(str::trim);
        match (fields.next(), fields.next()) {
            (Some(source), Some(target)) => Ok(Self::new(source, target)),
            _ => Err(Error::validation_error(format!(
                "Invalid watch config line \"{line}\": expected \"source,target\"."
            ))),
        }
    }
}

impl Display for WatchRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.source.display(), self.target.display())
    }
}

/// Parses a whole configuration. Blank lines are skipped; any malformed line
/// rejects the entire text.
pub fn parse_config(text: &str) -> Result<Vec<WatchRule>, Error> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(WatchRule::parse_line)
        .collect()
}

/// Where the configuration text is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/csfkit/watch_mode_config.dat`, if the platform has a
    /// config directory.
    pub fn default_location() -> Result<Self, Error> {
        let base = dirs::config_dir().ok_or_else(|| {
            Error::Precondition("could not determine the user config directory".to_string())
        })?;
        Ok(Self::new(base.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the saved text, or an empty string if nothing was saved yet.
    pub fn load(&self) -> Result<String, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, text: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, text)?;
        debug!(path = %self.path.display(), "saved watch config");
        Ok(())
    }
}
