//! CLI library for testing purposes

pub mod convert;
pub mod label_check;
pub mod translate;
pub mod watch;

pub use csfkit::{CsfOptions, LabelTable, Mode, Role};
