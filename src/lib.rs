//! Tools for maintaining translations of Red Alert 2 string tables.
//!
//! Reads and writes `.csf`, `.ini`, `.yaml` and `.json` string tables, builds
//! the annotated work files translators edit when upstream text changes, and
//! keeps compiled `.csf` files in sync with their sources in watch mode.
//! All formats convert through the unified [`LabelTable`] model.

pub mod codec;
pub mod error;
pub mod formats;
pub mod label_check;
pub mod placeholder;
pub mod reconcile;
pub mod traits;
pub mod types;
pub mod watch;
pub mod workfile;

// Re-export most used types for easy consumption
pub use crate::{
    codec::{
        convert, convert_auto, convert_auto_with, read_table, read_table_with, read_work_file,
        write_table, write_table_with, write_work_file,
    },
    error::Error,
    formats::{CsfOptions, FormatType},
    reconcile::{Inputs, Mode, Outcome, Role, UpdateCheck, run},
    traits::Parser,
    types::{Language, LabelTable},
    workfile::{KeyFamily, WorkFile},
};
