//! Watch mode: recompiling `.csf` targets whenever their sources change.

pub mod config;
pub mod manager;

pub use config::{ConfigStore, WatchRule, parse_config};
pub use manager::{
    Compiler, CsfCompiler, RecompileFailure, RetryPolicy, RuleState, WatchReport,
    WatchSyncManager, recompile,
};
