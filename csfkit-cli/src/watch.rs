use std::{path::PathBuf, sync::Arc};

use csfkit::{
    CsfOptions,
    watch::{ConfigStore, CsfCompiler, WatchReport, WatchSyncManager, parse_config},
};
use tracing::info;

fn store(config: Option<PathBuf>) -> Result<ConfigStore, String> {
    match config {
        Some(path) => Ok(ConfigStore::new(path)),
        None => ConfigStore::default_location().map_err(|e| e.to_string()),
    }
}

pub fn run_watch_show_command(config: Option<PathBuf>) -> Result<(), String> {
    let store = store(config)?;
    let text = store.load().map_err(|e| e.to_string())?;
    println!("# {}", store.path().display());
    print!("{text}");
    Ok(())
}

/// Validates and saves the configuration text.
pub fn run_watch_set_command(config: Option<PathBuf>, text: &str) -> Result<(), String> {
    let rules = parse_config(text).map_err(|e| e.to_string())?;
    let store = store(config)?;
    store.save(text).map_err(|e| e.to_string())?;
    println!("Your changes have been saved successfully ({} rules).", rules.len());
    Ok(())
}

/// Installs the saved rules and reports every recompile until Ctrl-C.
pub fn run_watch_command(config: Option<PathBuf>, options: CsfOptions) -> Result<(), String> {
    let store = store(config)?;
    let text = store.load().map_err(|e| e.to_string())?;

    let runtime = tokio::runtime::Runtime::new().map_err(|e| e.to_string())?;
    runtime.block_on(async move {
        let compiler = Arc::new(CsfCompiler::new(options));
        let (mut manager, mut reports) =
            WatchSyncManager::new(compiler).map_err(|e| e.to_string())?;
        let count = manager.reconfigure(&text).map_err(|e| e.to_string())?;
        if count == 0 {
            return Err(format!(
                "No watch rules configured in {}",
                store.path().display()
            ));
        }
        for rule in manager.rules() {
            println!("👀 {rule}");
        }

        loop {
            tokio::select! {
                report = reports.recv() => match report {
                    Some(WatchReport::Compiled { rule, attempts }) => {
                        println!("✅ {rule} ({attempts} attempt(s))");
                    }
                    Some(WatchReport::Failed { rule, attempts, error }) => {
                        eprintln!("❌ {rule} failed after {attempts} attempt(s): {error}");
                    }
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("stopping watch mode");
                    break;
                }
            }
        }
        manager.clear();
        Ok(())
    })
}
