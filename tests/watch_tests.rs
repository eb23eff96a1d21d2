use std::{fs, sync::Arc, time::Duration};

use csfkit::watch::{CsfCompiler, WatchReport, WatchSyncManager};
use csfkit::{CsfOptions, FormatType, LabelTable, Language, read_table, write_table};
use tempfile::TempDir;

fn sample(value: &str) -> LabelTable {
    LabelTable::from_pairs(Language::German, 3, [("GUI:OK", value), ("TXT:Two", "a\nb")]).unwrap()
}

/// Waits for the first successful compile, skipping reports about
/// half-written intermediate states of the source.
async fn next_compiled(reports: &mut tokio::sync::mpsc::UnboundedReceiver<WatchReport>) {
    loop {
        match reports.recv().await {
            Some(WatchReport::Compiled { .. }) => return,
            Some(WatchReport::Failed { .. }) => continue,
            None => panic!("report channel closed"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_writing_source_recompiles_target() {
    let dir = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let source = dir.path().join("ra2md.ini");
    let target = out_dir.path().join("ra2md.csf");
    write_table(&sample("Jawohl"), &source).unwrap();

    let (mut manager, mut reports) =
        WatchSyncManager::new(Arc::new(CsfCompiler::default())).unwrap();
    let config = format!("{} , {}\n", source.display(), target.display());
    assert_eq!(manager.reconfigure(&config).unwrap(), 1);
    tokio::time::sleep(Duration::from_millis(200)).await;

    write_table(&sample("Verstanden"), &source).unwrap();
    tokio::time::timeout(Duration::from_secs(10), next_compiled(&mut reports))
        .await
        .expect("no compile report within 10s");

    let compiled = read_table(&target).unwrap();
    assert_eq!(compiled.get("gui:ok"), Some("Verstanden"));
    assert_eq!(compiled.language, Language::German);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_other_files_in_directory_are_ignored() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("watched.yaml");
    let target = dir.path().join("watched.csf");
    write_table(&sample("Ja"), &source).unwrap();

    let (mut manager, mut reports) =
        WatchSyncManager::new(Arc::new(CsfCompiler::default())).unwrap();
    manager
        .reconfigure(&format!("{},{}", source.display(), target.display()))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    fs::write(dir.path().join("unrelated.txt"), "noise").unwrap();
    let report = tokio::time::timeout(Duration::from_millis(1500), reports.recv()).await;
    assert!(report.is_err(), "unexpected report: {report:?}");
    assert!(!target.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cleared_rules_stop_watching() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("src.json");
    let target = dir.path().join("dst.csf");
    write_table(&sample("Ja"), &source).unwrap();

    let (mut manager, mut reports) =
        WatchSyncManager::new(Arc::new(CsfCompiler::default())).unwrap();
    manager
        .reconfigure(&format!("{},{}", source.display(), target.display()))
        .unwrap();
    manager.clear();
    assert!(!manager.notify_changed(&source));
    tokio::time::sleep(Duration::from_millis(200)).await;

    write_table(&sample("Nein"), &source).unwrap();
    let report = tokio::time::timeout(Duration::from_millis(1500), reports.recv()).await;
    assert!(!matches!(report, Ok(Some(_))), "unexpected report: {report:?}");
    assert!(!target.exists());
}

#[test]
fn test_compiler_output_is_a_csf_image() {
    use csfkit::watch::Compiler;

    let dir = TempDir::new().unwrap();
    let source = dir.path().join("table.yaml");
    write_table(&sample("Ja"), &source).unwrap();

    let bytes = CsfCompiler::default().compile(&source).unwrap();
    assert_eq!(&bytes[..4], b" FSC");
    let options = CsfOptions::default();
    let table =
        csfkit::codec::table_from_reader(bytes.as_slice(), FormatType::Csf, &options).unwrap();
    assert_eq!(table, sample("Ja"));
}
