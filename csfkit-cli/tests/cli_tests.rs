use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const UPSTREAM_OLD: &str = "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=2\nCsfVersion=3\nCsfLang=0\n\n[GUI:OK]\nValue=OK\n\n[TXT:Intro]\nValue=Welcome\n";
const UPSTREAM_NEW: &str = "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=2\nCsfVersion=3\nCsfLang=0\n\n[GUI:OK]\nValue=OK\n\n[TXT:Intro]\nValue=Welcome back\nValueLine2=Commander\n";
const TRANSLATED: &str = "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=2\nCsfVersion=3\nCsfLang=2\n\n[GUI:OK]\nValue=Jawohl\n\n[TXT:Intro]\nValue=Willkommen\n";

fn csfkit() -> Command {
    Command::cargo_bin("csfkit").unwrap()
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_convert_ini_to_csf_and_view() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "upstream.ini", UPSTREAM_OLD);
    let output = dir.path().join("upstream.csf");

    csfkit()
        .args(["convert", "-i", &input, "-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("contains 2 labels"));

    csfkit()
        .args(["view", "-i", output.to_str().unwrap(), "--label", "intro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("txt:intro"))
        .stdout(predicate::str::contains("Welcome"))
        .stdout(predicate::str::contains("gui:ok").not());
}

#[test]
fn test_new_writes_placeholders() {
    let dir = TempDir::new().unwrap();
    let upstream = write(&dir, "upstream.ini", UPSTREAM_NEW);
    let output = dir.path().join("work.ini");

    csfkit()
        .args(["new", "-u", &upstream, "-o", output.to_str().unwrap()])
        .assert()
        .success();

    let work = fs::read_to_string(&output).unwrap();
    assert!(work.contains("Value=TODO_Translation_Needed\r\n"));
    assert!(work.contains("ValueLine2=TODO_Translation_Needed\r\n"));
    assert!(work.contains("UpstreamLine2=Commander\r\n"));
}

#[test]
fn test_update_resets_changed_labels() {
    let dir = TempDir::new().unwrap();
    let old_upstream = write(&dir, "old.ini", UPSTREAM_OLD);
    let new_upstream = write(&dir, "new.ini", UPSTREAM_NEW);
    let translated = write(&dir, "de.ini", TRANSLATED);
    let output = dir.path().join("de-work.ini");

    csfkit()
        .args([
            "update",
            "--old-upstream",
            &old_upstream,
            "--new-upstream",
            &new_upstream,
            "--old-translated",
            &translated,
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let work = fs::read_to_string(&output).unwrap();
    assert!(work.contains("[gui:ok]\r\nValue=Jawohl\r\nUpstream=OK\r\n"));
    assert!(work.contains("UpstreamOld=Welcome\r\n"));
    assert!(!work.contains("Willkommen"));
}

#[test]
fn test_update_check_writes_table_and_work_file() {
    let dir = TempDir::new().unwrap();
    let old_upstream = write(&dir, "old.ini", UPSTREAM_OLD);
    let new_upstream = write(&dir, "new.ini", UPSTREAM_NEW);
    let translated = write(&dir, "de.ini", TRANSLATED);
    let output = dir.path().join("check.ini");
    let table = dir.path().join("check.yaml");

    csfkit()
        .args([
            "update-check",
            "--old-upstream",
            &old_upstream,
            "--new-upstream",
            &new_upstream,
            "--old-translated",
            &translated,
            "--new-translated",
            &translated,
            "-o",
            output.to_str().unwrap(),
            "--table-output",
            table.to_str().unwrap(),
        ])
        .assert()
        .success();

    let work = fs::read_to_string(&output).unwrap();
    assert!(work.contains("TranslationOld=Willkommen\r\n"));
    let yaml = fs::read_to_string(&table).unwrap();
    assert!(yaml.contains("TODO_Translation_Needed"));
    assert!(yaml.contains("Jawohl"));
}

#[test]
fn test_update_check_writes_nothing_when_table_output_is_unsupported() {
    let dir = TempDir::new().unwrap();
    let old_upstream = write(&dir, "old.ini", UPSTREAM_OLD);
    let new_upstream = write(&dir, "new.ini", UPSTREAM_NEW);
    let translated = write(&dir, "de.ini", TRANSLATED);
    let output = dir.path().join("check.ini");
    let table = dir.path().join("check.txt");

    csfkit()
        .args([
            "update-check",
            "--old-upstream",
            &old_upstream,
            "--new-upstream",
            &new_upstream,
            "--old-translated",
            &translated,
            "--new-translated",
            &translated,
            "-o",
            output.to_str().unwrap(),
            "--table-output",
            table.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("txt"));

    assert!(!output.exists());
    assert!(!table.exists());
}

#[test]
fn test_convert_to_csf_with_cp1252_write_workaround() {
    let dir = TempDir::new().unwrap();
    let input = write(
        &dir,
        "price.ini",
        "[SadPencil.Ra2CsfFile.Ini]\nIniVersion=2\nCsfVersion=3\nCsfLang=0\n\n[TXT:Price]\nValue=5 €\n",
    );
    let output = dir.path().join("price.csf");
    let raw = dir.path().join("raw.ini");

    csfkit()
        .args(["convert", "-i", &input, "-o", output.to_str().unwrap()])
        .arg("--cp1252-write-workaround")
        .assert()
        .success();
    csfkit()
        .args(["convert", "-i", output.to_str().unwrap(), "-o", raw.to_str().unwrap()])
        .arg("--no-cp1252-read-workaround")
        .assert()
        .success();

    let text = fs::read_to_string(&raw).unwrap();
    assert!(text.contains("Value=5 \u{80}"), "{text:?}");
}

#[test]
fn test_work_file_output_must_be_ini() {
    let dir = TempDir::new().unwrap();
    let upstream = write(&dir, "upstream.ini", UPSTREAM_OLD);

    csfkit()
        .args(["new", "-u", &upstream, "-o", "work.csf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_label_check_adds_missing_labels() {
    let dir = TempDir::new().unwrap();
    let input = write(&dir, "table.ini", UPSTREAM_OLD);
    let maps = dir.path().join("maps");
    fs::create_dir(&maps).unwrap();
    fs::write(maps.join("m1.map"), "[Actions]\n0=1,11,0,TXT:Missing,0,0,0,0,A\n").unwrap();
    let output = dir.path().join("checked.ini");

    csfkit()
        .args([
            "label-check",
            "-i",
            &input,
            "-m",
            maps.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 labels are missing."));

    let checked = fs::read_to_string(&output).unwrap();
    assert!(checked.contains("[txt:missing]\r\nValue=TODO_Missing_Label\r\n"));
}

#[test]
fn test_watch_set_validates_and_saves() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("watch.dat");

    csfkit()
        .args(["watch", "--config", config.to_str().unwrap(), "set", "--text", "only-one-field"])
        .assert()
        .failure();
    assert!(!config.exists());

    csfkit()
        .args(["watch", "--config", config.to_str().unwrap(), "set", "--text", "a.ini,a.csf\n"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 rules"));

    csfkit()
        .args(["watch", "show", "--config", config.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("a.ini,a.csf"));
}
