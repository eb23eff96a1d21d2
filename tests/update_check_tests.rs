use csfkit::placeholder::{TRANSLATION_DELETE_NEEDED, TRANSLATION_NEEDED};
use csfkit::reconcile::update_check;
use csfkit::{Error, Inputs, KeyFamily, LabelTable, Language, Mode, Outcome, Role, run};

fn table<const N: usize>(pairs: [(&str, &str); N]) -> LabelTable {
    LabelTable::from_pairs(Language::EnUs, 3, pairs).unwrap()
}

#[test]
fn test_unedited_draft_is_reset_when_upstream_changes() {
    let old_upstream = table([("A", "x")]);
    let new_upstream = table([("A", "y")]);
    let old_translated = table([("A", "foo")]);

    let check = update_check(&old_upstream, &new_upstream, &old_translated, &table([("A", "foo")]))
        .unwrap();
    assert_eq!(check.table.get("A"), Some(TRANSLATION_NEEDED));

    let check = update_check(&old_upstream, &new_upstream, &old_translated, &table([("A", "bar")]))
        .unwrap();
    assert_eq!(check.table.get("A"), Some("bar"));
}

#[test]
fn test_label_removed_upstream_is_flagged_or_dropped() {
    let old_upstream = table([("A", "x")]);
    let new_upstream = table([]);
    let old_translated = table([]);

    let check = update_check(&old_upstream, &new_upstream, &old_translated, &table([("A", "bar")]))
        .unwrap();
    assert_eq!(check.table.get("A"), Some(TRANSLATION_DELETE_NEEDED));
    let section = check.work_file.section("a").unwrap();
    assert_eq!(section.reconstruct(KeyFamily::TranslationNew).as_deref(), Some("bar"));
    assert_eq!(section.reconstruct(KeyFamily::UpstreamOld).as_deref(), Some("x"));

    let check = update_check(&old_upstream, &new_upstream, &old_translated, &table([])).unwrap();
    assert!(!check.table.contains("A"));
    assert!(check.work_file.to_table().unwrap().get("A").is_none());
}

#[test]
fn test_unchanged_label_without_translation_gets_placeholder() {
    let upstream = table([("A", "x"), ("B", "y")]);
    let check = update_check(&upstream, &upstream, &table([]), &table([("A", "ax")])).unwrap();

    assert_eq!(check.table.get("A"), Some("ax"));
    assert_eq!(check.table.get("B"), Some(TRANSLATION_NEEDED));
}

#[test]
fn test_result_takes_new_translation_metadata() {
    let mut new_translated = table([("A", "bar")]);
    new_translated.language = Language::Korean;
    new_translated.version = 2;

    let upstream = table([("A", "x")]);
    let check = update_check(&upstream, &upstream, &table([]), &new_translated).unwrap();
    assert_eq!(check.table.language, Language::Korean);
    assert_eq!(check.table.version, 2);
    assert_eq!(check.work_file.language, Language::Korean);
}

#[test]
fn test_run_checks_inputs_before_computing() {
    let inputs = Inputs::new()
        .with(Role::OldUpstream, table([("A", "x")]))
        .with(Role::NewUpstream, table([("A", "y")]))
        .with(Role::NewTranslated, table([("A", "bar")]));

    match run(Mode::UpdateCheck, &inputs) {
        Err(Error::Precondition(message)) => {
            assert_eq!(message, "Please load the translated string table file first.")
        }
        other => panic!("unexpected result: {other:?}"),
    }

    let inputs = inputs.with(Role::OldTranslated, table([("A", "foo")]));
    match run(Mode::UpdateCheck, &inputs).unwrap() {
        Outcome::Checked { table, work_file } => {
            assert_eq!(table.get("A"), Some("bar"));
            assert_eq!(work_file.to_table().unwrap(), table);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}
