use super::{load, RosterColumns};
use crate::error::Error;
use crate::roster::Locale;

fn write_roster(dir: &std::path::Path, contents: &str) -> std::path::PathBuf {
    let path = dir.join("roster.csv");
    std::fs::write(&path, contents).expect("write roster");
    path
}

#[test]
fn english_roster_maps_to_canonical_fields_in_order() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_roster(
        dir.path(),
        "Timestamp:,Username:,E-Mail Address:\n\
         2024/05/01 09:15,alice,alice@example.net\n\
         2024/05/02 11:40,bob,bob@example.net\n",
    );

    let records = load(Locale::En.schema(), &path, RosterColumns::Full).expect("load roster");
    let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["alice", "bob"]);
    assert_eq!(records[1].email, "bob@example.net");
    assert_eq!(records[0].registered, "2024/05/01 09:15");
}

#[test]
fn polish_roster_uses_polish_labels() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_roster(
        dir.path(),
        "Sygnatura czasowa:,Nazwa Użytkownika:,Adres E-Mail:\n\
         2024/05/01 09:15,zofia,zofia@example.pl\n",
    );

    let records = load(Locale::Pl.schema(), &path, RosterColumns::Full).expect("load roster");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "zofia");
}

#[test]
fn missing_column_rejects_whole_batch() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_roster(
        dir.path(),
        "Username:,E-Mail Address:\nalice,alice@example.net\nbob,bob@example.net\n",
    );

    let err = load(Locale::En.schema(), &path, RosterColumns::Full).expect_err("no timestamp");
    match err {
        Error::SchemaMismatch { detail, .. } => assert!(detail.contains("Timestamp:"), "{detail}"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn wrong_locale_labels_are_a_schema_mismatch() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_roster(
        dir.path(),
        "Timestamp:,Username:,E-Mail Address:\n2024/05/01,alice,alice@example.net\n",
    );

    let err = load(Locale::Pl.schema(), &path, RosterColumns::Full).expect_err("EN roster as PL");
    assert!(matches!(err, Error::SchemaMismatch { .. }), "{err}");
}

#[test]
fn name_only_roster_is_enough_for_revocation() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_roster(dir.path(), "Username:\nalice\nbob\n");

    let records = load(Locale::En.schema(), &path, RosterColumns::NameOnly).expect("load roster");
    assert_eq!(records.len(), 2);
    assert!(records[0].email.is_empty());
}

#[test]
fn absent_file_is_data_source_missing() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let err = load(
        Locale::En.schema(),
        &dir.path().join("nope.csv"),
        RosterColumns::Full,
    )
    .expect_err("missing roster");
    assert!(matches!(err, Error::DataSourceMissing { .. }), "{err}");
}
