mod common;

use std::{fs, sync::Arc};

use common::{record, session_over, temp_root};
use finance_ledger::{
    errors::LedgerError,
    ledger::{Category, RecordDraft},
    session::{SessionNotice, UserId},
    storage::{JsonRecordStore, PersistenceProvider, SnapshotUpdate, StoredRecords},
};

#[test]
fn records_survive_a_new_store_instance() {
    let root = temp_root();
    let user = UserId::from("alice");
    let records = vec![
        record(0, 100.0, "Paycheck", Category::Income),
        record(1, 20.25, "Coffee", Category::Spent),
    ];

    JsonRecordStore::new(&root)
        .unwrap()
        .store_records(&user, &records)
        .unwrap();

    let reopened = JsonRecordStore::new(&root).unwrap();
    assert_eq!(reopened.load_snapshot(&user).unwrap(), records);
    assert!(reopened.user_path(&user).ends_with("users/alice.json"));
}

#[test]
fn unknown_user_loads_empty() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    assert!(store.load_snapshot(&UserId::from("ghost")).unwrap().is_empty());
}

#[test]
fn watchers_receive_what_was_written() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    let user = UserId::from("alice");
    let other = store.watch(&UserId::from("bob")).unwrap();
    let updates = store.watch(&user).unwrap();
    let records = vec![record(3, 5.0, "Tea", Category::Spent)];

    store.store_records(&user, &records).unwrap();

    assert_eq!(updates.try_recv().unwrap(), SnapshotUpdate::Replaced(records));
    assert!(other.try_recv().is_err());
}

#[test]
fn corrupt_document_is_a_serialization_error() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    let user = UserId::from("alice");
    fs::write(store.user_path(&user), "{\"records\": [").unwrap();

    assert!(matches!(
        store.load_snapshot(&user),
        Err(LedgerError::Serde(_))
    ));
}

#[test]
fn newer_schema_is_rejected() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    let user = UserId::from("alice");
    let mut document = StoredRecords::new(Vec::new());
    document.schema_version = 99;
    fs::write(
        store.user_path(&user),
        serde_json::to_string(&document).unwrap(),
    )
    .unwrap();

    assert!(matches!(
        store.load_snapshot(&user),
        Err(LedgerError::Persistence(_))
    ));
}

#[test]
fn document_without_version_or_source_still_loads() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    let user = UserId::from("alice");
    fs::write(
        store.user_path(&user),
        r#"{"records":[{"id":4,"amount":7.5,"category":"Spent","date":"2023-01-01"}]}"#,
    )
    .unwrap();

    let records = store.load_snapshot(&user).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source, "");
    assert_eq!(records[0].category, Category::Spent);
}

#[test]
fn session_over_json_store_persists_across_restarts() {
    let root = temp_root();

    {
        let store = Arc::new(JsonRecordStore::new(&root).unwrap());
        let (identity, mut session) = session_over(store);
        identity.sign_in("alice").unwrap();
        session.process_events();
        session.add(RecordDraft::new(100.0).source("Paycheck"));
        session.add(
            RecordDraft::new(20.0)
                .source("Coffee")
                .category(Category::Spent),
        );
        session.delete(0);
        // The write echo equals local state and is not re-applied.
        assert!(session.process_events().is_empty());
    }

    let store = Arc::new(JsonRecordStore::new(&root).unwrap());
    let (identity, mut session) = session_over(store);
    identity.sign_in("alice").unwrap();
    let notices = session.process_events();

    assert!(matches!(
        notices.last(),
        Some(SessionNotice::SnapshotApplied { report, .. }) if report.loaded == 1
    ));
    let view = session.current_view();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].id, 1);
    assert_eq!(view[0].source, "Coffee");
    assert_eq!(session.totals().net, -20.0);
    // Persisted ids are kept, so the next record continues after them.
    assert_eq!(session.ledger().next_id(), 2);
}

#[test]
fn lookalike_user_ids_keep_separate_files() {
    let store = JsonRecordStore::new(temp_root()).unwrap();
    let dotted = UserId::from("a.b");
    let underscored = UserId::from("a_b");
    let upper = UserId::from("A_B");
    assert_ne!(store.user_path(&dotted), store.user_path(&underscored));
    assert_ne!(store.user_path(&underscored), store.user_path(&upper));

    let underscored_records = vec![record(0, 7.0, "Mine", Category::Income)];
    store
        .store_records(&underscored, &underscored_records)
        .unwrap();
    let underscored_updates = store.watch(&underscored).unwrap();

    store
        .store_records(&dotted, &[record(0, 1.0, "Theirs", Category::Spent)])
        .unwrap();

    assert!(underscored_updates.try_recv().is_err());
    assert_eq!(
        store.load_snapshot(&underscored).unwrap(),
        underscored_records
    );
    assert!(store.load_snapshot(&upper).unwrap().is_empty());
    assert_eq!(store.load_snapshot(&dotted).unwrap().len(), 1);
}
