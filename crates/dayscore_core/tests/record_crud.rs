use chrono::NaiveDate;
use dayscore_core::db::{open_db, open_db_in_memory};
use dayscore_core::{
    Listing, MemoPayload, NewUser, RecordPageRequest, RecordService, RecordServiceError,
    RepoError, SatisfactionLevel, SaveOutcome, Session, SqliteRecordRepository,
    SqliteUserRepository, UserRepository, ImportedRecord,
};
use rusqlite::Connection;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
}

fn level(value: u8) -> SatisfactionLevel {
    SatisfactionLevel::new(value).unwrap()
}

fn register(conn: &Connection, username: &str) -> Session {
    let users = SqliteUserRepository::new(conn);
    let user = users
        .create_user(&NewUser::new(username, format!("{username}@example.com")))
        .unwrap();
    Session::new(user.id)
}

fn stored_memo(conn: &Connection, id: i64) -> String {
    conn.query_row("SELECT memo FROM records WHERE id = ?1;", [id], |row| {
        row.get(0)
    })
    .unwrap()
}

#[test]
fn save_entry_stores_encoded_memo_and_reads_back_notes() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let notes = MemoPayload::new("散歩した", "早起きできなかった");
    let (entry, outcome) = service
        .save_entry(&session, day(15), level(4), &notes)
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Created);
    assert_eq!(entry.notes, notes);
    assert_eq!(entry.satisfaction_label, "良い");
    assert_eq!(entry.satisfaction_emoji, "😊");
    assert_eq!(entry.title, "散歩した");
    assert_eq!(
        stored_memo(&conn, entry.id),
        "できたこと: 散歩した\n\nできなかったこと: 早起きできなかった"
    );
}

#[test]
fn saving_same_date_twice_updates_in_place() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let (first, _) = service
        .save_entry(&session, day(15), level(2), &MemoPayload::new("a", "b"))
        .unwrap();
    let (second, outcome) = service
        .save_entry(&session, day(15), level(5), &MemoPayload::new("c", "d"))
        .unwrap();

    assert_eq!(outcome, SaveOutcome::Updated);
    assert_eq!(second.id, first.id);
    assert_eq!(second.satisfaction_level, level(5));
    assert_eq!(second.notes, MemoPayload::new("c", "d"));

    let page = service
        .list_entries(&session, &RecordPageRequest::default())
        .unwrap();
    assert_eq!(page.count, 1);
}

#[test]
fn entries_of_other_users_are_not_visible() {
    let conn = open_db_in_memory().unwrap();
    let owner = register(&conn, "hana");
    let stranger = register(&conn, "taro");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let (entry, _) = service
        .save_entry(&owner, day(15), level(3), &MemoPayload::default())
        .unwrap();

    let err = service.get_entry(&stranger, entry.id).unwrap_err();
    assert!(matches!(err, RecordServiceError::RecordNotFound(id) if id == entry.id));
    let err = service.delete_entry(&stranger, entry.id).unwrap_err();
    assert!(matches!(err, RecordServiceError::RecordNotFound(_)));
    assert!(service.get_entry(&owner, entry.id).is_ok());
}

#[test]
fn update_entry_replaces_fields_and_rejects_taken_date() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let (entry, _) = service
        .save_entry(&session, day(14), level(1), &MemoPayload::new("x", ""))
        .unwrap();
    service
        .save_entry(&session, day(15), level(3), &MemoPayload::new("y", ""))
        .unwrap();

    let updated = service
        .update_entry(&session, entry.id, day(13), level(2), &MemoPayload::new("z", "w"))
        .unwrap();
    assert_eq!(updated.date, day(13));
    assert_eq!(updated.notes, MemoPayload::new("z", "w"));

    let err = service
        .update_entry(&session, entry.id, day(15), level(2), &MemoPayload::default())
        .unwrap_err();
    assert!(matches!(err, RecordServiceError::Repo(RepoError::DateTaken(date)) if date == day(15)));
}

#[test]
fn delete_entry_removes_record() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let (entry, _) = service
        .save_entry(&session, day(15), level(3), &MemoPayload::default())
        .unwrap();
    service.delete_entry(&session, entry.id).unwrap();

    assert!(matches!(
        service.get_entry(&session, entry.id),
        Err(RecordServiceError::RecordNotFound(_))
    ));
}

#[test]
fn overlong_memo_is_rejected_before_persistence() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let notes = MemoPayload::new("長".repeat(500), "");
    let err = service
        .save_entry(&session, day(15), level(3), &notes)
        .unwrap_err();
    assert!(matches!(err, RecordServiceError::Repo(RepoError::Validation(_))));
}

#[test]
fn saving_for_unknown_user_fails() {
    let conn = open_db_in_memory().unwrap();
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let err = service
        .save_entry(&Session::new(404), day(15), level(3), &MemoPayload::default())
        .unwrap_err();
    assert!(matches!(err, RecordServiceError::Repo(RepoError::UserNotFound(404))));
}

#[test]
fn list_entries_pages_newest_first_with_date_bounds() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    for d in 1..=5 {
        service
            .save_entry(&session, day(d), level(3), &MemoPayload::default())
            .unwrap();
    }

    let first = service
        .list_entries(
            &session,
            &RecordPageRequest {
                page_size: Some(2),
                ..RecordPageRequest::default()
            },
        )
        .unwrap();
    assert_eq!(first.count, 5);
    let dates: Vec<_> = first.results.iter().map(|entry| entry.date).collect();
    assert_eq!(dates, vec![day(5), day(4)]);
    assert_eq!(first.next.as_deref(), Some("?page=2&page_size=2"));
    assert_eq!(first.previous, None);

    let last = service
        .list_entries(
            &session,
            &RecordPageRequest {
                page: Some(3),
                page_size: Some(2),
                ..RecordPageRequest::default()
            },
        )
        .unwrap();
    assert_eq!(last.results.len(), 1);
    assert_eq!(last.next, None);
    assert_eq!(last.previous.as_deref(), Some("?page=2&page_size=2"));

    let bounded = service
        .list_entries(
            &session,
            &RecordPageRequest {
                start_date: Some(day(2)),
                end_date: Some(day(3)),
                ..RecordPageRequest::default()
            },
        )
        .unwrap();
    assert_eq!(bounded.count, 2);

    assert!(matches!(
        service.list_entries(
            &session,
            &RecordPageRequest {
                page: Some(0),
                ..RecordPageRequest::default()
            }
        ),
        Err(RecordServiceError::InvalidPage(0))
    ));
}

#[test]
fn import_listing_accepts_plain_and_paginated_payloads() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let plain: Listing<ImportedRecord> = Listing::from_json(
        r#"[
            {"id": 7, "date": "2026-10-01", "satisfaction_level": 2,
             "satisfaction_display": "まあまあ", "memo": "やったこと: A\n\nやらなかったこと: B",
             "user_email": "old@example.com"},
            {"date": "2026-10-02", "satisfaction_level": 4, "memo": null}
        ]"#,
    )
    .unwrap();
    let summary = service.import_listing(&session, plain).unwrap();
    assert_eq!(summary.created, 2);
    assert_eq!(summary.updated, 0);

    let paged: Listing<ImportedRecord> = Listing::from_json(
        r#"{"count": 1, "next": null, "previous": null,
            "results": [{"date": "2026-10-02", "satisfaction_level": 5}]}"#,
    )
    .unwrap();
    let summary = service.import_listing(&session, paged).unwrap();
    assert_eq!(summary.updated, 1);

    let page = service
        .list_entries(&session, &RecordPageRequest::default())
        .unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.results[0].satisfaction_level, level(5));
    assert_eq!(page.results[1].notes, MemoPayload::new("A", "B"));
}

#[test]
fn failed_import_leaves_no_rows_behind() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));

    let listing: Listing<ImportedRecord> = Listing::from_json(&format!(
        r#"[
            {{"date": "2026-10-01", "satisfaction_level": 3, "memo": "ok"}},
            {{"date": "2026-10-02", "satisfaction_level": 4, "memo": "{}"}}
        ]"#,
        "x".repeat(600)
    ))
    .unwrap();

    let err = service.import_listing(&session, listing).unwrap_err();
    assert!(matches!(err, RecordServiceError::Repo(RepoError::Validation(_))));
    assert_eq!(record_rows(&conn), 0);
}

#[test]
fn import_rolls_back_earlier_items_when_a_later_write_fails() {
    let conn = open_db_in_memory().unwrap();
    let session = register(&conn, "hana");
    let service = RecordService::new(SqliteRecordRepository::new(&conn));
    service
        .save_entry(&session, day(1), level(1), &MemoPayload::new("前から", ""))
        .unwrap();
    conn.execute_batch(
        "CREATE TRIGGER reject_day_three BEFORE INSERT ON records
         WHEN NEW.date = '2026-10-03'
         BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
    )
    .unwrap();

    let listing: Listing<ImportedRecord> = Listing::from_json(
        r#"[
            {"date": "2026-10-01", "satisfaction_level": 5, "memo": "上書き"},
            {"date": "2026-10-02", "satisfaction_level": 4},
            {"date": "2026-10-03", "satisfaction_level": 2}
        ]"#,
    )
    .unwrap();

    let err = service.import_listing(&session, listing).unwrap_err();
    assert!(matches!(err, RecordServiceError::Repo(RepoError::Db(_))));
    assert_eq!(record_rows(&conn), 1);

    let page = service
        .list_entries(&session, &RecordPageRequest::default())
        .unwrap();
    assert_eq!(page.results[0].satisfaction_level, level(1));
    assert_eq!(page.results[0].notes.things_done, "前から");
}

#[test]
fn concurrent_saves_for_one_date_keep_a_single_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dayscore.sqlite3");
    let user_id = {
        let conn = open_db(&path).unwrap();
        register(&conn, "hana").user_id()
    };

    let workers: Vec<_> = (0..8u8)
        .map(|index| {
            let path = path.clone();
            std::thread::spawn(move || {
                let conn = open_db(&path).unwrap();
                let service = RecordService::new(SqliteRecordRepository::new(&conn));
                let notes = MemoPayload::new(format!("worker {index}"), "");
                service
                    .save_entry(&Session::new(user_id), day(20), level(index % 6), &notes)
                    .unwrap()
                    .1
            })
        })
        .collect();
    let outcomes: Vec<SaveOutcome> = workers
        .into_iter()
        .map(|worker| worker.join().unwrap())
        .collect();

    let created = outcomes
        .iter()
        .filter(|outcome| **outcome == SaveOutcome::Created)
        .count();
    assert_eq!(created, 1);
    assert_eq!(outcomes.len(), 8);

    let conn = open_db(&path).unwrap();
    assert_eq!(record_rows(&conn), 1);
}

fn record_rows(conn: &Connection) -> i64 {
    conn.query_row("SELECT COUNT(*) FROM records;", [], |row| row.get(0))
        .unwrap()
}
