use serde_json::json;
use snapsync_core::api::types::{FileSummary, LocationPayload, UploadPayload};
use snapsync_core::storage::{Database, RunCounters, RunStatus};

fn make_summary(id: i64, scan_code: &str, snap_count: i64) -> FileSummary {
    serde_json::from_value(json!({
        "id": id,
        "scan_code": scan_code,
        "scan_code_format": "iso6346",
        "closed": 0,
        "created_at": "2024-05-01T08:00:00Z",
        "updated_at": "2024-05-01T09:00:00Z",
        "snap_count": snap_count,
        "snap_count_with_damage": 0,
    }))
    .unwrap()
}

fn make_upload(id: i64, comment: &str) -> UploadPayload {
    serde_json::from_value(json!({
        "id": id,
        "upload_type": "photo",
        "scan_date_time": "2024-05-01T08:04:30Z",
        "has_damage": 1,
        "comment": comment,
        "image_url": "https://cdn.example.com/snaps/501.jpg",
        "image_thumb": "https://cdn.example.com/snaps/501_thumb.jpg",
    }))
    .unwrap()
}

fn count(db: &Database, table: &str) -> i64 {
    db.connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}

#[test]
fn test_upsert_file_summary_is_idempotent() {
    let db = Database::open_in_memory().unwrap();

    let (id_a, created_a) = db
        .upsert_file_summary(&make_summary(1001, "ABCU1234567", 2))
        .unwrap();
    assert!(created_a);

    let (id_b, created_b) = db
        .upsert_file_summary(&make_summary(1001, "ABCU1234567", 5))
        .unwrap();
    assert!(!created_b);
    assert_eq!(id_a, id_b);
    assert_eq!(count(&db, "mirror_file"), 1);

    let file = db.get_file(id_a).unwrap();
    assert_eq!(file.remote_id, 1001);
    assert_eq!(file.snap_count, 5);
    assert_eq!(file.sync_status, "pending");
    assert!(file
        .remote_created_at
        .as_deref()
        .unwrap()
        .starts_with("2024-05-01T08:00:00"));
}

#[test]
fn test_file_status_transitions() {
    let db = Database::open_in_memory().unwrap();
    let (file_id, _) = db
        .upsert_file_summary(&make_summary(1, "ABCU1234567", 0))
        .unwrap();

    db.mark_file_sync_error(file_id, "detail fetch exploded").unwrap();
    let file = db.get_file(file_id).unwrap();
    assert_eq!(file.sync_status, "error");
    assert_eq!(file.sync_error.as_deref(), Some("detail fetch exploded"));

    let failed = db.list_failed_files().unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].remote_id, 1);

    db.mark_file_sync_completed(file_id).unwrap();
    let file = db.get_file(file_id).unwrap();
    assert_eq!(file.sync_status, "completed");
    assert!(file.sync_error.is_none());
    assert!(file.last_synced_at.is_some());
    assert!(db.list_failed_files().unwrap().is_empty());
}

#[test]
fn test_upsert_upload_preserves_download_state() {
    let db = Database::open_in_memory().unwrap();
    let (file_id, _) = db
        .upsert_file_summary(&make_summary(1, "ABCU1234567", 1))
        .unwrap();

    db.upsert_upload(file_id, &make_upload(501, "first pass")).unwrap();
    let uploads = db.uploads_for_file(file_id).unwrap();
    assert_eq!(uploads.len(), 1);
    assert!(!uploads[0].image_downloaded);

    db.mark_upload_downloaded(
        uploads[0].id,
        Some("images/ABCU1234567_501_20240501_080430.jpg"),
        Some("thumbs/ABCU1234567_501_20240501_080430_thumb.jpg"),
    )
    .unwrap();

    // Re-syncing the same upload must not clobber local download state.
    db.upsert_upload(file_id, &make_upload(501, "second pass")).unwrap();
    let uploads = db.uploads_for_file(file_id).unwrap();
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].image_downloaded);
    assert_eq!(
        uploads[0].local_image_path.as_deref(),
        Some("images/ABCU1234567_501_20240501_080430.jpg")
    );
    assert!(uploads[0].local_thumb_path.is_some());

    let comment: String = db
        .connection()
        .query_row(
            "SELECT comment FROM upload WHERE remote_id = 501",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(comment, "second pass");

    assert!(db.uploads_pending_download(file_id).unwrap().is_empty());
}

#[test]
fn test_location_composite_key() {
    let db = Database::open_in_memory().unwrap();
    let (file_a, _) = db
        .upsert_file_summary(&make_summary(1, "ABCU1234567", 0))
        .unwrap();
    let (file_b, _) = db
        .upsert_file_summary(&make_summary(2, "MSKU7654321", 0))
        .unwrap();

    let location: LocationPayload =
        serde_json::from_value(json!({"id": 31, "location": "Terminal 4"})).unwrap();

    // Same remote location id under two files is two rows; repeating under
    // the same file is one.
    db.upsert_location(file_a, &location).unwrap();
    db.upsert_location(file_a, &location).unwrap();
    db.upsert_location(file_b, &location).unwrap();
    assert_eq!(count(&db, "file_location"), 2);
}

#[test]
fn test_sync_run_lifecycle() {
    let db = Database::open_in_memory().unwrap();
    let run_id = db.create_sync_run().unwrap();
    assert!(run_id > 0);

    db.set_sync_run_pages(run_id, 3).unwrap();
    db.set_sync_run_current_page(run_id, 2).unwrap();

    let counters = RunCounters {
        files_processed: 7,
        files_created: 4,
        files_updated: 2,
        files_failed: 1,
        images_downloaded: 9,
        images_failed: 1,
    };
    db.update_sync_run_counters(run_id, &counters).unwrap();
    db.finish_sync_run(run_id, RunStatus::Completed, None).unwrap();

    let run = db.get_sync_run(run_id).unwrap();
    assert_eq!(run.status, "completed");
    assert_eq!(run.total_pages, 3);
    assert_eq!(run.current_page, 2);
    assert_eq!(run.files_processed, 7);
    assert_eq!(run.files_failed, 1);
    assert_eq!(run.images_downloaded, 9);
    assert!(run.finished_at.is_some());
    assert!(run.error_message.is_none());
    assert_eq!(
        run.files_processed,
        run.files_created + run.files_updated + run.files_failed
    );
}

#[test]
fn test_mark_stale_runs_sweeps_only_running() {
    let db = Database::open_in_memory().unwrap();

    let finished = db.create_sync_run().unwrap();
    db.finish_sync_run(finished, RunStatus::Completed, None).unwrap();
    let orphaned = db.create_sync_run().unwrap();

    let swept = db.mark_stale_runs().unwrap();
    assert_eq!(swept, 1);

    let run = db.get_sync_run(orphaned).unwrap();
    assert_eq!(run.status, "error");
    assert_eq!(
        run.error_message.as_deref(),
        Some("interrupted before completion")
    );
    assert!(run.finished_at.is_some());

    let run = db.get_sync_run(finished).unwrap();
    assert_eq!(run.status, "completed");
    assert!(run.error_message.is_none());

    assert_eq!(db.mark_stale_runs().unwrap(), 0);
}

#[test]
fn test_list_sync_runs_newest_first() {
    let db = Database::open_in_memory().unwrap();
    let first = db.create_sync_run().unwrap();
    let second = db.create_sync_run().unwrap();

    let runs = db.list_sync_runs(10).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].id, second);
    assert_eq!(runs[1].id, first);

    assert_eq!(db.list_sync_runs(1).unwrap().len(), 1);
}

#[test]
fn test_truncate_all() {
    let db = Database::open_in_memory().unwrap();
    let (file_id, _) = db
        .upsert_file_summary(&make_summary(1, "ABCU1234567", 0))
        .unwrap();
    db.upsert_upload(file_id, &make_upload(501, "x")).unwrap();
    db.create_sync_run().unwrap();

    db.truncate_all().unwrap();

    assert_eq!(count(&db, "mirror_file"), 0);
    assert_eq!(count(&db, "upload"), 0);
    assert_eq!(count(&db, "sync_run"), 0);
}

#[test]
fn test_mirror_stats() {
    let db = Database::open_in_memory().unwrap();
    let (file_id, _) = db
        .upsert_file_summary(&make_summary(1, "ABCU1234567", 1))
        .unwrap();
    db.upsert_upload(file_id, &make_upload(501, "x")).unwrap();
    db.mark_file_sync_error(file_id, "boom").unwrap();

    let stats = db.mirror_stats().unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.uploads, 1);
    assert_eq!(stats.uploads_with_damage, 1);
    assert_eq!(stats.uploads_downloaded, 0);
}
