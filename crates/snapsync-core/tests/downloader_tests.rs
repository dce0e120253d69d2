use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use snapsync_core::api::types::{FileSummary, UploadPayload};
use snapsync_core::downloader::{AssetDownloader, BackoffPolicy, BinaryFetcher, FetchError};
use snapsync_core::storage::Database;

#[derive(Debug, Clone, Copy)]
enum Step {
    Ok,
    Timeout,
    Status(u16),
}

/// Scripted fetcher: pops one step per call, counts calls, writes a small
/// body to disk on success. Clones share the script and the counter.
#[derive(Clone)]
struct ScriptedFetcher {
    script: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedFetcher {
    fn new(steps: &[Step]) -> Self {
        Self {
            script: Arc::new(Mutex::new(steps.iter().copied().collect())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl BinaryFetcher for ScriptedFetcher {
    fn fetch(&self, _url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front().unwrap_or(Step::Ok);
        match step {
            Step::Ok => {
                std::fs::write(dest, b"binary-data").map_err(|err| FetchError::Io(err.to_string()))?;
                Ok(())
            }
            Step::Timeout => Err(FetchError::Timeout),
            Step::Status(code) => Err(FetchError::Status(code)),
        }
    }
}

/// Fetcher that fails fatally for any URL containing "bad".
#[derive(Clone)]
struct SelectiveFetcher {
    calls: Arc<AtomicU32>,
}

impl BinaryFetcher for SelectiveFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if url.contains("bad") {
            return Err(FetchError::Status(403));
        }
        std::fs::write(dest, b"binary-data").map_err(|err| FetchError::Io(err.to_string()))?;
        Ok(())
    }
}

fn downloader_with(
    media_root: &Path,
    fetcher: impl BinaryFetcher + 'static,
) -> AssetDownloader {
    AssetDownloader::with_fetcher(media_root, Box::new(fetcher))
        .unwrap()
        .with_backoff(BackoffPolicy::none())
}

fn setup_file_with_upload(db: &Database, upload: serde_json::Value) -> i64 {
    let summary: FileSummary = serde_json::from_value(json!({
        "id": 1001,
        "scan_code": "ABCU1234567",
    }))
    .unwrap();
    let (file_id, _) = db.upsert_file_summary(&summary).unwrap();
    let payload: UploadPayload = serde_json::from_value(upload).unwrap();
    db.upsert_upload(file_id, &payload).unwrap();
    file_id
}

fn upload_json(id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "scan_date_time": "2024-05-01T08:04:30Z",
        "image_url": format!("https://cdn.example.com/snaps/{}.jpg", id),
        "image_thumb": format!("https://cdn.example.com/snaps/{}_thumb.jpg", id),
    })
}

#[test]
fn test_download_binary_exhausts_retries_on_timeouts() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(&[Step::Timeout, Step::Timeout, Step::Timeout]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let ok = downloader.download_binary(
        "https://cdn.example.com/snaps/1.jpg",
        &dir.path().join("images/1.jpg"),
    );
    assert!(!ok);
    assert_eq!(fetcher.calls(), 3);
}

#[test]
fn test_download_binary_stops_on_non_retryable_status() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(&[Step::Timeout, Step::Status(403)]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let ok = downloader.download_binary(
        "https://cdn.example.com/snaps/1.jpg",
        &dir.path().join("images/1.jpg"),
    );
    assert!(!ok);
    // First attempt times out and is retried; the 403 is final.
    assert_eq!(fetcher.calls(), 2);
}

#[test]
fn test_download_binary_retries_gateway_timeout_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = ScriptedFetcher::new(&[Step::Status(504), Step::Ok]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let dest = dir.path().join("images/1.jpg");
    assert!(downloader.download_binary("https://cdn.example.com/snaps/1.jpg", &dest));
    assert_eq!(fetcher.calls(), 2);
    assert!(dest.exists());
}

#[test]
fn test_download_upload_assets_writes_paths_and_flag() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let file_id = setup_file_with_upload(&db, upload_json(501));

    let fetcher = ScriptedFetcher::new(&[]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let file = db.get_file(file_id).unwrap();
    let uploads = db.uploads_for_file(file_id).unwrap();
    let ok = downloader
        .download_upload_assets(&db, &uploads[0], &file.scan_code, false)
        .unwrap();
    assert!(ok);
    assert_eq!(fetcher.calls(), 2);

    let uploads = db.uploads_for_file(file_id).unwrap();
    assert!(uploads[0].image_downloaded);
    let image_rel = uploads[0].local_image_path.as_deref().unwrap();
    let thumb_rel = uploads[0].local_thumb_path.as_deref().unwrap();
    assert_eq!(image_rel, "images/ABCU1234567_501_20240501_080430.jpg");
    assert_eq!(thumb_rel, "thumbs/ABCU1234567_501_20240501_080430_thumb.jpg");

    // The downloaded flag implies both files exist on disk.
    assert!(dir.path().join(image_rel).exists());
    assert!(dir.path().join(thumb_rel).exists());
}

#[test]
fn test_download_file_images_is_idempotent_noop_after_success() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let file_id = setup_file_with_upload(&db, upload_json(501));
    let file = db.get_file(file_id).unwrap();

    let fetcher = ScriptedFetcher::new(&[]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let (downloaded, failed) = downloader.download_file_images(&db, &file, false).unwrap();
    assert_eq!((downloaded, failed), (1, 0));
    let calls_after_first = fetcher.calls();

    // Everything is already downloaded: zero fetches, zero counts.
    let (downloaded, failed) = downloader.download_file_images(&db, &file, false).unwrap();
    assert_eq!((downloaded, failed), (0, 0));
    assert_eq!(fetcher.calls(), calls_after_first);
}

#[test]
fn test_force_download_refetches_everything() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let file_id = setup_file_with_upload(&db, upload_json(501));
    let file = db.get_file(file_id).unwrap();

    let fetcher = ScriptedFetcher::new(&[]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    downloader.download_file_images(&db, &file, false).unwrap();
    let (downloaded, _) = downloader.download_file_images(&db, &file, true).unwrap();
    assert_eq!(downloaded, 1);
    assert_eq!(fetcher.calls(), 4);
}

#[test]
fn test_one_upload_failing_does_not_stop_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();

    let summary: FileSummary = serde_json::from_value(json!({
        "id": 1001,
        "scan_code": "ABCU1234567",
    }))
    .unwrap();
    let (file_id, _) = db.upsert_file_summary(&summary).unwrap();

    let failing: UploadPayload = serde_json::from_value(json!({
        "id": 501,
        "scan_date_time": "2024-05-01T08:04:30Z",
        "image_url": "https://cdn.example.com/bad/501.jpg",
    }))
    .unwrap();
    let healthy: UploadPayload = serde_json::from_value(json!({
        "id": 502,
        "scan_date_time": "2024-05-01T08:10:00Z",
        "image_url": "https://cdn.example.com/snaps/502.jpg",
    }))
    .unwrap();
    db.upsert_upload(file_id, &failing).unwrap();
    db.upsert_upload(file_id, &healthy).unwrap();

    let fetcher = SelectiveFetcher {
        calls: Arc::new(AtomicU32::new(0)),
    };
    let downloader = downloader_with(dir.path(), fetcher);

    let file = db.get_file(file_id).unwrap();
    let (downloaded, failed) = downloader.download_file_images(&db, &file, false).unwrap();
    assert_eq!((downloaded, failed), (1, 1));

    let uploads = db.uploads_for_file(file_id).unwrap();
    let failing_row = uploads.iter().find(|u| u.remote_id == 501).unwrap();
    let healthy_row = uploads.iter().find(|u| u.remote_id == 502).unwrap();
    assert!(!failing_row.image_downloaded);
    assert!(failing_row.local_image_path.is_none());
    assert!(healthy_row.image_downloaded);
}

#[test]
fn test_upload_without_urls_counts_as_downloaded() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_in_memory().unwrap();
    let file_id = setup_file_with_upload(
        &db,
        json!({"id": 501, "scan_date_time": "2024-05-01T08:04:30Z"}),
    );
    let file = db.get_file(file_id).unwrap();

    let fetcher = ScriptedFetcher::new(&[]);
    let downloader = downloader_with(dir.path(), fetcher.clone());

    let (downloaded, failed) = downloader.download_file_images(&db, &file, false).unwrap();
    assert_eq!((downloaded, failed), (1, 0));
    assert_eq!(fetcher.calls(), 0);

    let uploads = db.uploads_for_file(file_id).unwrap();
    assert!(uploads[0].image_downloaded);
    assert!(uploads[0].local_image_path.is_none());
}
