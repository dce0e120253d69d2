//! Binary asset download with bounded retry.
//!
//! Only timeouts and HTTP 504 are retried; every other failure is final.
//! Retry pacing is a [`BackoffPolicy`] value so tests can run without
//! sleeping.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::DateTime;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::storage::{Database, MirrorFile, Upload};

/// Per-attempt timeout for binary assets; deliberately longer than the
/// list/detail timeout because image endpoints are the slowest part of the
/// remote service.
const ASSET_TIMEOUT: Duration = Duration::from_secs(180);

pub const DEFAULT_MAX_RETRIES: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("{0}")]
    Io(String),
}

/// Fetches one binary URL to a local path. The reqwest-backed [`HttpFetcher`]
/// is the production implementation; tests substitute fakes.
pub trait BinaryFetcher: Send + Sync {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(ASSET_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl BinaryFetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        let response = self.client.get(url).send().map_err(classify)?;
        let mut response = response.error_for_status().map_err(classify)?;
        let mut file = fs::File::create(dest).map_err(|err| FetchError::Io(err.to_string()))?;
        match io::copy(&mut response, &mut file) {
            Ok(_) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => Err(FetchError::Timeout),
            Err(err) => Err(FetchError::Io(err.to_string())),
        }
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else {
        FetchError::Io(err.to_string())
    }
}

fn is_retryable(err: &FetchError) -> bool {
    matches!(err, FetchError::Timeout | FetchError::Status(504))
}

/// Linear backoff: attempt 0 waits one step, attempt 1 two steps, and so on.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    step: Duration,
}

impl BackoffPolicy {
    pub const fn new(step: Duration) -> Self {
        Self { step }
    }

    /// Zero-delay policy for tests.
    pub const fn none() -> Self {
        Self {
            step: Duration::ZERO,
        }
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        self.step * (attempt + 1)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

/// Streams remote binary assets into `media_root/images` and
/// `media_root/thumbs`, with deterministic filenames derived from the parent
/// file's scan code, the upload's remote id, and its capture timestamp.
pub struct AssetDownloader {
    fetcher: Box<dyn BinaryFetcher>,
    images_dir: PathBuf,
    thumbs_dir: PathBuf,
    backoff: BackoffPolicy,
    max_retries: u32,
}

impl AssetDownloader {
    pub fn new(media_root: impl Into<PathBuf>) -> Result<Self, Error> {
        Self::with_fetcher(media_root, Box::new(HttpFetcher::new()?))
    }

    pub fn with_fetcher(
        media_root: impl Into<PathBuf>,
        fetcher: Box<dyn BinaryFetcher>,
    ) -> Result<Self, Error> {
        let media_root = media_root.into();
        let images_dir = media_root.join("images");
        let thumbs_dir = media_root.join("thumbs");
        fs::create_dir_all(&images_dir)?;
        fs::create_dir_all(&thumbs_dir)?;
        Ok(Self {
            fetcher,
            images_dir,
            thumbs_dir,
            backoff: BackoffPolicy::default(),
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Fetch one URL to disk. Returns `true` only on a fully written body.
    /// Timeouts and gateway timeouts are retried up to `max_retries` attempts
    /// with linear backoff; any other failure is final on the first hit.
    pub fn download_binary(&self, url: &str, dest: &Path) -> bool {
        for attempt in 0..self.max_retries {
            match self.fetcher.fetch(url, dest) {
                Ok(()) => {
                    if attempt > 0 {
                        info!("Downloaded {} on attempt {}", url, attempt + 1);
                    }
                    return true;
                }
                Err(err) if is_retryable(&err) => {
                    if attempt + 1 < self.max_retries {
                        let wait = self.backoff.delay(attempt);
                        warn!(
                            "{} fetching {} - retrying in {}s (attempt {}/{})",
                            err,
                            url,
                            wait.as_secs(),
                            attempt + 1,
                            self.max_retries,
                        );
                        thread::sleep(wait);
                    } else {
                        error!(
                            "Giving up on {} after {} attempts: {}",
                            url, self.max_retries, err
                        );
                        return false;
                    }
                }
                Err(err) => {
                    error!("Download of {} failed: {}", url, err);
                    return false;
                }
            }
        }
        false
    }

    /// Download the full image and thumbnail for one upload. Already
    /// downloaded uploads short-circuit as success unless `force` is set.
    /// Returns `Ok(false)` when any present asset fails to download; local
    /// paths and the downloaded flag are only written once everything landed.
    pub fn download_upload_assets(
        &self,
        db: &Database,
        upload: &Upload,
        scan_code: &str,
        force: bool,
    ) -> Result<bool, Error> {
        if upload.image_downloaded && !force {
            return Ok(true);
        }

        let base = asset_basename(scan_code, upload.remote_id, upload.captured_at.as_deref());

        let mut image_rel: Option<String> = None;
        if let Some(url) = upload.image_url.as_deref().filter(|u| !u.is_empty()) {
            let filename = format!("{}.{}", base, asset_extension(url));
            if !self.download_binary(url, &self.images_dir.join(&filename)) {
                return Ok(false);
            }
            image_rel = Some(format!("images/{}", filename));
        }

        let mut thumb_rel: Option<String> = None;
        if let Some(url) = upload.thumb_url.as_deref().filter(|u| !u.is_empty()) {
            let filename = format!("{}_thumb.{}", base, asset_extension(url));
            if !self.download_binary(url, &self.thumbs_dir.join(&filename)) {
                return Ok(false);
            }
            thumb_rel = Some(format!("thumbs/{}", filename));
        }

        db.mark_upload_downloaded(upload.id, image_rel.as_deref(), thumb_rel.as_deref())?;
        Ok(true)
    }

    /// Download assets for every upload of a file (all of them when `force`,
    /// otherwise only the not-yet-downloaded ones). One upload failing never
    /// stops the rest. Returns `(downloaded, failed)` counts.
    pub fn download_file_images(
        &self,
        db: &Database,
        file: &MirrorFile,
        force: bool,
    ) -> Result<(u32, u32), Error> {
        let uploads = if force {
            db.uploads_for_file(file.id)?
        } else {
            db.uploads_pending_download(file.id)?
        };

        let mut downloaded = 0u32;
        let mut failed = 0u32;
        for upload in &uploads {
            match self.download_upload_assets(db, upload, &file.scan_code, force) {
                Ok(true) => downloaded += 1,
                Ok(false) => failed += 1,
                Err(err) => {
                    error!(
                        "Recording downloads for upload {} failed: {}",
                        upload.remote_id, err
                    );
                    failed += 1;
                }
            }
        }
        Ok((downloaded, failed))
    }
}

fn asset_basename(scan_code: &str, remote_id: i64, captured_at: Option<&str>) -> String {
    let timestamp = captured_at
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.format("%Y%m%d_%H%M%S").to_string())
        .unwrap_or_else(|| "00000000_000000".to_string());
    format!("{}_{}_{}", scan_code, remote_id, timestamp)
}

fn asset_extension(url: &str) -> &str {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    match path.rsplit_once('.') {
        Some((_, ext))
            if !ext.is_empty() && ext.len() <= 4 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext
        }
        _ => "jpg",
    }
}
