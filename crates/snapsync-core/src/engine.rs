//! Sync orchestration: drives a full run across all remote pages, isolating
//! per-file failures and recording progress on a `sync_run` row.

use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::api::types::FileSummary;
use crate::api::RemoteApi;
use crate::downloader::AssetDownloader;
use crate::error::Error;
use crate::mapper;
use crate::progress::SyncReporter;
use crate::storage::{Database, RunCounters, RunStatus};

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub download_images: bool,
    pub force_download: bool,
    pub page_size: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            download_images: true,
            force_download: false,
            page_size: 10,
        }
    }
}

/// Summary of one finished (or aborted) full run.
#[derive(Debug)]
pub struct SyncOutcome {
    pub run_id: i64,
    pub status: RunStatus,
    pub counters: RunCounters,
    pub total_pages: u32,
    pub duration: Duration,
}

/// Result of syncing one file outside the full-run loop.
#[derive(Debug)]
pub struct FileOutcome {
    pub file_id: i64,
    pub scan_code: String,
    pub created: bool,
    pub images_downloaded: u32,
    pub images_failed: u32,
}

#[derive(Debug, Default)]
pub struct ResyncOutcome {
    pub attempted: u32,
    pub recovered: u32,
    pub still_failing: u32,
}

pub struct SyncEngine<'a> {
    api: &'a dyn RemoteApi,
    db: &'a Database,
    downloader: &'a AssetDownloader,
    options: SyncOptions,
}

impl<'a> SyncEngine<'a> {
    pub fn new(
        api: &'a dyn RemoteApi,
        db: &'a Database,
        downloader: &'a AssetDownloader,
        options: SyncOptions,
    ) -> Self {
        Self {
            api,
            db,
            downloader,
            options,
        }
    }

    /// Run a full synchronization across all remote pages.
    ///
    /// Per-file failures are counted and never abort the run. A page-level
    /// failure finishes the run as `error` (no file processed yet) or
    /// `partial` (some progress already persisted) and is re-raised.
    pub fn run(&self, reporter: &dyn SyncReporter) -> Result<SyncOutcome, Error> {
        let swept = self.db.mark_stale_runs()?;
        if swept > 0 {
            warn!(
                "Swept {} stale sync run(s) left behind by a previous process",
                swept
            );
        }

        let run_id = self.db.create_sync_run()?;
        let started = Instant::now();
        let mut counters = RunCounters::default();
        let mut total_pages = 0u32;

        match self.run_pages(run_id, &mut counters, &mut total_pages, reporter) {
            Ok(()) => {
                self.db.finish_sync_run(run_id, RunStatus::Completed, None)?;
                info!(
                    "Synchronization complete: {} processed ({} created, {} updated, {} failed), \
                     {} images downloaded, {} failed",
                    counters.files_processed,
                    counters.files_created,
                    counters.files_updated,
                    counters.files_failed,
                    counters.images_downloaded,
                    counters.images_failed,
                );
                Ok(SyncOutcome {
                    run_id,
                    status: RunStatus::Completed,
                    counters,
                    total_pages,
                    duration: started.elapsed(),
                })
            }
            Err(err) => {
                // Zero progress means the run never really started; anything
                // already mirrored makes the snapshot usable but incomplete.
                let status = if counters.files_processed > 0 {
                    RunStatus::Partial
                } else {
                    RunStatus::Error
                };
                self.db
                    .finish_sync_run(run_id, status, Some(&err.to_string()))?;
                error!("Synchronization aborted: {}", err);
                Err(err)
            }
        }
    }

    fn run_pages(
        &self,
        run_id: i64,
        counters: &mut RunCounters,
        total_pages_out: &mut u32,
        reporter: &dyn SyncReporter,
    ) -> Result<(), Error> {
        let first_page = self.api.fetch_file_list(1, self.options.page_size)?;
        let total_pages = first_page.last_page.max(1);
        *total_pages_out = total_pages;
        self.db.set_sync_run_pages(run_id, total_pages)?;
        info!("Starting synchronization of {} page(s)", total_pages);
        reporter.on_run_start(total_pages);

        let mut pending_first = Some(first_page);
        for page in 1..=total_pages {
            self.db.set_sync_run_current_page(run_id, page)?;
            let page_data = match pending_first.take() {
                Some(page_data) => page_data,
                None => self.api.fetch_file_list(page, self.options.page_size)?,
            };
            debug!(
                "Processing page {}/{} ({} files)",
                page,
                total_pages,
                page_data.data.len()
            );
            reporter.on_page_start(page, total_pages, page_data.data.len());

            for summary in &page_data.data {
                self.process_summary(summary, counters, reporter);
                // Persist after every file so progress survives a later abort.
                self.db.update_sync_run_counters(run_id, counters)?;
            }
        }
        Ok(())
    }

    fn process_summary(
        &self,
        summary: &FileSummary,
        counters: &mut RunCounters,
        reporter: &dyn SyncReporter,
    ) {
        counters.files_processed += 1;
        match self.sync_summary(summary) {
            Ok(outcome) => {
                if outcome.created {
                    counters.files_created += 1;
                } else {
                    counters.files_updated += 1;
                }
                counters.images_downloaded += outcome.images_downloaded;
                counters.images_failed += outcome.images_failed;
                reporter.on_file_synced(&outcome.scan_code, outcome.created);
                if self.options.download_images {
                    reporter.on_images_downloaded(
                        &outcome.scan_code,
                        outcome.images_downloaded,
                        outcome.images_failed,
                    );
                }
            }
            Err(err) => {
                warn!("File {} failed to sync: {}", summary.id, err);
                counters.files_failed += 1;
                reporter.on_file_failed(summary.id, &err.to_string());
            }
        }
    }

    fn sync_summary(&self, summary: &FileSummary) -> Result<FileOutcome, Error> {
        let (file_id, created) = mapper::upsert_file(self.db, summary)?;
        let detail = self.api.fetch_file_detail(summary.id)?;
        mapper::sync_file_details(self.db, file_id, &detail)?;

        let (mut images_downloaded, mut images_failed) = (0u32, 0u32);
        if self.options.download_images {
            let file = self.db.get_file(file_id)?;
            let (downloaded, failed) =
                self.downloader
                    .download_file_images(self.db, &file, self.options.force_download)?;
            images_downloaded = downloaded;
            images_failed = failed;
        }

        Ok(FileOutcome {
            file_id,
            scan_code: summary.scan_code.clone().unwrap_or_default(),
            created,
            images_downloaded,
            images_failed,
        })
    }

    /// Sync a single page of the listing without recording a sync run.
    pub fn sync_page(
        &self,
        page: u32,
        reporter: &dyn SyncReporter,
    ) -> Result<RunCounters, Error> {
        let page_data = self.api.fetch_file_list(page, self.options.page_size)?;
        reporter.on_page_start(page, page_data.last_page.max(1), page_data.data.len());

        let mut counters = RunCounters::default();
        for summary in &page_data.data {
            self.process_summary(summary, &mut counters, reporter);
        }
        Ok(counters)
    }

    /// Sync a single remote file by id, from its detail payload. Used for
    /// targeted re-sync; no sync run is recorded.
    pub fn sync_one(&self, remote_id: i64) -> Result<FileOutcome, Error> {
        let detail = self.api.fetch_file_detail(remote_id)?;
        let (file_id, created) = mapper::upsert_file(self.db, &detail.summary)?;
        mapper::sync_file_details(self.db, file_id, &detail)?;

        let (mut images_downloaded, mut images_failed) = (0u32, 0u32);
        if self.options.download_images {
            let file = self.db.get_file(file_id)?;
            let (downloaded, failed) =
                self.downloader
                    .download_file_images(self.db, &file, self.options.force_download)?;
            images_downloaded = downloaded;
            images_failed = failed;
        }

        Ok(FileOutcome {
            file_id,
            scan_code: detail.summary.scan_code.clone().unwrap_or_default(),
            created,
            images_downloaded,
            images_failed,
        })
    }

    /// Re-run detail sync for every file currently in `error`.
    pub fn resync_failed(&self) -> Result<ResyncOutcome, Error> {
        let failed = self.db.list_failed_files()?;
        info!("Re-syncing {} failed file(s)", failed.len());

        let mut outcome = ResyncOutcome {
            attempted: failed.len() as u32,
            ..Default::default()
        };
        for file in &failed {
            match self.sync_one(file.remote_id) {
                Ok(_) => {
                    info!("Recovered file {} ({})", file.remote_id, file.scan_code);
                    outcome.recovered += 1;
                }
                Err(err) => {
                    warn!("File {} still failing: {}", file.remote_id, err);
                    outcome.still_failing += 1;
                }
            }
        }
        Ok(outcome)
    }
}
