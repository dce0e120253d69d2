/// Trait for reporting sync progress.
///
/// The CLI implements this with console output; embedders can plug their own.
/// All methods have default no-op implementations.
pub trait SyncReporter: Send + Sync {
    fn on_run_start(&self, _total_pages: u32) {}
    fn on_page_start(&self, _page: u32, _total_pages: u32, _files_in_page: usize) {}
    fn on_file_synced(&self, _scan_code: &str, _created: bool) {}
    fn on_file_failed(&self, _remote_id: i64, _error: &str) {}
    fn on_images_downloaded(&self, _scan_code: &str, _downloaded: u32, _failed: u32) {}
}

/// No-op reporter for silent operation.
pub struct SilentReporter;

impl SyncReporter for SilentReporter {}
