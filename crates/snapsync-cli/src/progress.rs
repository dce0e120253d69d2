use colored::*;
use snapsync_core::SyncReporter;

/// Console reporter: one line per file, page headers, image tallies.
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl SyncReporter for ConsoleReporter {
    fn on_run_start(&self, total_pages: u32) {
        println!("{} page(s) to process", total_pages);
    }

    fn on_page_start(&self, page: u32, total_pages: u32, files_in_page: usize) {
        println!(
            "\nPage {}/{} - {} file(s)",
            page, total_pages, files_in_page
        );
    }

    fn on_file_synced(&self, scan_code: &str, created: bool) {
        let action = if created {
            "created".green()
        } else {
            "updated".cyan()
        };
        println!("  {} {}", scan_code, action);
    }

    fn on_file_failed(&self, remote_id: i64, error: &str) {
        println!("  {} {}", format!("file {} failed:", remote_id).red(), error);
    }

    fn on_images_downloaded(&self, _scan_code: &str, downloaded: u32, failed: u32) {
        if downloaded + failed > 0 {
            println!("    images: {} downloaded, {} failed", downloaded, failed);
        }
    }
}
