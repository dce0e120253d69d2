/// Per-file sync lifecycle recorded on `mirror_file.sync_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileSyncStatus {
    Pending,
    Syncing,
    Completed,
    Error,
}

impl FileSyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileSyncStatus::Pending => "pending",
            FileSyncStatus::Syncing => "syncing",
            FileSyncStatus::Completed => "completed",
            FileSyncStatus::Error => "error",
        }
    }
}

/// Terminal/active states of a `sync_run` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Error,
    Partial,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Error => "error",
            RunStatus::Partial => "partial",
        }
    }
}

/// A mirrored top-level file (one physical container/unit on the remote side).
#[derive(Debug, Clone)]
pub struct MirrorFile {
    pub id: i64,
    pub remote_id: i64,
    pub scan_code: String,
    pub scan_code_format: Option<String>,
    pub closed: bool,
    pub remote_created_at: Option<String>,
    pub remote_updated_at: Option<String>,
    pub recent_snap_id: Option<i64>,
    pub snap_count: i64,
    pub snap_count_with_damage: i64,
    pub sync_status: String,
    pub sync_error: Option<String>,
    pub last_synced_at: Option<String>,
}

/// One captured photo/document event belonging to a mirrored file.
#[derive(Debug, Clone)]
pub struct Upload {
    pub id: i64,
    pub remote_id: i64,
    pub file_id: i64,
    pub device_nick: Option<String>,
    pub upload_type: Option<String>,
    pub captured_at: Option<String>,
    pub has_damage: bool,
    pub image_url: Option<String>,
    pub thumb_url: Option<String>,
    pub local_image_path: Option<String>,
    pub local_thumb_path: Option<String>,
    pub image_downloaded: bool,
}

/// One synchronization attempt, with progress counters and a terminal status.
#[derive(Debug, Clone)]
pub struct SyncRun {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub files_processed: i64,
    pub files_created: i64,
    pub files_updated: i64,
    pub files_failed: i64,
    pub images_downloaded: i64,
    pub images_failed: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub error_message: Option<String>,
    pub detail: Option<String>,
}

/// In-memory counter block persisted onto a `sync_run` row after every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunCounters {
    pub files_processed: u32,
    pub files_created: u32,
    pub files_updated: u32,
    pub files_failed: u32,
    pub images_downloaded: u32,
    pub images_failed: u32,
}

/// Row counts across the mirror, for the stats command.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorStats {
    pub files: i64,
    pub files_failed: i64,
    pub uploads: i64,
    pub uploads_with_damage: i64,
    pub uploads_downloaded: i64,
    pub locations: i64,
    pub custom_fields: i64,
    pub form_submits: i64,
    pub workflows: i64,
    pub workflow_steps: i64,
    pub workflow_runs: i64,
    pub workflow_run_steps: i64,
}
