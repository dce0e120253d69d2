pub mod models;
pub mod queries;
pub mod sqlite;

pub use models::{FileSyncStatus, MirrorFile, MirrorStats, RunCounters, RunStatus, SyncRun, Upload};
pub use sqlite::Database;
