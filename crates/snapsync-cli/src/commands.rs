use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "snapsync")]
#[command(about = "Mirror a remote inspection platform into a local store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a full synchronization against the remote API
    Sync(SyncArgs),
    /// Re-run detail sync for every file currently in error
    ResyncFailed,
    /// List recent sync runs
    Runs(RunsArgs),
    /// Print mirror statistics
    Stats,
    /// Print configuration values
    PrintConfig,
    /// Truncate all mirrored tables
    TruncateDb,
}

#[derive(Debug, Args)]
pub struct SyncArgs {
    /// Skip image downloads, sync data only
    #[arg(long)]
    pub no_images: bool,

    /// Re-download images even when already downloaded
    #[arg(long)]
    pub force_download: bool,

    /// Files per page requested from the remote API
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Sync a single page only (no sync run is recorded)
    #[arg(long)]
    pub page: Option<u32>,

    /// Sync a single remote file only (no sync run is recorded)
    #[arg(long)]
    pub file_id: Option<i64>,
}

#[derive(Debug, Args)]
pub struct RunsArgs {
    /// How many runs to list, newest first
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}
