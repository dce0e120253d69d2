mod commands;
mod logging;
mod progress;

use std::io::{self, Write};
use std::process;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, RunsArgs, SyncArgs};
use dotenv::dotenv;
use progress::ConsoleReporter;
use snapsync_core::storage::Database;
use snapsync_core::{ApiClient, AppConfig, AssetDownloader, SyncEngine, SyncOptions};
use tracing::{error, info};

fn main() -> Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match snapsync_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    match args.command {
        Some(Commands::Sync(sync_args)) => {
            if let Err(err) = run_sync(&config, &sync_args) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::ResyncFailed) => {
            if let Err(err) = run_resync_failed(&config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Runs(runs_args)) => {
            if let Err(err) = run_list_runs(&config, &runs_args) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::Stats) => {
            if let Err(err) = run_stats(&config) {
                error!("Error: {}", err);
                process::exit(1);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("api_base_url:    {}", config.api_base_url);
            println!("api_token:       ***");
            println!("page_size:       {}", config.page_size);
            println!("database_path:   {}", config.database_path);
            println!("media_root:      {}", config.media_root);
            println!("download_images: {}", config.download_images);
        }
        Some(Commands::TruncateDb) => {
            match prompt_confirm(
                "Are you SURE you want to COMPLETELY DELETE the mirror?",
                Some(false),
            ) {
                Ok(true) => match Database::open(&config.database_path) {
                    Ok(db) => {
                        if let Err(err) = db.truncate_all() {
                            error!("Error truncating database: {}", err);
                        } else {
                            println!("All tables truncated");
                        }
                    }
                    Err(err) => error!("Error opening database: {}", err),
                },
                _ => {
                    process::exit(0);
                }
            }
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_sync(config: &AppConfig, args: &SyncArgs) -> Result<()> {
    let db = Database::open(&config.database_path)?;
    let api = ApiClient::from_config(config)?;
    let downloader = AssetDownloader::new(config.media_root.as_str())?;

    let options = SyncOptions {
        download_images: config.download_images && !args.no_images,
        force_download: args.force_download,
        page_size: args.page_size.unwrap_or(config.page_size),
    };
    if options.force_download {
        info!("Force download enabled - all images will be fetched again");
    }

    let engine = SyncEngine::new(&api, &db, &downloader, options);
    let reporter = ConsoleReporter::new();

    if let Some(file_id) = args.file_id {
        let outcome = engine.sync_one(file_id)?;
        let action = if outcome.created { "created" } else { "updated" };
        info!(
            "File {} ({}): {}, images {} downloaded / {} failed",
            file_id,
            outcome.scan_code,
            action,
            outcome.images_downloaded,
            outcome.images_failed,
        );
        return Ok(());
    }

    if let Some(page) = args.page {
        let counters = engine.sync_page(page, &reporter)?;
        println!();
        info!(
            "Page {}: {} processed ({} created, {} updated, {} failed)",
            page,
            counters.files_processed,
            format!("{}", counters.files_created).green(),
            format!("{}", counters.files_updated).cyan(),
            format!("{}", counters.files_failed).red(),
        );
        return Ok(());
    }

    let outcome = engine.run(&reporter)?;
    println!();
    info!(
        "Run #{} {} in {}",
        outcome.run_id,
        outcome.status.as_str(),
        format!("{:.1}s", outcome.duration.as_secs_f64()).green(),
    );
    info!(
        "Files: {} processed, {} created, {} updated, {} failed",
        outcome.counters.files_processed,
        format!("{}", outcome.counters.files_created).green(),
        format!("{}", outcome.counters.files_updated).cyan(),
        format!("{}", outcome.counters.files_failed).red(),
    );
    if options.download_images {
        info!(
            "Images: {} downloaded, {} failed",
            format!("{}", outcome.counters.images_downloaded).green(),
            format!("{}", outcome.counters.images_failed).red(),
        );
    }

    Ok(())
}

fn run_resync_failed(config: &AppConfig) -> Result<()> {
    let db = Database::open(&config.database_path)?;
    let api = ApiClient::from_config(config)?;
    let downloader = AssetDownloader::new(config.media_root.as_str())?;
    let options = SyncOptions {
        download_images: config.download_images,
        ..Default::default()
    };
    let engine = SyncEngine::new(&api, &db, &downloader, options);

    let outcome = engine.resync_failed()?;
    info!(
        "Re-sync finished: {} attempted, {} recovered, {} still failing",
        outcome.attempted,
        format!("{}", outcome.recovered).green(),
        format!("{}", outcome.still_failing).red(),
    );
    Ok(())
}

fn run_list_runs(config: &AppConfig, args: &RunsArgs) -> Result<()> {
    let db = Database::open(&config.database_path)?;
    let runs = db.list_sync_runs(args.limit)?;
    if runs.is_empty() {
        println!("No sync runs recorded");
        return Ok(());
    }

    for run in runs {
        let status = match run.status.as_str() {
            "completed" => run.status.as_str().green(),
            "error" => run.status.as_str().red(),
            "partial" => run.status.as_str().yellow(),
            other => other.normal(),
        };
        println!(
            "#{:<4} {:<9} started {}  pages {}/{}  files {} ({}c/{}u/{}f)  images {}/{}",
            run.id,
            status,
            run.started_at,
            run.current_page,
            run.total_pages,
            run.files_processed,
            run.files_created,
            run.files_updated,
            run.files_failed,
            run.images_downloaded,
            run.images_failed,
        );
        if let Some(message) = run.error_message {
            println!("      {}", message.red());
        }
    }
    Ok(())
}

fn run_stats(config: &AppConfig) -> Result<()> {
    let db = Database::open(&config.database_path)?;
    let stats = db.mirror_stats()?;

    println!("Files:              {}", stats.files);
    println!("  in error:         {}", stats.files_failed);
    println!("Uploads:            {}", stats.uploads);
    println!("  with damage:      {}", stats.uploads_with_damage);
    println!("  downloaded:       {}", stats.uploads_downloaded);
    println!("Locations:          {}", stats.locations);
    println!("Custom fields:      {}", stats.custom_fields);
    println!("Form submits:       {}", stats.form_submits);
    println!("Workflows:          {}", stats.workflows);
    println!("Workflow steps:     {}", stats.workflow_steps);
    println!("Workflow runs:      {}", stats.workflow_runs);
    println!("Workflow run steps: {}", stats.workflow_run_steps);

    if let Some(run) = db.list_sync_runs(1)?.into_iter().next() {
        println!(
            "\nLast sync run: #{} {} (started {})",
            run.id, run.status, run.started_at
        );
    }
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
