//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading, reference store selection,
//! progress display and the end-of-run summary used by every command.

use colored::*;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use sqlx::PgPool;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::app::adapters::database::{TableName, create_pool};
use crate::app::adapters::reference_store::{FileReferenceStore, PgReferenceStore, ReferenceStore};
use crate::cli::args::{Args, DatabaseArgs, IngestArgs, OfflineArgs};
use crate::config::Config;
use crate::pipeline::RunSummary;
use crate::Result;

/// Set up structured logging on stderr
///
/// `RUST_LOG` takes precedence; otherwise `dof_loader=<level>`.
pub fn setup_logging(level: &str, quiet: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dof_loader={}", level)));

    if quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    debug!("Logging initialized at level: {}", level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env) and start logging
///
/// Command-specific CLI overrides are applied by the caller afterwards.
pub fn load_configuration(args: &Args) -> Result<Config> {
    let default_config_path = if args.config_file.is_none() {
        Config::default_config_path().ok()
    } else {
        None
    };

    let config_file = match &args.config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_ref()
            .filter(|path| path.exists())
            .map(|path| path.as_path()),
    };

    let mut config = Config::load_layered(config_file)?;
    if let Some(level) = args.get_log_level() {
        config.logging.level = level.to_string();
    }

    setup_logging(&config.logging.level, args.quiet)?;

    match config_file {
        Some(path) => info!("Using config file: {}", path.display()),
        None => info!("No config file found, using defaults and environment variables"),
    }
    Ok(config)
}

/// Apply database flags to the configuration
pub fn apply_database_overrides(config: &mut Config, args: &DatabaseArgs) {
    if let Some(url) = &args.database_url {
        config.database.url = Some(url.clone());
    }
    if let Some(schema) = &args.schema {
        config.database.schema = schema.clone();
    }
}

/// Apply source reading and quarantine flags to the configuration
pub fn apply_ingest_overrides(config: &mut Config, args: &IngestArgs) {
    if let Some(delimiter) = args.delimiter {
        config.ingest.delimiter = delimiter;
    }
    if let Some(dir) = &args.quarantine_dir {
        config.ingest.quarantine_dir = dir.clone();
    }
    if args.no_quarantine_file {
        config.ingest.write_quarantine = false;
    }
}

/// Target table named by the configuration
pub fn target_table(config: &Config) -> Result<TableName> {
    TableName::new(&config.database.schema, &config.ingest.target_table)
}

/// Open the database pool
pub async fn connect(config: &Config) -> Result<PgPool> {
    config.validate_database()?;
    create_pool(&config.database).await
}

/// Reference store for commands that can run without a database
///
/// File-backed when both reference files are given, otherwise PostgreSQL.
pub async fn reference_store(config: &Config, offline: &OfflineArgs) -> Result<Arc<dyn ReferenceStore>> {
    match offline.files() {
        Some((settings, obstacle_types)) => {
            info!(
                "Using reference files {} and {}",
                settings.display(),
                obstacle_types.display()
            );
            Ok(Arc::new(
                FileReferenceStore::from_files(settings, obstacle_types).await?,
            ))
        }
        None => {
            let pool = connect(config).await?;
            Ok(Arc::new(PgReferenceStore::new(pool, &config.database.schema)))
        }
    }
}

/// Spinner shown while a run is in progress; hidden in quiet mode
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print the end-of-run summary
pub fn print_run_summary(summary: &RunSummary) {
    let title = if summary.loaded.is_some() {
        "DOF Load Summary"
    } else {
        "DOF Validation Summary"
    };
    println!("\n{}", title.bright_green().bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "   • File: {} ({})",
        summary.file.display(),
        summary.file_type.tag()
    );
    if let Some(revision) = summary.revision_date {
        println!("   • Format revision: {}", revision);
    }
    println!(
        "   • Rows read: {}",
        summary.rows_read().to_string().bright_white().bold()
    );
    println!(
        "   • Accepted: {}",
        summary.accepted().to_string().bright_green().bold()
    );

    let quarantined = summary.quarantined().to_string();
    if summary.quarantined() > 0 {
        println!("   • Quarantined: {}", quarantined.bright_yellow().bold());
        for (reason, count) in summary.by_reason() {
            println!("       - {}: {}", reason, count);
        }
    } else {
        println!("   • Quarantined: {}", quarantined.bright_white());
    }

    if let Some((target, rows)) = &summary.loaded {
        println!(
            "   • Loaded: {} into {}",
            rows.to_string().bright_green().bold(),
            target
        );
        if let Some(valid_from) = summary.valid_from {
            println!("   • Valid from: {}", valid_from);
        }
    }
    if let Some(path) = &summary.quarantine_file {
        println!("   • Quarantine file: {}", path.display().to_string().bright_yellow());
    }
    println!("   • Processing time: {}", HumanDuration(summary.elapsed));
    println!();
}

/// Describe a source file for spinner messages
pub fn describe(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
