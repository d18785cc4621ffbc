//! Load command implementation
//!
//! Resolves everything from the database, runs the full pipeline and loads
//! the accepted rows into the obstacle table.

use std::sync::Arc;
use tracing::{debug, info};

use super::shared::{
    apply_database_overrides, apply_ingest_overrides, connect, create_spinner, describe,
    print_run_summary, target_table,
};
use crate::app::adapters::reference_store::PgReferenceStore;
use crate::app::services::staging_loader::PgStagingBackend;
use crate::cli::args::LoadArgs;
use crate::config::Config;
use crate::pipeline::{IngestionPipeline, PipelineOptions, RunSummary};
use crate::Result;

/// Load command runner
pub async fn run_load(mut config: Config, args: LoadArgs, quiet: bool) -> Result<RunSummary> {
    debug!("Load arguments: {:?}", args);

    apply_database_overrides(&mut config, &args.database);
    apply_ingest_overrides(&mut config, &args.ingest);
    if let Some(table) = &args.target_table {
        config.ingest.target_table = table.clone();
    }
    if args.valid_from.is_some() {
        config.ingest.valid_from = args.valid_from;
    }
    config.validate()?;

    let target = target_table(&config)?;
    let pool = connect(&config).await?;
    info!("Loading {} into {}", args.file.display(), target);

    let store = Arc::new(PgReferenceStore::new(pool.clone(), &config.database.schema));
    let pipeline = IngestionPipeline::new(store, PipelineOptions::from_config(&config)?)
        .with_loader(Arc::new(PgStagingBackend::new(pool.clone())), target);

    let spinner = create_spinner(&format!("Loading {}...", describe(&args.file)), quiet);
    let result = pipeline.run(&args.file).await;
    spinner.finish_and_clear();
    pool.close().await;

    let summary = result?;
    if !quiet {
        print_run_summary(&summary);
    }
    Ok(summary)
}
