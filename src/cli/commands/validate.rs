//! Validate command implementation
//!
//! Runs the pipeline up to validation and quarantine. The obstacle table is
//! never touched; reference data may come from files instead of a database.

use tracing::{debug, info};

use super::shared::{
    apply_database_overrides, apply_ingest_overrides, create_spinner, describe,
    print_run_summary, reference_store,
};
use crate::cli::args::ValidateArgs;
use crate::config::Config;
use crate::pipeline::{IngestionPipeline, PipelineOptions, RunSummary};
use crate::Result;

/// Validate command runner
pub async fn run_validate(mut config: Config, args: ValidateArgs, quiet: bool) -> Result<RunSummary> {
    debug!("Validate arguments: {:?}", args);

    apply_database_overrides(&mut config, &args.database);
    apply_ingest_overrides(&mut config, &args.ingest);
    config.validate()?;

    info!("Validating {}", args.file.display());
    let store = reference_store(&config, &args.offline).await?;
    let pipeline = IngestionPipeline::new(store, PipelineOptions::from_config(&config)?);

    let spinner = create_spinner(&format!("Validating {}...", describe(&args.file)), quiet);
    let result = pipeline.run(&args.file).await;
    spinner.finish_and_clear();

    let summary = result?;
    if !quiet {
        print_run_summary(&summary);
    }
    Ok(summary)
}
