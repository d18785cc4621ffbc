//! Command implementations for the DOF loader CLI
//!
//! Each command is implemented in its own module:
//! - `load`: Full ingestion run including the staging load
//! - `validate`: Validation and quarantine only
//! - `types`: Obstacle type listing for a source file

pub mod load;
pub mod shared;
pub mod types;
pub mod validate;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Main command runner for the DOF loader
///
/// Loads the layered configuration, starts logging and dispatches to the
/// subcommand handler. `args.command` must be set.
pub async fn run(args: Args) -> Result<()> {
    let config = shared::load_configuration(&args)?;
    let quiet = args.quiet;

    match args.command {
        Some(Commands::Load(load_args)) => load::run_load(config, load_args, quiet).await.map(|_| ()),
        Some(Commands::Validate(validate_args)) => validate::run_validate(config, validate_args, quiet)
            .await
            .map(|_| ()),
        Some(Commands::Types(types_args)) => types::run_types(config, types_args, quiet).await.map(|_| ()),
        None => Err(crate::Error::configuration("No command given")),
    }
}
