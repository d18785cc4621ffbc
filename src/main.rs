use clap::Parser;
use dof_loader::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No signal handler; run to completion
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = commands::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(dof_loader::Error::processing_interrupted(
                    "Run interrupted by user; quarantine output may be incomplete",
                ))
            }
        }
    });

    if let Err(error) = result {
        eprintln!("Error [{}]: {:#}", error.stage(), error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("DOF Loader - FAA Digital Obstacle File ingestion");
    println!("================================================");
    println!();
    println!("Load the FAA Digital Obstacle File (CSV or fixed-width DAT) into a");
    println!("PostGIS obstacle table, quarantining rows that fail validation.");
    println!();
    println!("USAGE:");
    println!("    dof-loader <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    load        Validate a DOF file and load the accepted rows");
    println!("    validate    Validate a DOF file and write the quarantine file only");
    println!("    types       List the obstacle types used in a DOF file");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Load the CSV publication:");
    println!("    dof-loader load DOF.CSV --database-url postgres://localhost/gis");
    println!();
    println!("    # Check the fixed-width publication against reference files:");
    println!("    dof-loader validate DOF.DAT --settings dof_conf.json \\");
    println!("                                --obstacle-types obstacle_types.csv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    dof-loader <COMMAND> --help");
}
