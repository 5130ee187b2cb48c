#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the care provider billing audit toolchain.
//!
//! Subcommands cover the full pipeline: extracting PDF statements into
//! per-provider tables, then running the attendance-ledger cross-checks
//! over those tables. Without a subcommand an interactive picker runs
//! instead.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines
//! and progress bars never fight for the terminal.

mod config;
mod interactive;
mod progress;
mod tasks;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "care_audit", about = "Care provider billing audit toolchain")]
struct Cli {
    /// Path to a TOML config file (default: `care-audit.toml` when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract billing rows from every PDF statement in the input directory
    Extract {
        /// Directory of PDF statements (overrides config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Directory for provider tables (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Maximum number of PDF files to process (for testing)
        #[arg(long)]
        limit: Option<usize>,
    },
    /// List the provider tables available for analysis
    Tables,
    /// Compare ledger attendance against a provider table
    Attendance {
        /// Provider table name (as listed by `tables`) or path
        table: String,
        /// Attendance ledger CSV (overrides config)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// List the ledger branches for the cases of a provider table
    Branches {
        /// Provider table name or path
        table: String,
        /// Attendance ledger CSV (overrides config)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Filter ledger cases down to target branches
    FilterBranches {
        /// Branch list CSV produced by `branches`
        branches_file: PathBuf,
        /// Restrict to this branch (repeatable; default: all in the file)
        #[arg(long = "branch")]
        branches: Vec<String>,
        /// Attendance ledger CSV (overrides config)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
    /// Report filtered ledger cases missing from a provider table
    Missing {
        /// Provider table name or path
        table: String,
        /// Filtered case CSV produced by `filter-branches`
        filtered_file: PathBuf,
    },
    /// Report cases paid more than attendance times rate
    Overpaid {
        /// Provider table name or path
        table: String,
        /// Attendance ledger CSV (overrides config)
        #[arg(long)]
        ledger: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;

    let Some(command) = cli.command else {
        return interactive::run(&config, &multi);
    };

    match command {
        Commands::Extract {
            input,
            output,
            limit,
        } => {
            if let Some(input) = input {
                config.input_dir = input;
            }
            if let Some(output) = output {
                config.output_dir = output;
            }
            tasks::run_extract(&config, limit, &multi)?;
        }
        Commands::Tables => tasks::run_tables(&config)?,
        Commands::Attendance { table, ledger } => {
            if let Some(ledger) = ledger {
                config.ledger_path = ledger;
            }
            tasks::run_attendance(&config, &table)?;
        }
        Commands::Branches { table, ledger } => {
            if let Some(ledger) = ledger {
                config.ledger_path = ledger;
            }
            tasks::run_branches(&config, &table)?;
        }
        Commands::FilterBranches {
            branches_file,
            branches,
            ledger,
        } => {
            if let Some(ledger) = ledger {
                config.ledger_path = ledger;
            }
            tasks::run_filter(&config, &branches_file, &branches)?;
        }
        Commands::Missing {
            table,
            filtered_file,
        } => tasks::run_missing(&config, &table, &filtered_file)?,
        Commands::Overpaid { table, ledger } => {
            if let Some(ledger) = ledger {
                config.ledger_path = ledger;
            }
            tasks::run_overpaid(&config, &table)?;
        }
    }

    Ok(())
}
