//! Interactive tool picker, used when no subcommand is given.

use std::path::Path;

use dialoguer::{Input, Select};

use crate::config::Config;
use crate::progress::MultiProgress;
use crate::tasks;

/// Top-level tool selection for the audit toolchain.
enum Tool {
    Extract,
    Tables,
    Attendance,
    Branches,
    FilterBranches,
    Missing,
    Overpaid,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Extract,
        Self::Tables,
        Self::Attendance,
        Self::Branches,
        Self::FilterBranches,
        Self::Missing,
        Self::Overpaid,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Extract => "Extract PDF statements",
            Self::Tables => "List provider tables",
            Self::Attendance => "Compare attendance",
            Self::Branches => "Find branch names",
            Self::FilterBranches => "Filter cases by branch",
            Self::Missing => "Find missing cases",
            Self::Overpaid => "Find overpaid cases",
        }
    }
}

/// Runs the interactive picker and dispatches the selected tool.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected task fails.
pub fn run(config: &Config, multi: &MultiProgress) -> tasks::TaskResult {
    println!("Care Audit Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Extract => tasks::run_extract(config, None, multi),
        Tool::Tables => tasks::run_tables(config),
        Tool::Attendance => {
            let table = select_table(config)?;
            tasks::run_attendance(config, &table)
        }
        Tool::Branches => {
            let table = select_table(config)?;
            tasks::run_branches(config, &table)
        }
        Tool::FilterBranches => {
            let branches_file: String = Input::new()
                .with_prompt("Branch list CSV (from the branch names tool)")
                .interact_text()?;
            tasks::run_filter(config, Path::new(&branches_file), &[])
        }
        Tool::Missing => {
            let table = select_table(config)?;
            let filtered_file: String = Input::new()
                .with_prompt("Filtered case CSV (from the branch filter tool)")
                .interact_text()?;
            tasks::run_missing(config, &table, Path::new(&filtered_file))
        }
        Tool::Overpaid => {
            let table = select_table(config)?;
            tasks::run_overpaid(config, &table)
        }
    }
}

/// Prompts for one of the provider tables in the output directory.
fn select_table(config: &Config) -> Result<String, Box<dyn std::error::Error>> {
    let tables = tasks::provider_tables(&config.output_dir)?;
    if tables.is_empty() {
        return Err(format!(
            "no provider tables in {}, run extraction first",
            config.output_dir.display()
        )
        .into());
    }

    let idx = Select::new()
        .with_prompt("Which provider table?")
        .items(&tables)
        .default(0)
        .interact()?;
    Ok(tables[idx].clone())
}
