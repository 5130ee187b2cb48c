//! Command implementations shared by the clap subcommands and the
//! interactive picker.

use std::error::Error;
use std::path::{Path, PathBuf};

use care_audit_export::{merge_into_csv, read_csv, write_csv, write_provider_tables};
use care_audit_ledger::{
    BranchRow, FilteredCase, compare_attendance, filter_by_branches, load_ledger, missing_cases,
    overpaid_cases, unique_branches,
};
use care_audit_statement_models::BillingRecord;

use crate::config::Config;
use crate::progress::{IndicatifProgress, MultiProgress};

pub type TaskResult = Result<(), Box<dyn Error>>;

/// Extracts every PDF statement in the input directory and merges the
/// results into the per-provider tables.
pub fn run_extract(config: &Config, limit: Option<usize>, multi: &MultiProgress) -> TaskResult {
    let progress = IndicatifProgress::files_bar(multi, "Extracting statements");
    let tables = care_audit_extract::extract_dir(&config.input_dir, limit, &progress)?;

    if tables.is_empty() {
        log::warn!(
            "no provider rows found under {}",
            config.input_dir.display()
        );
        return Ok(());
    }

    let written = write_provider_tables(&config.output_dir, &tables)?;
    println!(
        "Merged {} provider table(s) into {}",
        written.len(),
        config.output_dir.display()
    );
    Ok(())
}

/// Provider table names (file stems) present in the output directory.
pub fn provider_tables(output_dir: &Path) -> Result<Vec<String>, Box<dyn Error>> {
    if !output_dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = std::fs::read_dir(output_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .filter_map(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .collect();
    names.sort();
    Ok(names)
}

/// Lists the provider tables available for analysis.
pub fn run_tables(config: &Config) -> TaskResult {
    let names = provider_tables(&config.output_dir)?;
    if names.is_empty() {
        println!("No provider tables in {}", config.output_dir.display());
        return Ok(());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

/// Compares summed ledger attendance against a provider table and
/// records the mismatches.
pub fn run_attendance(config: &Config, table: &str) -> TaskResult {
    let table_path = resolve_table(config, table);
    let rows: Vec<BillingRecord> = read_csv(&table_path)?;
    let entries = load_ledger(&config.ledger_path)?;

    let mismatches = compare_attendance(&rows, &entries);
    let out = config.attendance_dir().join(format!(
        "attendance_comparison_result_{}.csv",
        file_stem(&table_path)
    ));
    let total = merge_into_csv(&out, mismatches, |m| m.case_number.clone())?;

    log::info!("report written to {}", out.display());
    println!("Mismatched entries found: {total}");
    Ok(())
}

/// Collects the unique ledger branches for the cases of a provider
/// table.
pub fn run_branches(config: &Config, table: &str) -> TaskResult {
    let table_path = resolve_table(config, table);
    let rows: Vec<BillingRecord> = read_csv(&table_path)?;
    let entries = load_ledger(&config.ledger_path)?;

    let branches = unique_branches(&rows, &entries);
    let out = config
        .branch_dir()
        .join(format!("Branch_Names_{}.csv", file_stem(&table_path)));
    let total = merge_into_csv(&out, branches, |b| b.branch.clone())?;

    log::info!("report written to {}", out.display());
    println!("Unique Branches Found: {total}");
    Ok(())
}

/// Filters the ledger down to cases belonging to the target branches.
///
/// `only` narrows the branch list read from `branches_file`; empty means
/// all of them.
pub fn run_filter(config: &Config, branches_file: &Path, only: &[String]) -> TaskResult {
    let branch_rows: Vec<BranchRow> = read_csv(branches_file)?;
    let mut targets: Vec<String> = branch_rows.into_iter().map(|b| b.branch).collect();
    if !only.is_empty() {
        targets.retain(|branch| only.iter().any(|o| o.trim() == branch));
    }
    if targets.is_empty() {
        log::warn!("no target branches selected, nothing to filter");
        return Ok(());
    }

    let entries = load_ledger(&config.ledger_path)?;
    let filtered = filter_by_branches(&entries, &targets);
    let out = config.filter_dir().join(format!(
        "filtered_case_numbers_by_branch_{}.csv",
        file_stem(branches_file)
    ));
    let total = merge_into_csv(&out, filtered, |c| c.case_number.clone())?;

    log::info!("report written to {}", out.display());
    println!("Total unique case numbers: {total}");
    Ok(())
}

/// Reports filtered ledger cases that are absent from a provider table.
pub fn run_missing(config: &Config, table: &str, filtered_file: &Path) -> TaskResult {
    let table_path = resolve_table(config, table);
    let rows: Vec<BillingRecord> = read_csv(&table_path)?;
    let filtered: Vec<FilteredCase> = read_csv(filtered_file)?;

    let missing = missing_cases(&filtered, &rows);
    let out = config.missing_dir().join(format!(
        "missing_case_numbers_{}.csv",
        file_stem(&table_path)
    ));
    write_csv(&out, &missing)?;

    log::info!("report written to {}", out.display());
    println!("Missing case numbers identified: {}", missing.len());
    Ok(())
}

/// Reports cases whose attendance-based pay exceeds the extracted gross
/// pay.
pub fn run_overpaid(config: &Config, table: &str) -> TaskResult {
    let table_path = resolve_table(config, table);
    let rows: Vec<BillingRecord> = read_csv(&table_path)?;
    let entries = load_ledger(&config.ledger_path)?;

    let overpaid = overpaid_cases(&rows, &entries);
    let out = config.overpaid_dir().join(format!(
        "attendance_overpaid_cases_filtered_{}.csv",
        file_stem(&table_path)
    ));
    write_csv(&out, &overpaid)?;

    log::info!("report written to {}", out.display());
    println!("Overpaid cases identified: {}", overpaid.len());
    Ok(())
}

/// Resolves a table argument: an explicit path is used as given, a bare
/// name is looked up in the output directory.
fn resolve_table(config: &Config, table: &str) -> PathBuf {
    let path = Path::new(table);
    if path.extension().is_some() {
        path.to_path_buf()
    } else {
        config.output_dir.join(format!("{table}.csv"))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "table".to_string(), |s| s.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_resolve_into_the_output_dir() {
        let config = Config::default();
        assert_eq!(
            resolve_table(&config, "12-XYZ CareHome"),
            Path::new("output").join("12-XYZ CareHome.csv")
        );
        assert_eq!(
            resolve_table(&config, "elsewhere/table.csv"),
            Path::new("elsewhere/table.csv")
        );
    }

    #[test]
    fn stems_fall_back_when_absent() {
        assert_eq!(file_stem(Path::new("output/Home.csv")), "Home");
        assert_eq!(file_stem(Path::new("/")), "table");
    }
}
