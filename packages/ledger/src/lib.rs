#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Attendance-ledger cross-checks for extracted provider tables.
//!
//! The attendance ledger is an independently maintained report (CSV
//! export) keyed by case number, with per-visit attendance counts and a
//! branch assignment. These checks are ordinary relational operations
//! over that ledger and one provider table: join on the derived case
//! number (`Client/Suffix`), then surface mismatched attendance, branch
//! membership, missing cases, and overpayment.
//!
//! All operations are pure functions over in-memory rows; values that do
//! not parse as numbers are skipped from the joins rather than treated
//! as errors, mirroring the report-and-continue posture of extraction.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use care_audit_statement::format::parse_decimal;
use care_audit_statement_models::BillingRecord;
use serde::{Deserialize, Serialize};

/// Errors that can occur while loading the attendance ledger.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// One row of the attendance ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    /// Case number (`Client/Suffix`).
    #[serde(rename = "Case number")]
    pub case_number: String,
    /// Attendance count for this row, as exported.
    #[serde(rename = "Attendance")]
    pub attendance: String,
    /// Branch the case is assigned to, when present.
    #[serde(rename = "Branch", default)]
    pub branch: Option<String>,
}

/// A case whose summed ledger attendance disagrees with the extracted
/// days-attended column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceMismatch {
    /// Case number.
    #[serde(rename = "Case number")]
    pub case_number: String,
    /// Attendance summed over the ledger rows for this case.
    #[serde(rename = "Attendance_data")]
    pub ledger_days: f64,
    /// Days attended according to the extracted statement.
    #[serde(rename = "Extracted_data")]
    pub extracted_days: f64,
    /// `ledger_days - extracted_days`.
    #[serde(rename = "Difference")]
    pub difference: f64,
}

/// A branch name that appears on ledger rows for extracted cases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BranchRow {
    /// Branch name.
    #[serde(rename = "Branch")]
    pub branch: String,
}

/// A ledger case retained by a branch filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilteredCase {
    /// Case number.
    #[serde(rename = "Case number")]
    pub case_number: String,
    /// Branch the case belongs to.
    #[serde(rename = "Branch")]
    pub branch: String,
}

/// A case expected from the filtered ledger but absent from the
/// extracted table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingCase {
    /// Case number.
    #[serde(rename = "Missing Case number")]
    pub case_number: String,
}

/// A case whose attendance-based pay exceeds the extracted gross pay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverpaidCase {
    /// Case number.
    #[serde(rename = "Case number")]
    pub case_number: String,
    /// `attendance * rate - gross pay`, rounded to cents.
    #[serde(rename = "Amount Difference")]
    pub amount_difference: f64,
}

/// Loads the attendance ledger CSV. Case numbers are trimmed; rows with
/// an empty case number are dropped.
///
/// # Errors
///
/// Returns [`LedgerError`] if the file cannot be opened or a row fails
/// to parse.
pub fn load_ledger(path: &Path) -> Result<Vec<AttendanceEntry>, LedgerError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut entries = Vec::new();
    for row in reader.deserialize() {
        let mut entry: AttendanceEntry = row?;
        entry.case_number = entry.case_number.trim().to_string();
        if entry.case_number.is_empty() {
            continue;
        }
        entries.push(entry);
    }
    log::debug!("loaded {} ledger entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// Sums ledger attendance per case number. Rows whose attendance does
/// not parse are skipped.
#[must_use]
pub fn attendance_by_case(entries: &[AttendanceEntry]) -> BTreeMap<String, f64> {
    let mut sums = BTreeMap::new();
    for entry in entries {
        if let Some(value) = parse_decimal(&entry.attendance) {
            *sums.entry(entry.case_number.clone()).or_insert(0.0) += value;
        }
    }
    sums
}

/// First-occurrence record per case number, for joining a provider
/// table on the derived case identifier.
fn records_by_case(rows: &[BillingRecord]) -> BTreeMap<String, &BillingRecord> {
    let mut by_case = BTreeMap::new();
    for record in rows {
        by_case.entry(record.case_number()).or_insert(record);
    }
    by_case
}

/// Inner-joins summed ledger attendance against the extracted
/// days-attended column and reports every case where they disagree.
#[must_use]
pub fn compare_attendance(
    rows: &[BillingRecord],
    entries: &[AttendanceEntry],
) -> Vec<AttendanceMismatch> {
    let extracted = records_by_case(rows);
    let mut mismatches = Vec::new();

    for (case_number, ledger_days) in attendance_by_case(entries) {
        let Some(record) = extracted.get(&case_number) else {
            continue;
        };
        let Some(extracted_days) = parse_decimal(&record.days_attended) else {
            continue;
        };
        let difference = ledger_days - extracted_days;
        if difference.abs() > f64::EPSILON {
            mismatches.push(AttendanceMismatch {
                case_number,
                ledger_days,
                extracted_days,
                difference,
            });
        }
    }
    mismatches
}

/// Branches of the ledger rows whose case numbers appear in the
/// extracted table, deduplicated and sorted.
#[must_use]
pub fn unique_branches(rows: &[BillingRecord], entries: &[AttendanceEntry]) -> Vec<BranchRow> {
    let cases: HashSet<String> = rows.iter().map(BillingRecord::case_number).collect();

    let branches: BTreeSet<String> = entries
        .iter()
        .filter(|entry| cases.contains(&entry.case_number))
        .filter_map(|entry| entry.branch.as_deref())
        .map(str::trim)
        .filter(|branch| !branch.is_empty())
        .map(str::to_owned)
        .collect();

    branches
        .into_iter()
        .map(|branch| BranchRow { branch })
        .collect()
}

/// Ledger cases assigned to one of the target branches, one row per
/// case number (first occurrence wins).
#[must_use]
pub fn filter_by_branches(entries: &[AttendanceEntry], targets: &[String]) -> Vec<FilteredCase> {
    let targets: HashSet<&str> = targets.iter().map(|t| t.trim()).collect();
    let mut seen = HashSet::new();
    let mut filtered = Vec::new();

    for entry in entries {
        let Some(branch) = entry.branch.as_deref().map(str::trim) else {
            continue;
        };
        if branch.is_empty() || !targets.contains(branch) {
            continue;
        }
        if seen.insert(entry.case_number.clone()) {
            filtered.push(FilteredCase {
                case_number: entry.case_number.clone(),
                branch: branch.to_owned(),
            });
        }
    }
    filtered
}

/// Case numbers present in the filtered ledger set but absent from the
/// extracted table, sorted.
#[must_use]
pub fn missing_cases(filtered: &[FilteredCase], rows: &[BillingRecord]) -> Vec<MissingCase> {
    let extracted: HashSet<String> = rows.iter().map(BillingRecord::case_number).collect();

    let missing: BTreeSet<&str> = filtered
        .iter()
        .map(|case| case.case_number.as_str())
        .filter(|case_number| !extracted.contains(*case_number))
        .collect();

    missing
        .into_iter()
        .map(|case_number| MissingCase {
            case_number: case_number.to_owned(),
        })
        .collect()
}

/// Joins summed ledger attendance with the extracted rate and gross pay
/// and reports cases where attendance-based pay exceeds what the
/// statement shows as paid.
#[must_use]
pub fn overpaid_cases(rows: &[BillingRecord], entries: &[AttendanceEntry]) -> Vec<OverpaidCase> {
    let extracted = records_by_case(rows);
    let mut overpaid = Vec::new();

    for (case_number, attendance) in attendance_by_case(entries) {
        let Some(record) = extracted.get(&case_number) else {
            continue;
        };
        let (Some(rate), Some(gross_pay)) =
            (parse_decimal(&record.rate), parse_decimal(&record.gross_pay))
        else {
            continue;
        };
        let calculated = attendance * rate;
        if calculated > gross_pay {
            overpaid.push(OverpaidCase {
                case_number,
                amount_difference: ((calculated - gross_pay) * 100.0).round() / 100.0,
            });
        }
    }
    overpaid
}

#[cfg(test)]
mod tests {
    use care_audit_statement_models::COLUMN_COUNT;

    use super::*;

    fn entry(case: &str, attendance: &str, branch: Option<&str>) -> AttendanceEntry {
        AttendanceEntry {
            case_number: case.to_string(),
            attendance: attendance.to_string(),
            branch: branch.map(str::to_owned),
        }
    }

    fn record(client: &str, days_attended: &str, rate: &str, gross_pay: &str) -> BillingRecord {
        let mut fields: Vec<String> = (0..COLUMN_COUNT).map(|_| String::from("x")).collect();
        fields[0] = client.to_string();
        fields[1] = "01".to_string();
        fields[5] = rate.to_string();
        fields[9] = days_attended.to_string();
        fields[16] = gross_pay.to_string();
        BillingRecord::from_fields(fields, false).unwrap()
    }

    #[test]
    fn attendance_sums_per_case_and_skips_unparseable() {
        let entries = vec![
            entry("11111111/01", "3", None),
            entry("11111111/01", "2.5", None),
            entry("22222222/01", "n/a", None),
        ];
        let sums = attendance_by_case(&entries);
        assert!((sums["11111111/01"] - 5.5).abs() < f64::EPSILON);
        assert!(!sums.contains_key("22222222/01"));
    }

    #[test]
    fn compare_reports_only_disagreements() {
        let rows = vec![
            record("11111111", "20", "$100.00", "$500.00"),
            record("22222222", "18", "$90.00", "$360.00"),
        ];
        let entries = vec![
            entry("11111111/01", "20", None),
            entry("22222222/01", "15", None),
            entry("99999999/01", "7", None), // not extracted, no join
        ];

        let mismatches = compare_attendance(&rows, &entries);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].case_number, "22222222/01");
        assert!((mismatches[0].difference - -3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn branches_are_deduplicated_and_sorted() {
        let rows = vec![record("11111111", "20", "$1.00", "$1.00")];
        let entries = vec![
            entry("11111111/01", "1", Some("West")),
            entry("11111111/01", "1", Some("East")),
            entry("11111111/01", "1", Some("West ")),
            entry("22222222/01", "1", Some("North")), // case not extracted
            entry("11111111/01", "1", None),
        ];

        let branches = unique_branches(&rows, &entries);
        let names: Vec<&str> = branches.iter().map(|b| b.branch.as_str()).collect();
        assert_eq!(names, vec!["East", "West"]);
    }

    #[test]
    fn filter_keeps_one_row_per_case() {
        let entries = vec![
            entry("11111111/01", "1", Some("East")),
            entry("11111111/01", "1", Some("East")),
            entry("22222222/01", "1", Some("West")),
            entry("33333333/01", "1", Some("North")),
        ];
        let targets = vec!["East".to_string(), "West".to_string()];

        let filtered = filter_by_branches(&entries, &targets);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].case_number, "11111111/01");
        assert_eq!(filtered[1].branch, "West");
    }

    #[test]
    fn missing_is_the_sorted_set_difference() {
        let filtered = vec![
            FilteredCase {
                case_number: "22222222/01".to_string(),
                branch: "East".to_string(),
            },
            FilteredCase {
                case_number: "11111111/01".to_string(),
                branch: "East".to_string(),
            },
        ];
        let rows = vec![record("11111111", "20", "$1.00", "$1.00")];

        let missing = missing_cases(&filtered, &rows);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].case_number, "22222222/01");
    }

    #[test]
    fn overpaid_compares_attendance_pay_to_gross() {
        let rows = vec![
            // 6 * $100 = $600 > $500 paid: overpaid by $100.
            record("11111111", "20", "$100.00", "$500.00"),
            // 4 * $90 = $360 = gross: fine.
            record("22222222", "18", "$90.00", "$360.00"),
        ];
        let entries = vec![
            entry("11111111/01", "6", None),
            entry("22222222/01", "4", None),
        ];

        let overpaid = overpaid_cases(&rows, &entries);
        assert_eq!(overpaid.len(), 1);
        assert_eq!(overpaid[0].case_number, "11111111/01");
        assert!((overpaid[0].amount_difference - 100.0).abs() < f64::EPSILON);
    }
}
