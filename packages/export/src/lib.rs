#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Idempotent CSV table export.
//!
//! Each provider gets one CSV table named after the provider (with
//! filesystem-unsafe characters replaced). Writing is a
//! read-union-dedupe-rewrite: rows already persisted from a prior run
//! keep their position, new rows append, and exact duplicates collapse,
//! so re-running extraction over unchanged inputs is a no-op.
//!
//! The same merge engine backs the ledger analysis reports, which
//! deduplicate on a caller-chosen key (e.g. case number) rather than the
//! whole row.

use std::collections::HashSet;
use std::hash::Hash;
use std::path::{Path, PathBuf};

use care_audit_statement_models::{BillingRecord, ProviderTables};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors that can occur while reading or writing tables.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization or parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Characters that cannot appear in file names on common filesystems.
const UNSAFE_CHARS: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Maps a provider name to a filesystem-safe file stem.
#[must_use]
pub fn safe_file_name(provider: &str) -> String {
    provider
        .chars()
        .map(|c| if UNSAFE_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Path of the persisted table for `provider` under `output_dir`.
#[must_use]
pub fn table_path(output_dir: &Path, provider: &str) -> PathBuf {
    output_dir.join(format!("{}.csv", safe_file_name(provider)))
}

/// Reads all rows of a CSV file into `T`.
///
/// # Errors
///
/// Returns [`ExportError`] if the file cannot be opened or a row fails
/// to deserialize.
pub fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, ExportError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Writes `rows` to `path`, creating parent directories on demand.
///
/// # Errors
///
/// Returns [`ExportError`] on I/O or serialization failure.
pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Unions `existing` and `new_rows`, keeping the first occurrence per
/// `key`. Existing rows keep their positions; new rows append after.
pub fn merge_rows<T, K, F>(existing: Vec<T>, new_rows: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::with_capacity(existing.len() + new_rows.len());
    for row in existing.into_iter().chain(new_rows) {
        if seen.insert(key(&row)) {
            merged.push(row);
        }
    }
    merged
}

/// Merges `new_rows` into the CSV at `path` and rewrites it, returning
/// the merged row count.
///
/// A persisted file that fails to read is treated as no prior data (the
/// failure is logged): partial success beats aborting the run.
///
/// # Errors
///
/// Returns [`ExportError`] if the merged table cannot be written.
pub fn merge_into_csv<T, K, F>(path: &Path, new_rows: Vec<T>, key: F) -> Result<usize, ExportError>
where
    T: Serialize + DeserializeOwned,
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let existing = if path.exists() {
        match read_csv(path) {
            Ok(rows) => rows,
            Err(e) => {
                log::warn!(
                    "failed to read existing table {}: {e}, treating as empty",
                    path.display()
                );
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    let merged = merge_rows(existing, new_rows, key);
    write_csv(path, &merged)?;
    Ok(merged.len())
}

/// Writes every provider's accumulated rows to its table under
/// `output_dir`, merging with any persisted table from a prior run.
/// Returns `(provider, merged row count)` pairs in provider order.
///
/// # Errors
///
/// Returns [`ExportError`] if a table cannot be written. Tables written
/// before the failure stay on disk.
pub fn write_provider_tables(
    output_dir: &Path,
    tables: &ProviderTables,
) -> Result<Vec<(String, usize)>, ExportError> {
    let mut written = Vec::with_capacity(tables.len());
    for (provider, rows) in tables.iter() {
        let path = table_path(output_dir, provider);
        let count = merge_into_csv(&path, rows.to_vec(), BillingRecord::clone)?;
        log::info!("{}: {count} row(s)", path.display());
        written.push((provider.to_owned(), count));
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use care_audit_statement_models::{COLUMN_COUNT, ProviderDocument};

    use super::*;

    fn record(client: &str) -> BillingRecord {
        let mut fields: Vec<String> = (0..COLUMN_COUNT).map(|i| format!("f{i}")).collect();
        fields[0] = client.to_string();
        fields[1] = "01".to_string();
        BillingRecord::from_fields(fields, false).unwrap()
    }

    fn scratch_dir(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("care_audit_export_{test}_{}", std::process::id()))
    }

    #[test]
    fn replaces_every_unsafe_character() {
        assert_eq!(
            safe_file_name(r#"A\B/C*D?E:F"G<H>I|J"#),
            "A_B_C_D_E_F_G_H_I_J"
        );
        assert_eq!(safe_file_name("12-XYZ CareHome"), "12-XYZ CareHome");
    }

    #[test]
    fn table_path_appends_csv_extension() {
        let path = table_path(Path::new("output"), "Home: East/West");
        assert_eq!(path, Path::new("output").join("Home_ East_West.csv"));
    }

    #[test]
    fn merge_keeps_first_occurrence_per_key() {
        let merged = merge_rows(vec![1, 2, 3], vec![3, 4, 2, 5], |n| *n);
        assert_eq!(merged, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn provider_tables_round_trip_and_stay_idempotent() {
        let dir = scratch_dir("round_trip");
        let _ = std::fs::remove_dir_all(&dir);

        let mut tables = ProviderTables::new();
        tables.absorb(ProviderDocument {
            provider: "12-XYZ CareHome".to_string(),
            records: vec![record("11111111"), record("22222222")],
        });

        let written = write_provider_tables(&dir, &tables).unwrap();
        assert_eq!(written, vec![("12-XYZ CareHome".to_string(), 2)]);

        let path = table_path(&dir, "12-XYZ CareHome");
        let rows: Vec<BillingRecord> = read_csv(&path).unwrap();
        assert_eq!(rows, tables.rows("12-XYZ CareHome").unwrap());

        // A second run over the same rows must not grow the table.
        let written = write_provider_tables(&dir, &tables).unwrap();
        assert_eq!(written, vec![("12-XYZ CareHome".to_string(), 2)]);

        // A later run with one overlapping and one new row unions.
        let mut next = ProviderTables::new();
        next.absorb(ProviderDocument {
            provider: "12-XYZ CareHome".to_string(),
            records: vec![record("22222222"), record("33333333")],
        });
        let written = write_provider_tables(&dir, &next).unwrap();
        assert_eq!(written, vec![("12-XYZ CareHome".to_string(), 3)]);

        let rows: Vec<BillingRecord> = read_csv(&path).unwrap();
        assert_eq!(rows[0].client, "11111111");
        assert_eq!(rows[2].client, "33333333");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unreadable_existing_table_is_treated_as_empty() {
        let dir = scratch_dir("unreadable");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join("table.csv");
        // Garbage that cannot deserialize into BillingRecord.
        std::fs::write(&path, "not,a,valid,header\n1,2,3,4\n").unwrap();

        let count = merge_into_csv(&path, vec![record("11111111")], BillingRecord::clone).unwrap();
        assert_eq!(count, 1);

        let rows: Vec<BillingRecord> = read_csv(&path).unwrap();
        assert_eq!(rows[0].client, "11111111");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
