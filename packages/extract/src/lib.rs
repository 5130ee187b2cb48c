#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch extraction of payroll statement PDFs into provider row tables.
//!
//! Each PDF is a multi-page statement carrying at most one active
//! provider header. Page text comes from pure-Rust extraction
//! ([`pdf_extract`]); every candidate line is offered to the parser
//! chain in [`care_audit_statement`], and matched rows accumulate per
//! provider in a [`ProviderTables`] passed through the run.
//!
//! Failure granularity is per file: a corrupt PDF is logged and skipped,
//! and only a missing or unreadable input directory aborts the run.

pub mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::LazyLock;

use care_audit_statement::{ParseResult, format, parse_row};
use care_audit_statement_models::{BillingRecord, ProviderDocument, ProviderTables};
use indexmap::IndexSet;
use regex::Regex;

use crate::progress::ProgressCallback;

/// Errors that can occur during statement extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Pdf(String),

    /// The input directory does not exist or is not a directory.
    #[error("input directory not found: {0}")]
    MissingInputDir(PathBuf),
}

/// A row candidate starts with an 8-digit client number.
static ROW_CANDIDATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}").unwrap_or_else(|_| unreachable!()));

/// Recognizes a provider-name header line and returns the provider name.
///
/// Header lines start with the literal `Provider ` prefix; statement
/// footers repeat the provider *number* in a similar position, so those
/// are excluded. The prefix is stripped and internal whitespace runs are
/// collapsed to single spaces.
#[must_use]
pub fn provider_header(line: &str) -> Option<String> {
    if line.contains("Provider number") {
        return None;
    }
    let name = line.strip_prefix("Provider ")?;
    Some(name.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Scans the page texts of one document for a provider header and
/// billing rows.
///
/// The header may appear on any page and more than once; the last seen
/// wins. A document yields output only when both a header and at least
/// one matched row were found; anything else is expected noise, not an
/// error.
#[must_use]
pub fn scan_pages(pages: &[String]) -> Option<ProviderDocument> {
    let mut provider: Option<String> = None;
    let mut records: Vec<BillingRecord> = Vec::new();

    for (index, text) in pages.iter().enumerate() {
        if text.trim().is_empty() {
            log::debug!("page {} has no text layer, skipping", index + 1);
            continue;
        }

        for raw_line in text.lines() {
            let line = raw_line.trim();

            if let Some(name) = provider_header(line) {
                log::debug!("found provider header: {name}");
                provider = Some(name);
            }

            if ROW_CANDIDATE.is_match(line)
                && let ParseResult::Matched(record) = parse_row(line)
            {
                records.push(record);
            }
        }
    }

    match provider {
        Some(provider) if !records.is_empty() => Some(ProviderDocument { provider, records }),
        _ => None,
    }
}

/// Extracts one PDF file into a [`ProviderDocument`], if it contains a
/// provider header and billing rows.
///
/// # Errors
///
/// Returns [`ExtractError`] if the file cannot be read or its text
/// layer cannot be extracted.
pub fn extract_file(path: &Path) -> Result<Option<ProviderDocument>, ExtractError> {
    let bytes = std::fs::read(path)?;
    log::debug!("read {} bytes from {}", bytes.len(), path.display());

    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|e| {
        ExtractError::Pdf(format!(
            "failed to extract text from {}: {e}",
            path.display()
        ))
    })?;

    Ok(scan_pages(&pages))
}

/// Post-processes accumulated tables in place: canonical currency and
/// numeric rendering, then exact-duplicate removal preserving first-seen
/// order.
pub fn normalize_tables(tables: &mut ProviderTables) {
    for (provider, rows) in tables.iter_mut() {
        for record in rows.iter_mut() {
            format::normalize(record);
        }

        let before = rows.len();
        let deduped: IndexSet<BillingRecord> = rows.drain(..).collect();
        *rows = deduped.into_iter().collect();
        if rows.len() < before {
            log::debug!("{provider}: removed {} duplicate row(s)", before - rows.len());
        }
    }
}

/// Processes every PDF in `dir` (sorted, case-insensitive `.pdf` match)
/// and returns the normalized per-provider tables.
///
/// Per-file extraction failures are logged and skipped; the run
/// continues. `limit` caps the number of files processed (for testing
/// against large input directories).
///
/// # Errors
///
/// Returns [`ExtractError::MissingInputDir`] if `dir` is not a
/// directory, or [`ExtractError::Io`] if it cannot be listed.
pub fn extract_dir(
    dir: &Path,
    limit: Option<usize>,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<ProviderTables, ExtractError> {
    if !dir.is_dir() {
        return Err(ExtractError::MissingInputDir(dir.to_path_buf()));
    }

    let mut pdfs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    pdfs.sort();
    if let Some(limit) = limit {
        pdfs.truncate(limit);
    }

    progress.set_total(pdfs.len() as u64);

    let mut tables = ProviderTables::new();
    for path in &pdfs {
        progress.set_message(path.display().to_string());
        match extract_file(path) {
            Ok(Some(document)) => {
                log::info!(
                    "{}: {} row(s) for provider {}",
                    path.display(),
                    document.records.len(),
                    document.provider
                );
                tables.absorb(document);
            }
            Ok(None) => {
                log::info!("{}: no provider rows found", path.display());
            }
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
            }
        }
        progress.inc(1);
    }

    normalize_tables(&mut tables);

    progress.finish(format!(
        "{} file(s) processed, {} provider table(s)",
        pdfs.len(),
        tables.len()
    ));
    Ok(tables)
}
