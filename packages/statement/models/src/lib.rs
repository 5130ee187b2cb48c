#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Data model for extracted payroll statement line items.
//!
//! Every parsed statement line becomes a [`BillingRecord`] with exactly
//! [`COLUMN_COUNT`] columns in the fixed order the statements publish
//! them. Records are accumulated per provider in [`ProviderTables`],
//! which is passed explicitly through an extraction run so there is no
//! process-wide state.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of columns in a fully populated statement row.
pub const COLUMN_COUNT: usize = 23;

/// Column headers exactly as the statement tables publish them, in
/// schema order.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "Client",
    "Suffix",
    "Name",
    "Rate Type",
    "Quantity",
    "Rate",
    "Subtotal",
    "Care Level",
    "Six Month Begin",
    "Days Attended",
    "Days Absent",
    "Total Days Absent",
    "C1 Days Absent",
    "Holidays",
    "Approved Days",
    "C1 Days",
    "Gross Pay",
    "Weekly Fee",
    "Fee Due",
    "Total Net Adjusted Pay",
    "Special Needs",
    "Previously Paid",
    "Difference Paid",
];

/// Billing rate basis for a statement row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
pub enum RateType {
    /// Weekly rate.
    #[strum(serialize = "W")]
    Weekly,
    /// Daily rate.
    #[strum(serialize = "D")]
    Daily,
}

/// One extracted statement line item.
///
/// All columns are kept as the verbatim strings the statement printed
/// (currency and numeric columns are re-rendered during post-processing,
/// but parse failures leave the original text untouched, so `String` is
/// the honest type). Column order matches [`COLUMNS`].
///
/// Row equality and hashing cover the 23 columns only; the [`partial`]
/// marker is bookkeeping about *how* the row was parsed, not part of its
/// identity, so deduplication collapses a padded row and a later fully
/// populated copy of the same data.
///
/// [`partial`]: BillingRecord::partial
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingRecord {
    /// 8-digit client identifier.
    #[serde(rename = "Client")]
    pub client: String,
    /// 2-digit case suffix.
    #[serde(rename = "Suffix")]
    pub suffix: String,
    /// Client name (space-joined alphabetic tokens).
    #[serde(rename = "Name")]
    pub name: String,
    /// Rate basis, `W` or `D` (see [`RateType`]).
    #[serde(rename = "Rate Type")]
    pub rate_type: String,
    /// Billed quantity, two implied fraction digits.
    #[serde(rename = "Quantity")]
    pub quantity: String,
    /// Unit rate (currency).
    #[serde(rename = "Rate")]
    pub rate: String,
    /// Line subtotal (currency).
    #[serde(rename = "Subtotal")]
    pub subtotal: String,
    /// Care level code.
    #[serde(rename = "Care Level")]
    pub care_level: String,
    /// Six-month period begin (`M/YY` as printed).
    #[serde(rename = "Six Month Begin")]
    pub six_month_begin: String,
    /// Days attended in the period.
    #[serde(rename = "Days Attended")]
    pub days_attended: String,
    /// Days absent in the period.
    #[serde(rename = "Days Absent")]
    pub days_absent: String,
    /// Running total of absent days.
    #[serde(rename = "Total Days Absent")]
    pub total_days_absent: String,
    /// Category-1 absent days.
    #[serde(rename = "C1 Days Absent")]
    pub c1_days_absent: String,
    /// Holidays in the period.
    #[serde(rename = "Holidays")]
    pub holidays: String,
    /// Approved care days.
    #[serde(rename = "Approved Days")]
    pub approved_days: String,
    /// Category-1 care days.
    #[serde(rename = "C1 Days")]
    pub c1_days: String,
    /// Gross pay (currency).
    #[serde(rename = "Gross Pay")]
    pub gross_pay: String,
    /// Weekly fee (numeric).
    #[serde(rename = "Weekly Fee")]
    pub weekly_fee: String,
    /// Fee due (currency).
    #[serde(rename = "Fee Due")]
    pub fee_due: String,
    /// Total net adjusted pay (currency).
    #[serde(rename = "Total Net Adjusted Pay")]
    pub total_net_adjusted_pay: String,
    /// Special-needs marker.
    #[serde(rename = "Special Needs")]
    pub special_needs: String,
    /// Amount previously paid (currency).
    #[serde(rename = "Previously Paid")]
    pub previously_paid: String,
    /// Difference paid (currency).
    #[serde(rename = "Difference Paid")]
    pub difference_paid: String,
    /// `true` when the fallback matcher right-padded a short trailing
    /// segment with empty columns; the row is a best-effort extraction
    /// rather than a confident one. Not serialized into provider tables.
    #[serde(skip)]
    pub partial: bool,
}

impl BillingRecord {
    /// Builds a record from exactly [`COLUMN_COUNT`] assembled fields in
    /// schema order. Returns `None` for any other field count.
    #[must_use]
    pub fn from_fields(fields: Vec<String>, partial: bool) -> Option<Self> {
        if fields.len() != COLUMN_COUNT {
            return None;
        }
        let mut it = fields.into_iter();
        // `it` holds exactly COLUMN_COUNT items, checked above.
        let mut next = || it.next().unwrap_or_default();
        Some(Self {
            client: next(),
            suffix: next(),
            name: next(),
            rate_type: next(),
            quantity: next(),
            rate: next(),
            subtotal: next(),
            care_level: next(),
            six_month_begin: next(),
            days_attended: next(),
            days_absent: next(),
            total_days_absent: next(),
            c1_days_absent: next(),
            holidays: next(),
            approved_days: next(),
            c1_days: next(),
            gross_pay: next(),
            weekly_fee: next(),
            fee_due: next(),
            total_net_adjusted_pay: next(),
            special_needs: next(),
            previously_paid: next(),
            difference_paid: next(),
            partial,
        })
    }

    /// Returns the 23 column values in schema order.
    #[must_use]
    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.client,
            &self.suffix,
            &self.name,
            &self.rate_type,
            &self.quantity,
            &self.rate,
            &self.subtotal,
            &self.care_level,
            &self.six_month_begin,
            &self.days_attended,
            &self.days_absent,
            &self.total_days_absent,
            &self.c1_days_absent,
            &self.holidays,
            &self.approved_days,
            &self.c1_days,
            &self.gross_pay,
            &self.weekly_fee,
            &self.fee_due,
            &self.total_net_adjusted_pay,
            &self.special_needs,
            &self.previously_paid,
            &self.difference_paid,
        ]
    }

    /// Derived case identifier, `Client/Suffix`.
    ///
    /// Computed on demand for downstream joins; never stored as a column.
    #[must_use]
    pub fn case_number(&self) -> String {
        format!("{}/{}", self.client, self.suffix)
    }
}

impl PartialEq for BillingRecord {
    fn eq(&self, other: &Self) -> bool {
        self.fields() == other.fields()
    }
}

impl Eq for BillingRecord {}

impl Hash for BillingRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for field in self.fields() {
            field.hash(state);
        }
    }
}

/// The association between one provider-name header and the records
/// attributed to it within a single source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderDocument {
    /// Whitespace-normalized provider name from the document header.
    pub provider: String,
    /// Rows extracted from the document, in page order.
    pub records: Vec<BillingRecord>,
}

/// Accumulates extracted rows per provider across the files of one run.
///
/// Replaces the global mutable dictionary a batch script would reach
/// for: the extractor takes a `&mut ProviderTables`, so each run (and
/// each unit test) owns its own accumulator. `BTreeMap` keeps provider
/// iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTables {
    tables: BTreeMap<String, Vec<BillingRecord>>,
}

impl ProviderTables {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no provider has any rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of providers with at least one row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Appends a document's rows under its provider key. Rows from later
    /// files targeting the same provider accumulate onto the same table.
    pub fn absorb(&mut self, document: ProviderDocument) {
        self.tables
            .entry(document.provider)
            .or_default()
            .extend(document.records);
    }

    /// Rows accumulated for `provider`, if any.
    #[must_use]
    pub fn rows(&self, provider: &str) -> Option<&[BillingRecord]> {
        self.tables.get(provider).map(Vec::as_slice)
    }

    /// Iterates `(provider, rows)` in provider-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[BillingRecord])> {
        self.tables
            .iter()
            .map(|(name, rows)| (name.as_str(), rows.as_slice()))
    }

    /// Mutable iteration for in-place row post-processing.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<BillingRecord>)> {
        self.tables
            .iter_mut()
            .map(|(name, rows)| (name.as_str(), rows))
    }
}
