#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Line parsers for payroll statement rows.
//!
//! A statement page renders each billing line item as one physical text
//! line, but spacing is inconsistent, currency columns bleed together,
//! and some rows drop trailing fields. Two cooperating strategies handle
//! this:
//!
//! - [`strict::StrictTokenizer`]: whitespace tokenization with
//!   positional type validation. High precision; rejects anything that
//!   does not assemble into exactly the expected column count.
//! - [`fallback::FallbackPattern`]: a single structured regex over the
//!   fixed-format prefix plus a free-form tail, tolerating short rows by
//!   padding. Runs only on lines the tokenizer rejected.
//!
//! Both implement [`LineParser`], so [`parse_row`] just walks the
//! ordered strategy list and returns the first match. Adding a third
//! strategy means adding one element to [`PARSERS`].

pub mod fallback;
pub mod format;
pub mod strict;

use care_audit_statement_models::BillingRecord;

use crate::fallback::FallbackPattern;
use crate::strict::StrictTokenizer;

/// Outcome of offering a line to a parser strategy.
///
/// Most lines on a statement page are headers, footers, or wrapped text
/// rather than billing rows, so `Unmatched` is the common, non-error
/// case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// The line is a billing row; here is its record.
    Matched(BillingRecord),
    /// The line is not a billing row (for this strategy).
    Unmatched,
}

impl ParseResult {
    /// `true` for [`ParseResult::Matched`].
    #[must_use]
    pub const fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    /// Unwraps the record, if any.
    #[must_use]
    pub fn into_record(self) -> Option<BillingRecord> {
        match self {
            Self::Matched(record) => Some(record),
            Self::Unmatched => None,
        }
    }
}

/// A strategy for deciding whether one physical text line is a billing
/// row and, if so, splitting it into record fields.
pub trait LineParser {
    /// Attempts to parse `line` as a billing row.
    fn parse_line(&self, line: &str) -> ParseResult;
}

/// Parser strategies in priority order: the strict tokenizer first, the
/// fallback matcher only for lines the tokenizer rejected.
pub const PARSERS: [&(dyn LineParser + Sync); 2] = [&StrictTokenizer, &FallbackPattern];

/// Runs `line` through [`PARSERS`] in order and returns the first match.
#[must_use]
pub fn parse_row(line: &str) -> ParseResult {
    for parser in PARSERS {
        let result = parser.parse_line(line);
        if result.is_matched() {
            return result;
        }
    }
    ParseResult::Unmatched
}
