//! Structured-regex fallback matcher for statement rows.
//!
//! A looser second pass over lines the strict tokenizer rejected: one
//! anchored pattern captures the fixed-format prefix (through the
//! six-month-begin column) and a free-form tail, then the tail is
//! re-split on whitespace to fill the remaining columns. Trades some
//! precision for recall: the name must be exactly two words, but a
//! short tail is tolerated by right-padding empty columns.

use std::sync::LazyLock;

use care_audit_statement_models::{BillingRecord, COLUMN_COUNT};
use regex::Regex;

use crate::{LineParser, ParseResult};

/// Minimum assembled fields for a padded (partial) match.
const MIN_FIELDS: usize = 20;

/// Fixed-format prefix: client, suffix, two-word name, rate type,
/// quantity, two currency amounts (possibly glued together), care level,
/// six-month begin, then everything else as one tail capture.
static ROW_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{8})\s+(\d{2})\s+([A-Za-z]+\s+[A-Za-z]+)\s+([WD])\s+(\d+\.\d{2})\s*(\$\d+(?:,\d{3})*(?:\.\d{2})?)\s*(\$\d+(?:,\d{3})*(?:\.\d{2})?)\s+([A-Z])\s+(\d{1,2}/\d{2})\s+(.+)",
    )
    .unwrap_or_else(|_| unreachable!())
});

/// Regex matcher over the fixed prefix plus a whitespace-split tail.
pub struct FallbackPattern;

impl LineParser for FallbackPattern {
    fn parse_line(&self, line: &str) -> ParseResult {
        let Some(caps) = ROW_PATTERN.captures(line) else {
            return ParseResult::Unmatched;
        };

        let mut fields: Vec<String> = Vec::with_capacity(COLUMN_COUNT);
        for idx in 1..=9 {
            let text = caps.get(idx).map_or("", |m| m.as_str());
            if idx == 3 {
                // Collapse whitespace runs so the name matches the
                // tokenizer's rendering of the same row.
                fields.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
            } else {
                fields.push(text.to_owned());
            }
        }
        if let Some(tail) = caps.get(10) {
            fields.extend(tail.as_str().split_whitespace().map(str::to_owned));
        }

        if fields.len() >= COLUMN_COUNT {
            fields.truncate(COLUMN_COUNT);
            return BillingRecord::from_fields(fields, false)
                .map_or(ParseResult::Unmatched, ParseResult::Matched);
        }

        if fields.len() >= MIN_FIELDS {
            // Short tail: keep the row, mark it partial.
            fields.resize(COLUMN_COUNT, String::new());
            return BillingRecord::from_fields(fields, true)
                .map_or(ParseResult::Unmatched, ParseResult::Matched);
        }

        ParseResult::Unmatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParseResult {
        FallbackPattern.parse_line(line)
    }

    #[test]
    fn parses_full_row() {
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.client, "12345678");
        assert_eq!(record.name, "JOHN SMITH");
        assert_eq!(record.six_month_begin, "01/01");
        assert_eq!(record.difference_paid, "$20.00");
        assert!(!record.partial);
    }

    #[test]
    fn tolerates_glued_currency_columns() {
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00$500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.rate, "$100.00");
        assert_eq!(record.subtotal, "$500.00");
    }

    #[test]
    fn pads_short_tail_and_marks_partial() {
        // Tail stops after Total Net Adjusted Pay: 20 fields assembled.
        let line =
            "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00";
        let record = parse(line).into_record().unwrap();
        assert!(record.partial);
        assert_eq!(record.total_net_adjusted_pay, "$500.00");
        assert_eq!(record.special_needs, "");
        assert_eq!(record.previously_paid, "");
        assert_eq!(record.difference_paid, "");
    }

    #[test]
    fn rejects_tail_below_the_padding_floor() {
        // 19 assembled fields: one short of the padding floor.
        let line =
            "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00";
        assert!(!parse(line).is_matched());
    }

    #[test]
    fn truncates_overlong_tail_to_schema_width() {
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00 stray wrap";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.difference_paid, "$20.00");
        assert!(!record.partial);
    }

    #[test]
    fn rejects_three_word_names() {
        let line = "12345678 01 MARY JANE DOE W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        assert!(!parse(line).is_matched());
    }

    #[test]
    fn rejects_non_row_lines() {
        assert!(!parse("Provider 12-XYZ CareHome").is_matched());
        assert!(!parse("12345678 not a billing row").is_matched());
    }
}
