//! Strict positional tokenizer for statement rows.
//!
//! Splits a line on whitespace and validates tokens positionally against
//! the fixed schema. Strict counts avoid false positives on lines that
//! merely start with digits (page numbers, dates): correctness over
//! recall; anything this parser cannot place exactly is left for the
//! fallback matcher.

use std::str::FromStr as _;
use std::sync::LazyLock;

use care_audit_statement_models::{BillingRecord, COLUMN_COUNT, RateType};
use regex::Regex;

use crate::{LineParser, ParseResult};

/// Minimum whitespace tokens for a line to be considered at all.
const MIN_TOKENS: usize = 20;

/// Columns consumed verbatim after Quantity (Rate through Difference
/// Paid).
const TRAILING_COLUMNS: usize = COLUMN_COUNT - 5;

/// Two `$`-amounts concatenated with no separating space, column bleed
/// from the source rendering.
static GLUED_CURRENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\$\d+(?:,\d{3})*(?:\.\d{2})?)(\$\d+(?:,\d{3})*(?:\.\d{2})?)")
        .unwrap_or_else(|_| unreachable!())
});

static CLIENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{8}$").unwrap_or_else(|_| unreachable!()));

static SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}$").unwrap_or_else(|_| unreachable!()));

static ALPHABETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]+$").unwrap_or_else(|_| unreachable!()));

static QUANTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d{2}$").unwrap_or_else(|_| unreachable!()));

/// Inserts a single space between directly adjacent `$`-amounts so they
/// tokenize as separate columns.
#[must_use]
pub fn split_glued_currency(line: &str) -> String {
    GLUED_CURRENCY.replace_all(line, "${1} ${2}").into_owned()
}

/// Whitespace tokenizer with positional type validation.
pub struct StrictTokenizer;

impl LineParser for StrictTokenizer {
    fn parse_line(&self, line: &str) -> ParseResult {
        let normalized = split_glued_currency(line);
        let tokens: Vec<&str> = normalized.split_whitespace().collect();
        if tokens.len() < MIN_TOKENS {
            return ParseResult::Unmatched;
        }

        if !CLIENT.is_match(tokens[0]) || !SUFFIX.is_match(tokens[1]) {
            return ParseResult::Unmatched;
        }
        let mut fields: Vec<String> = Vec::with_capacity(COLUMN_COUNT);
        fields.push(tokens[0].to_owned());
        fields.push(tokens[1].to_owned());

        // Name: one or more consecutive alphabetic tokens, greedy.
        let mut i = 2;
        let name_start = i;
        while i < tokens.len() && ALPHABETIC.is_match(tokens[i]) {
            i += 1;
        }
        if i == name_start {
            return ParseResult::Unmatched;
        }
        fields.push(tokens[name_start..i].join(" "));

        match tokens.get(i) {
            Some(token) if RateType::from_str(token).is_ok() => {
                fields.push((*token).to_owned());
                i += 1;
            }
            _ => return ParseResult::Unmatched,
        }

        match tokens.get(i) {
            Some(token) if QUANTITY.is_match(token) => {
                fields.push((*token).to_owned());
                i += 1;
            }
            _ => return ParseResult::Unmatched,
        }

        // The remaining columns are taken verbatim; a line without all of
        // them is not a billing row.
        let trailing = &tokens[i..];
        if trailing.len() < TRAILING_COLUMNS {
            return ParseResult::Unmatched;
        }
        for token in &trailing[..TRAILING_COLUMNS] {
            fields.push((*token).to_owned());
        }

        BillingRecord::from_fields(fields, false)
            .map_or(ParseResult::Unmatched, ParseResult::Matched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> ParseResult {
        StrictTokenizer.parse_line(line)
    }

    #[test]
    fn parses_well_formed_row() {
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.client, "12345678");
        assert_eq!(record.suffix, "01");
        assert_eq!(record.name, "JOHN SMITH");
        assert_eq!(record.rate_type, "W");
        assert_eq!(record.quantity, "5.00");
        assert_eq!(record.rate, "$100.00");
        assert_eq!(record.difference_paid, "$20.00");
        assert_eq!(record.fields().len(), 23);
    }

    #[test]
    fn splits_glued_currency_before_tokenizing() {
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00$500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.rate, "$100.00");
        assert_eq!(record.subtotal, "$500.00");
    }

    #[test]
    fn glued_normalization_handles_thousands_groups() {
        assert_eq!(
            split_glued_currency("$1,200.00$980.50"),
            "$1,200.00 $980.50"
        );
        // Already separated amounts are left alone.
        assert_eq!(split_glued_currency("$1.00 $2.00"), "$1.00 $2.00");
    }

    #[test]
    fn greedy_name_consumes_three_words() {
        let line = "12345678 01 MARY JANE DOE D 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        let record = parse(line).into_record().unwrap();
        assert_eq!(record.name, "MARY JANE DOE");
        assert_eq!(record.rate_type, "D");
    }

    #[test]
    fn rejects_fewer_than_twenty_tokens() {
        assert!(!parse("12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01").is_matched());
    }

    #[test]
    fn rejects_bad_client_or_suffix() {
        let bad_client = "1234567 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        assert!(!parse(bad_client).is_matched());
        let bad_suffix = "12345678 1X JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        assert!(!parse(bad_suffix).is_matched());
    }

    #[test]
    fn rejects_missing_name() {
        let line = "12345678 01 9 W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00 extra pad";
        assert!(!parse(line).is_matched());
    }

    #[test]
    fn rejects_invalid_rate_type_or_quantity() {
        let bad_rate = "12345678 01 JOHN SMITH X 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        assert!(!parse(bad_rate).is_matched());
        let bad_quantity = "12345678 01 JOHN SMITH W 5.0 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00 $500.00 N $480.00 $20.00";
        assert!(!parse(bad_quantity).is_matched());
    }

    #[test]
    fn rejects_truncated_trailing_columns() {
        // 20 tokens, but only 14 after Quantity.
        let line = "12345678 01 JOHN SMITH W 5.00 $100.00 $500.00 A 01/01 20 2 4 0 1 22 0 $500.00 115.38 $0.00";
        assert!(!parse(line).is_matched());
    }
}
