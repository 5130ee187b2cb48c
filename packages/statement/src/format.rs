//! Currency and numeric re-rendering for extracted columns.
//!
//! Statement pages print the same amount several ways (`$1,234.50`,
//! `1234.5`, `$500`), so the currency and numeric columns are re-rendered
//! to a canonical form before rows are deduplicated and exported. A value
//! that does not parse is left exactly as printed: preserving the
//! original text beats guessing.

use care_audit_statement_models::BillingRecord;

/// Parses a currency-ish string (`$` and thousands separators stripped)
/// into a decimal. Returns `None` when the remainder is not a number.
#[must_use]
pub fn parse_decimal(value: &str) -> Option<f64> {
    let cleaned = value.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse().ok()
}

/// Re-renders a currency value as `$` + thousands-grouped + exactly two
/// fraction digits. Unparseable input is returned unchanged.
///
/// Idempotent: `format_currency("$1,234.50")` is `"$1,234.50"`.
#[must_use]
pub fn format_currency(value: &str) -> String {
    parse_decimal(value).map_or_else(|| value.to_owned(), |n| format!("${}", group_thousands(n)))
}

/// Re-renders a plain numeric value with exactly two fraction digits.
/// Unlike [`format_currency`], no symbol stripping happens first; a
/// value carrying `$` or separators is not a plain number and stays
/// unchanged.
#[must_use]
pub fn format_number(value: &str) -> String {
    value
        .trim()
        .parse::<f64>()
        .map_or_else(|_| value.to_owned(), |n| format!("{n:.2}"))
}

/// Renders `n` with two fraction digits and comma thousands groups.
fn group_thousands(n: f64) -> String {
    let rendered = format!("{:.2}", n.abs());
    let (int_part, frac_part) = rendered.split_once('.').unwrap_or((rendered.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 3);
    if n.is_sign_negative() {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped.push('.');
    grouped.push_str(frac_part);
    grouped
}

/// Applies canonical rendering to the currency and numeric columns of a
/// record, leaving every unparseable value untouched.
pub fn normalize(record: &mut BillingRecord) {
    for value in [
        &mut record.rate,
        &mut record.subtotal,
        &mut record.gross_pay,
        &mut record.fee_due,
        &mut record.total_net_adjusted_pay,
        &mut record.previously_paid,
        &mut record.difference_paid,
    ] {
        *value = format_currency(value);
    }
    for value in [&mut record.quantity, &mut record.weekly_fee] {
        *value = format_number(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use care_audit_statement_models::COLUMN_COUNT;

    #[test]
    fn currency_adds_symbol_grouping_and_cents() {
        assert_eq!(format_currency("1234.5"), "$1,234.50");
        assert_eq!(format_currency("500"), "$500.00");
        assert_eq!(format_currency("1234567.8"), "$1,234,567.80");
    }

    #[test]
    fn currency_formatting_is_idempotent() {
        let once = format_currency("1234.5");
        assert_eq!(format_currency(&once), once);
        assert_eq!(format_currency("$1,234.50"), "$1,234.50");
    }

    #[test]
    fn currency_keeps_unparseable_values() {
        assert_eq!(format_currency("N/A"), "N/A");
        assert_eq!(format_currency(""), "");
        assert_eq!(format_currency("$"), "$");
    }

    #[test]
    fn currency_handles_negative_amounts() {
        assert_eq!(format_currency("-1234.5"), "$-1,234.50");
        assert_eq!(format_currency("$-12.00"), "$-12.00");
    }

    #[test]
    fn number_renders_two_fraction_digits() {
        assert_eq!(format_number("5"), "5.00");
        assert_eq!(format_number("115.375"), "115.38");
        assert_eq!(format_number("not a number"), "not a number");
        // Currency markup is not a plain number.
        assert_eq!(format_number("$5.00"), "$5.00");
    }

    #[test]
    fn normalize_touches_only_money_and_numeric_columns() {
        let mut fields: Vec<String> = (0..COLUMN_COUNT).map(|_| String::from("x")).collect();
        fields[4] = "5".into(); // Quantity
        fields[5] = "100".into(); // Rate
        fields[16] = "1234.5".into(); // Gross Pay
        fields[17] = "115.375".into(); // Weekly Fee
        let mut record = BillingRecord::from_fields(fields, false).unwrap();

        normalize(&mut record);

        assert_eq!(record.quantity, "5.00");
        assert_eq!(record.rate, "$100.00");
        assert_eq!(record.gross_pay, "$1,234.50");
        assert_eq!(record.weekly_fee, "115.38");
        // Text columns with unparseable content are untouched.
        assert_eq!(record.name, "x");
        assert_eq!(record.care_level, "x");
    }
}
