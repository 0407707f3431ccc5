//! Fixed-width COTAHIST record parser, grounded on the teacher's
//! `parse_cotahist_line` in `importers/b3_cotahist.rs` and the exact byte
//! offsets in the distilled spec's §4.7 field layout table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashSet;

use crate::domain::QuoteRecord;

const RECORD_LEN: usize = 245;

/// Parse one 245-byte COTAHIST line. Returns `None` for header (`"00"`)
/// and trailer (`"99"`) records, or a data row (`"01"`) whose `tpmerc`
/// code is absent from `accepted_tpmerc` (an empty filter accepts
/// everything).
///
/// Field offsets are positions in the *original byte stream*, not UTF-8
/// byte offsets of `line`: the Latin-1 decode upstream maps each source
/// byte to one `char` 1:1, but codepoints 0x80-0xFF take two bytes once
/// re-encoded as UTF-8 inside a Rust `String`. Slicing `line` by byte
/// index would misalign every field after the first accented byte (or
/// panic on a split codepoint), so this indexes through a `Vec<char>`
/// instead, where each element corresponds to exactly one original byte.
pub fn parse_line(line: &str, accepted_tpmerc: &HashSet<String>) -> Option<QuoteRecord> {
    let chars: Vec<char> = line.chars().collect();
    if chars.len() < RECORD_LEN {
        return None;
    }

    let record_type: String = chars[0..2].iter().collect();
    if record_type != "01" {
        return None;
    }

    let tpmerc = trimmed(&chars, 24, 27);
    if !accepted_tpmerc.is_empty() && !accepted_tpmerc.contains(&tpmerc) {
        return None;
    }

    let date_raw: String = chars[2..10].iter().collect();
    let date = NaiveDate::parse_from_str(&date_raw, "%Y%m%d").ok()?;

    Some(QuoteRecord {
        date,
        bdi: chars[10..12].iter().collect(),
        ticker: trimmed(&chars, 12, 24),
        tpmerc,
        short_name: trimmed(&chars, 27, 39),
        specification: trimmed(&chars, 39, 49),
        open: decimal_field(&chars, 56, 69),
        high: decimal_field(&chars, 69, 82),
        low: decimal_field(&chars, 82, 95),
        avg: decimal_field(&chars, 95, 108),
        close: decimal_field(&chars, 108, 121),
        best_buy: decimal_field(&chars, 121, 134),
        best_sell: decimal_field(&chars, 134, 147),
        trades: int_field(&chars, 147, 152),
        quantity: int_field(&chars, 152, 170),
        volume: decimal_field(&chars, 170, 188),
        isin: trimmed(&chars, 230, chars.len().min(242)),
    })
}

fn field(chars: &[char], start: usize, end: usize) -> String {
    chars.get(start..end).unwrap_or(&[]).iter().collect()
}

fn trimmed(chars: &[char], start: usize, end: usize) -> String {
    field(chars, start, end).trim().to_string()
}

fn int_field(chars: &[char], start: usize, end: usize) -> i64 {
    field(chars, start, end).trim().parse().unwrap_or(0)
}

/// Decode a fixed-width integer field with two implicit fraction digits
/// as an exact `Decimal`, never routing through a binary float. Blank or
/// whitespace-only fields decode to zero.
fn decimal_field(chars: &[char], start: usize, end: usize) -> Decimal {
    let raw = field(chars, start, end);
    let raw = raw.trim();
    if raw.is_empty() {
        return Decimal::ZERO;
    }
    raw.parse::<i64>()
        .map(|cents| Decimal::new(cents, 2))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pad(field: &str, width: usize) -> String {
        format!("{:width$}", field, width = width)
    }

    fn build_line(record_type: &str, tpmerc: &str, close_cents: i64) -> String {
        let mut line = String::new();
        line.push_str(record_type); // 0..2
        line.push_str("20230102"); // 2..10 date
        line.push_str("02"); // 10..12 bdi
        line.push_str(&pad("PETR4", 12)); // 12..24 ticker
        line.push_str(tpmerc); // 24..27 tpmerc
        line.push_str(&pad("PETROBRAS", 12)); // 27..39 short_name
        line.push_str(&pad("PN", 10)); // 39..49 specification
        line.push_str(&" ".repeat(7)); // 49..56 filler
        line.push_str(&format!("{:013}", 350000)); // 56..69 open
        line.push_str(&format!("{:013}", 355000)); // 69..82 high
        line.push_str(&format!("{:013}", 348000)); // 82..95 low
        line.push_str(&format!("{:013}", 351000)); // 95..108 avg
        line.push_str(&format!("{:013}", close_cents)); // 108..121 close
        line.push_str(&format!("{:013}", 352000)); // 121..134 best_buy
        line.push_str(&format!("{:013}", 353000)); // 134..147 best_sell
        line.push_str(&format!("{:05}", 1200)); // 147..152 trades
        line.push_str(&format!("{:018}", 500000)); // 152..170 quantity
        line.push_str(&format!("{:018}", 1762500000i64)); // 170..188 volume
        line.push_str(&" ".repeat(42)); // 188..230 filler
        line.push_str(&pad("BRPETRACNPR6", 12)); // 230..242 isin
        line.push_str(&" ".repeat(3)); // 242..245 filler
        line
    }

    #[test]
    fn test_header_and_trailer_are_skipped() {
        let filter = HashSet::new();
        assert!(parse_line(&build_line("00", "010", 3525), &filter).is_none());
        assert!(parse_line(&build_line("99", "010", 3525), &filter).is_none());
    }

    #[test]
    fn test_data_row_decodes_close_exactly() {
        let filter = HashSet::new();
        let record = parse_line(&build_line("01", "010", 3525), &filter).unwrap();
        assert_eq!(record.close, dec!(35.25));
        assert_eq!(record.ticker, "PETR4");
        assert_eq!(record.tpmerc, "010");
    }

    #[test]
    fn test_tpmerc_filter_drops_unaccepted_rows() {
        let mut filter = HashSet::new();
        filter.insert("010".to_string());
        assert!(parse_line(&build_line("01", "070", 3525), &filter).is_none());
        assert!(parse_line(&build_line("01", "010", 3525), &filter).is_some());
    }

    #[test]
    fn test_empty_filter_accepts_everything() {
        let filter = HashSet::new();
        assert!(parse_line(&build_line("01", "080", 3525), &filter).is_some());
    }

    #[test]
    fn test_accented_short_name_does_not_shift_later_fields() {
        // short_name holds a Latin-1 byte in the 0x80-0xFF range (decoded
        // to one char, as the zip streamer's Latin-1 decode would produce);
        // this re-encodes to two UTF-8 bytes, so byte-offset slicing would
        // misread or panic on every field after it. Char-offset slicing
        // must still land on the right columns.
        let filter = HashSet::new();
        let mut line = build_line("01", "010", 3525);
        let mut chars: Vec<char> = line.chars().collect();
        chars[27] = 'ç'; // first byte of short_name, field [27, 39)
        line = chars.into_iter().collect();

        let record = parse_line(&line, &filter).unwrap();
        assert_eq!(record.close, dec!(35.25));
        assert_eq!(record.isin, "BRPETRACNPR6");
    }

    #[test]
    fn test_short_line_is_rejected() {
        let filter = HashSet::new();
        assert!(parse_line("01202301", &filter).is_none());
    }
}
