//! Decoded COTAHIST data row, grounded on the distilled spec's §3 data
//! model and §4.7 field layout. Prices are represented as `rust_decimal`
//! values with the two implicit decimals already applied — never routed
//! through a binary float, per the spec's numeric-semantics requirement.

use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct QuoteRecord {
    pub date: NaiveDate,
    pub bdi: String,
    pub ticker: String,
    pub tpmerc: String,
    pub short_name: String,
    pub specification: String,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub avg: Decimal,
    pub close: Decimal,
    pub best_buy: Decimal,
    pub best_sell: Decimal,
    pub trades: i64,
    pub quantity: i64,
    pub volume: Decimal,
    pub isin: String,
}

impl QuoteRecord {
    /// True when this record's TPMERC code is present in `filter`. An empty
    /// filter set passes everything through.
    pub fn matches_tpmerc(&self, filter: &std::collections::HashSet<String>) -> bool {
        filter.is_empty() || filter.contains(&self.tpmerc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample() -> QuoteRecord {
        QuoteRecord {
            date: NaiveDate::from_ymd_opt(2023, 1, 2).unwrap(),
            bdi: "02".to_string(),
            ticker: "PETR4".to_string(),
            tpmerc: "010".to_string(),
            short_name: "PETROBRAS".to_string(),
            specification: "PN".to_string(),
            open: dec!(35.00),
            high: dec!(35.50),
            low: dec!(34.80),
            avg: dec!(35.10),
            close: dec!(35.25),
            best_buy: dec!(35.20),
            best_sell: dec!(35.30),
            trades: 1200,
            quantity: 500_000,
            volume: dec!(17625000.00),
            isin: "BRPETRACNPR6".to_string(),
        }
    }

    #[test]
    fn test_close_uses_exact_decimal() {
        assert_eq!(sample().close, dec!(35.25));
    }

    #[test]
    fn test_matches_tpmerc_filters_by_code() {
        let record = sample();
        let mut filter = std::collections::HashSet::new();
        filter.insert("010".to_string());
        assert!(record.matches_tpmerc(&filter));

        let mut other = std::collections::HashSet::new();
        other.insert("070".to_string());
        assert!(!record.matches_tpmerc(&other));
    }

    #[test]
    fn test_empty_filter_passes_everything() {
        let record = sample();
        assert!(record.matches_tpmerc(&std::collections::HashSet::new()));
    }
}
