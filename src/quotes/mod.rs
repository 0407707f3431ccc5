//! COTAHIST quote extraction: fixed-width parsing (§4.7) and the
//! concurrent per-year aggregator (§4.8).

pub mod aggregator;
pub mod parser;

pub use aggregator::{extract_quotes, QuotesAggregatorConfig};
