//! Value objects and result aggregates for the ingestion pipeline's data
//! model (spec §3). Each validating constructor fails closed and leaves no
//! partial state, per the anti-patterns called out in spec §9.

pub mod document_family;
pub mod download_job;
pub mod download_result;
pub mod extraction_result;
pub mod instrument_class;
pub mod output_filename;
pub mod processing_mode;
pub mod quote_record;
pub mod year_range;

pub use document_family::DocumentFamily;
pub use download_job::DownloadJob;
pub use download_result::DownloadResult;
pub use extraction_result::ExtractionResult;
pub use instrument_class::InstrumentClass;
pub use output_filename::OutputFilename;
pub use processing_mode::ProcessingMode;
pub use quote_record::QuoteRecord;
pub use year_range::{YearFamily, YearRange};
