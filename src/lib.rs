//! Concurrent download/extract/aggregate pipeline for Brazilian CVM
//! fundamental-statement archives and B3 COTAHIST historical-quote
//! archives.
//!
//! The core is the shared engine: a resource-aware governor, a retry
//! policy, an HTTP adapter, a bounded-concurrency download scheduler, a
//! streaming ZIP reader, an atomic CSV-to-columnar transcoder, a
//! fixed-width quote parser and a quotes aggregator. The library never
//! reads the environment or initializes logging implicitly; a
//! presentation surface collaborator owns both.

pub mod columnar;
pub mod config;
pub mod cvm;
pub mod domain;
pub mod error;
pub mod governor;
pub mod http_adapter;
pub mod quotes;
pub mod retry;
pub mod transcoder;
pub mod validators;
pub mod zip_stream;

pub use cvm::download_cvm;
pub use error::Result;
pub use quotes::extract_quotes;
