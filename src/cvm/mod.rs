//! CVM document-family download pipeline: URL table (`domain::DocumentFamily`)
//! plus the bounded-concurrency download scheduler (§4.4).

pub mod scheduler;

pub use scheduler::{download_cvm, download_cvm_with_config, CancellationSignal, SchedulerConfig};
