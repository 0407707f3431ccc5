//! Result aggregate for a quotes extraction run, grounded on the distilled
//! spec's §3 `ExtractionResult` data model.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub total_files: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub total_records: u64,
    pub output_file: Option<PathBuf>,
    pub errors: Vec<String>,
}

impl ExtractionResult {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            success_count: 0,
            error_count: 0,
            total_records: 0,
            output_file: None,
            errors: Vec::new(),
        }
    }

    pub fn record_success(&mut self, records: u64) {
        self.success_count += 1;
        self.total_records += records;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error_count += 1;
        self.errors.push(message.into());
    }

    pub fn success(&self) -> bool {
        self.error_count == 0 && self.success_count > 0
    }

    pub fn message(&self) -> String {
        if self.success() {
            format!(
                "extracted {} record(s) from {}/{} file(s) into {}",
                self.total_records,
                self.success_count,
                self.total_files,
                self.output_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<none>".to_string())
            )
        } else {
            format!(
                "{}/{} file(s) failed: {}",
                self.error_count,
                self.total_files,
                self.errors.join("; ")
            )
        }
    }
}
