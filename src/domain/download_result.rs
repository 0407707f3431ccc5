//! Result aggregate for a batch of download jobs, grounded on
//! `original_source`'s `domain/value_objects/download_result.py`.
//! Successes are deduplicated and insertion-ordered; failures are keyed by
//! job identifier so a retried job's final outcome replaces its earlier one.

use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    successes: Vec<(String, PathBuf)>,
    errors: BTreeMap<String, String>,
}

impl DownloadResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_success(&mut self, identifier: impl Into<String>, path: PathBuf) {
        let identifier = identifier.into();
        if !self.successes.iter().any(|(id, _)| id == &identifier) {
            self.successes.push((identifier.clone(), path));
        }
        self.errors.remove(&identifier);
    }

    pub fn add_error(&mut self, identifier: impl Into<String>, message: impl Into<String>) {
        let identifier = identifier.into();
        if !self.successes.iter().any(|(id, _)| id == &identifier) {
            self.errors.insert(identifier, message.into());
        }
    }

    pub fn successes(&self) -> &[(String, PathBuf)] {
        &self.successes
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_fully_successful(&self) -> bool {
        self.errors.is_empty() && !self.successes.is_empty()
    }

    pub fn merge(&mut self, other: DownloadResult) {
        for (id, path) in other.successes {
            self.add_success(id, path);
        }
        for (id, message) in other.errors {
            self.add_error(id, message);
        }
    }
}
