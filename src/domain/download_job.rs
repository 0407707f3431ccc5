//! Download job descriptor, grounded on the distilled spec's §3 data
//! model. A job is independent and identified by `(family, year)` (or just
//! `family` for the un-partitioned CAD registry).

use crate::domain::document_family::DocumentFamily;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub family: DocumentFamily,
    pub year: Option<i32>,
    pub url: String,
    pub destination: PathBuf,
}

impl DownloadJob {
    pub fn new(family: DocumentFamily, year: Option<i32>, destination_dir: &std::path::Path) -> Self {
        let url = match year {
            Some(y) if !family.is_unpartitioned() => family.url_for(y),
            _ => family.url_for(0),
        };

        let file_name = url
            .rsplit('/')
            .next()
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("{}.zip", family.code().to_lowercase()));

        Self {
            family,
            year,
            url,
            destination: destination_dir.join(file_name),
        }
    }

    /// Stable identifier used for result-aggregate deduplication, e.g.
    /// `"DFP-2023"` or `"CAD"`.
    pub fn identifier(&self) -> String {
        match self.year {
            Some(y) => format!("{}-{}", self.family.code(), y),
            None => self.family.code().to_string(),
        }
    }
}
