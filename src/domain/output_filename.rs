//! Validated output-filename newtype, grounded on `original_source`'s
//! `domain/value_objects/output_filename.py`. Kept distinct from the
//! general filename validator in `validators` (§4.9) because it governs
//! the single final consolidated output rather than per-member shards.

use crate::error::IngestError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFilename(String);

impl OutputFilename {
    pub fn new(raw: impl Into<String>) -> Result<Self, IngestError> {
        let value = raw.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(IngestError::InvalidDestinationPath(
                "output_name must be a non-empty string".to_string(),
            ));
        }

        if trimmed.contains('/') || trimmed.contains('\\') {
            return Err(IngestError::InvalidDestinationPath(
                "output_name must be a filename, not a path".to_string(),
            ));
        }

        if trimmed.len() > 255 {
            return Err(IngestError::InvalidDestinationPath(
                "output_name is too long (max 255 characters)".to_string(),
            ));
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(IngestError::InvalidDestinationPath(
                "output_name contains invalid characters; allowed: letters, numbers, \
                 underscore, dash and dot"
                    .to_string(),
            ));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OutputFilename {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
