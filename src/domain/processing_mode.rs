//! Processing-mode value object, grounded on `original_source`'s
//! `domain/value_objects/processing_mode.py`. In a compiled target `fast`
//! simply means "max parallelism" and `slow` means "one worker" — the
//! knob survives, its language-specific rationale (bypassing a GIL) does
//! not (see spec §9 open question).

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    Fast,
    Slow,
}

impl ProcessingMode {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim().to_lowercase().as_str() {
            "fast" => Ok(ProcessingMode::Fast),
            "slow" => Ok(ProcessingMode::Slow),
            other => Err(format!(
                "processing_mode must be one of [\"fast\", \"slow\"], got {:?}",
                other
            )),
        }
    }

    pub fn is_fast(&self) -> bool {
        matches!(self, ProcessingMode::Fast)
    }

    pub fn is_slow(&self) -> bool {
        matches!(self, ProcessingMode::Slow)
    }
}

impl std::fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingMode::Fast => write!(f, "fast"),
            ProcessingMode::Slow => write!(f, "slow"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fast_and_slow() {
        assert_eq!(ProcessingMode::parse("fast").unwrap(), ProcessingMode::Fast);
        assert_eq!(ProcessingMode::parse("SLOW").unwrap(), ProcessingMode::Slow);
    }

    #[test]
    fn test_parse_invalid_mode_fails() {
        assert!(ProcessingMode::parse("turbo").is_err());
    }

    #[test]
    fn test_predicates() {
        assert!(ProcessingMode::Fast.is_fast());
        assert!(!ProcessingMode::Fast.is_slow());
        assert!(ProcessingMode::Slow.is_slow());
    }
}
