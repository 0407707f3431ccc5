//! Immutable year-range value object, grounded on
//! `original_source`'s `domain/value_objects/year_range.py` and the
//! per-family minimum-year table from the distilled spec's data model.

use crate::error::IngestError;
use chrono::Datelike;

/// Minimum year for which a document family's archives are published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearFamily {
    General,
    Itr,
    CgvnVlmo,
    Cotahist,
}

impl YearFamily {
    pub fn min_year(&self) -> i32 {
        match self {
            YearFamily::General => 2010,
            YearFamily::Itr => 2011,
            YearFamily::CgvnVlmo => 2018,
            YearFamily::Cotahist => 1986,
        }
    }
}

/// An immutable, inclusive `[initial, last]` range of years.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearRange {
    initial: i32,
    last: i32,
}

impl YearRange {
    /// Construct and validate a year range for the given family.
    ///
    /// Invariants: `initial <= last`, `last <= current_year`,
    /// `initial >= family.min_year()`.
    pub fn new(initial: i32, last: i32, family: YearFamily) -> Result<Self, IngestError> {
        let current_year = current_year();
        let min_year = family.min_year();

        if initial < min_year || initial > current_year {
            return Err(IngestError::InvalidFirstYear(format!(
                "must be between {} and {}, got {}",
                min_year, current_year, initial
            )));
        }

        if last > current_year || initial > last {
            return Err(IngestError::InvalidLastYear(format!(
                "must be between {} and {}, got {}",
                initial, current_year, last
            )));
        }

        Ok(Self { initial, last })
    }

    pub fn initial(&self) -> i32 {
        self.initial
    }

    pub fn last(&self) -> i32 {
        self.last
    }

    /// Inclusive iterator over every year in the range.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.initial..=self.last
    }

    pub fn contains(&self, year: i32) -> bool {
        self.initial <= year && year <= self.last
    }

    pub fn span(&self) -> i32 {
        self.last - self.initial + 1
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.initial, self.last)
    }
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}
