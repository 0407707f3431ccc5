//! B3 instrument-class → TPMERC code mapping, grounded on the distilled
//! spec's §3 data model and §4.7 filter rule. TPMERC codes come from B3's
//! published COTAHIST layout (`010` cash market, `020` forward, `030`/`070`
//! and `080` options, etc).

use crate::error::IngestError;
use std::collections::HashSet;

/// One instrument class a caller may request extraction for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentClass {
    Acoes,
    Etf,
    Opcoes,
    Termo,
    ExercicioOpcoes,
    Forward,
    Leilao,
}

impl InstrumentClass {
    pub const ALL: [InstrumentClass; 7] = [
        InstrumentClass::Acoes,
        InstrumentClass::Etf,
        InstrumentClass::Opcoes,
        InstrumentClass::Termo,
        InstrumentClass::ExercicioOpcoes,
        InstrumentClass::Forward,
        InstrumentClass::Leilao,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            InstrumentClass::Acoes => "ações",
            InstrumentClass::Etf => "etf",
            InstrumentClass::Opcoes => "opções",
            InstrumentClass::Termo => "termo",
            InstrumentClass::ExercicioOpcoes => "exercicio_opcoes",
            InstrumentClass::Forward => "forward",
            InstrumentClass::Leilao => "leilao",
        }
    }

    /// TPMERC codes this class maps to. `ações` and `etf` share code `010`;
    /// downstream BDI filtering (left to the caller) distinguishes them.
    pub fn tpmerc_codes(&self) -> &'static [&'static str] {
        match self {
            InstrumentClass::Acoes => &["010"],
            InstrumentClass::Etf => &["010"],
            InstrumentClass::Opcoes => &["070", "080"],
            InstrumentClass::Termo => &["030"],
            InstrumentClass::ExercicioOpcoes => &["012", "013"],
            InstrumentClass::Forward => &["020"],
            InstrumentClass::Leilao => &["050"],
        }
    }

    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|c| c.name() == normalized)
            .ok_or_else(|| {
                IngestError::InvalidAssetsName(format!(
                    "{} (expected one of {:?})",
                    raw,
                    Self::ALL.map(|c| c.name())
                ))
            })
    }

    /// Parse a non-empty list of class names into a flattened TPMERC filter
    /// set. Rejects an empty list and any single unrecognized name, with no
    /// side effects (pure parsing).
    pub fn parse_filter_set(names: &[impl AsRef<str>]) -> Result<HashSet<String>, IngestError> {
        if names.is_empty() {
            return Err(IngestError::EmptyAssetList);
        }

        let mut codes = HashSet::new();
        for raw in names {
            let class = Self::parse(raw.as_ref())?;
            codes.extend(class.tpmerc_codes().iter().map(|c| c.to_string()));
        }
        Ok(codes)
    }
}

impl std::fmt::Display for InstrumentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
