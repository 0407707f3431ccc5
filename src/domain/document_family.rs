//! CVM document family catalogue, grounded on `original_source`'s
//! `url_e_nomes.py` prefix tables and the `DOC/<FAM>/DADOS/...` URL pattern
//! documented in the distilled spec's external-interfaces section.

use crate::domain::year_range::YearFamily;
use crate::error::IngestError;

const CVM_BASE_URL: &str = "https://dados.cvm.gov.br/dados/CIA_ABERTA";

/// One CVM document family. Each carries the lowercase prefix used in its
/// archive filename; `CAD` is the single master registry CSV with no year
/// suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFamily {
    Cgvn,
    Fca,
    Ipe,
    Vlmo,
    Fre,
    Dfp,
    Itr,
    Cad,
}

impl DocumentFamily {
    pub const ALL: [DocumentFamily; 8] = [
        DocumentFamily::Cgvn,
        DocumentFamily::Fca,
        DocumentFamily::Ipe,
        DocumentFamily::Vlmo,
        DocumentFamily::Fre,
        DocumentFamily::Dfp,
        DocumentFamily::Itr,
        DocumentFamily::Cad,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            DocumentFamily::Cgvn => "CGVN",
            DocumentFamily::Fca => "FCA",
            DocumentFamily::Ipe => "IPE",
            DocumentFamily::Vlmo => "VLMO",
            DocumentFamily::Fre => "FRE",
            DocumentFamily::Dfp => "DFP",
            DocumentFamily::Itr => "ITR",
            DocumentFamily::Cad => "CAD",
        }
    }

    fn prefix_lower(&self) -> &'static str {
        match self {
            DocumentFamily::Cgvn => "cgvn",
            DocumentFamily::Fca => "fca",
            DocumentFamily::Ipe => "ipe",
            DocumentFamily::Vlmo => "vlmo",
            DocumentFamily::Fre => "fre",
            DocumentFamily::Dfp => "dfp",
            DocumentFamily::Itr => "itr",
            DocumentFamily::Cad => "cad",
        }
    }

    /// Minimum year this family's archives are available from.
    pub fn min_year_family(&self) -> YearFamily {
        match self {
            DocumentFamily::Itr => YearFamily::Itr,
            DocumentFamily::Cgvn | DocumentFamily::Vlmo => YearFamily::CgvnVlmo,
            _ => YearFamily::General,
        }
    }

    /// Parse a family code string (case-insensitive), e.g. from CLI args.
    pub fn parse(raw: &str) -> Result<Self, IngestError> {
        Self::ALL
            .into_iter()
            .find(|f| f.code().eq_ignore_ascii_case(raw))
            .ok_or_else(|| {
                IngestError::InvalidDocName(format!(
                    "{} (expected one of {:?})",
                    raw,
                    Self::ALL.map(|f| f.code())
                ))
            })
    }

    /// `true` for the CAD master registry, which is a single un-partitioned
    /// CSV rather than one ZIP per year.
    pub fn is_unpartitioned(&self) -> bool {
        matches!(self, DocumentFamily::Cad)
    }

    /// Build the download URL for this family and year. `year` is ignored
    /// for `CAD`, which has no year suffix.
    pub fn url_for(&self, year: i32) -> String {
        if self.is_unpartitioned() {
            format!("{}/CAD/DADOS/cad_cia_aberta.csv", CVM_BASE_URL)
        } else {
            format!(
                "{}/DOC/{}/DADOS/{}_cia_aberta_{}.zip",
                CVM_BASE_URL,
                self.code(),
                self.prefix_lower(),
                year
            )
        }
    }
}

impl std::fmt::Display for DocumentFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
