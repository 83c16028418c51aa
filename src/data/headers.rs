use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::LoadError;

use super::model::{Category, CutoffKey, Gender};

// ---------------------------------------------------------------------------
// Field – internal column a source header maps onto
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    InstCode,
    CollegeName,
    Place,
    District,
    Coed,
    CollegeType,
    Established,
    Branch,
    BranchName,
    Affiliation,
    TuitionFee,
    Cutoff(CutoffKey),
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::InstCode => "INSTCODE",
            Field::CollegeName => "COLLEGE_NAME",
            Field::Place => "PLACE",
            Field::District => "DIST",
            Field::Coed => "COED",
            Field::CollegeType => "TYPE",
            Field::Established => "INST_REG",
            Field::Branch => "BRANCH",
            Field::BranchName => "BRANCH_NAME",
            Field::Affiliation => "AFFL",
            Field::TuitionFee => "COLLFEE",
            Field::Cutoff(key) => return write!(f, "{key}"),
        };
        f.write_str(name)
    }
}

impl FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let field = match s {
            "INSTCODE" => Field::InstCode,
            "COLLEGE_NAME" => Field::CollegeName,
            "PLACE" => Field::Place,
            "DIST" => Field::District,
            "COED" => Field::Coed,
            "TYPE" => Field::CollegeType,
            "INST_REG" => Field::Established,
            "BRANCH" => Field::Branch,
            "BRANCH_NAME" => Field::BranchName,
            "AFFL" => Field::Affiliation,
            "COLLFEE" => Field::TuitionFee,
            other => Field::Cutoff(other.parse()?),
        };
        Ok(field)
    }
}

// ---------------------------------------------------------------------------
// HeaderMap – source header text → Field
// ---------------------------------------------------------------------------

/// Header layout of the TG EAPCET last-rank sheets. Header text must match
/// exactly, embedded line breaks included.
const DEFAULT_HEADERS: &[(&str, Field)] = &[
    ("Inst\n Code", Field::InstCode),
    ("Institute Name", Field::CollegeName),
    ("Place", Field::Place),
    ("Dist \nCode", Field::District),
    ("Co Education", Field::Coed),
    ("College Type", Field::CollegeType),
    ("Year of Estab", Field::Established),
    ("Branch Code", Field::Branch),
    ("Branch Name", Field::BranchName),
    ("OC \nBOYS", cutoff(Category::Oc, Gender::Boys)),
    ("OC \nGIRLS", cutoff(Category::Oc, Gender::Girls)),
    ("BC_A \nBOYS", cutoff(Category::Bca, Gender::Boys)),
    ("BC_A \nGIRLS", cutoff(Category::Bca, Gender::Girls)),
    ("BC_B \nBOYS", cutoff(Category::Bcb, Gender::Boys)),
    ("BC_B \nGIRLS", cutoff(Category::Bcb, Gender::Girls)),
    ("BC_C \nBOYS", cutoff(Category::Bcc, Gender::Boys)),
    ("BC_C \nGIRLS", cutoff(Category::Bcc, Gender::Girls)),
    ("BC_D \nBOYS", cutoff(Category::Bcd, Gender::Boys)),
    ("BC_D \nGIRLS", cutoff(Category::Bcd, Gender::Girls)),
    ("BC_E \nBOYS", cutoff(Category::Bce, Gender::Boys)),
    ("BC_E \nGIRLS", cutoff(Category::Bce, Gender::Girls)),
    ("SC \nBOYS", cutoff(Category::Sc, Gender::Boys)),
    ("SC \nGIRLS", cutoff(Category::Sc, Gender::Girls)),
    ("ST \nBOYS", cutoff(Category::St, Gender::Boys)),
    ("ST \nGIRLS", cutoff(Category::St, Gender::Girls)),
    ("EWS \nGEN OU", cutoff(Category::OcEws, Gender::Boys)),
    ("EWS \nGIRLS OU", cutoff(Category::OcEws, Gender::Girls)),
    ("Tuition Fee", Field::TuitionFee),
    ("Affiliated To", Field::Affiliation),
];

const fn cutoff(category: Category, gender: Gender) -> Field {
    Field::Cutoff(CutoffKey { category, gender })
}

/// Declarative lookup table from source header text to internal field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Field)>,
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self {
            entries: DEFAULT_HEADERS
                .iter()
                .map(|(header, field)| (header.to_string(), *field))
                .collect(),
        }
    }
}

impl HeaderMap {
    pub fn new(entries: Vec<(String, Field)>) -> Self {
        Self { entries }
    }

    /// Read a JSON object of `"header text": "FIELD_NAME"` pairs.
    ///
    /// ```json
    /// { "Inst\n Code": "INSTCODE", "OC \nBOYS": "OC_BOYS" }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self, LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, LoadError> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(text).map_err(|e| LoadError::HeaderMap(e.to_string()))?;

        let entries = raw
            .into_iter()
            .map(|(header, name)| match name.parse::<Field>() {
                Ok(field) => Ok((header, field)),
                Err(()) => Err(LoadError::HeaderMap(format!(
                    "unknown field '{name}' for header {header:?}"
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(entries))
    }

    pub fn entries(&self) -> &[(String, Field)] {
        &self.entries
    }

    /// Pair each mapped field with its column index in `headers`.
    /// Mapped headers absent from the source are logged and skipped, so the
    /// field stays absent on every row.
    pub fn resolve(&self, headers: &[String]) -> Vec<(usize, Field)> {
        self.entries
            .iter()
            .filter_map(|(header, field)| {
                let idx = headers.iter().position(|h| h == header);
                if idx.is_none() {
                    log::warn!("Source has no column {header:?} (field {field})");
                }
                idx.map(|i| (i, *field))
            })
            .collect()
    }
}
