use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// Category / Gender – the two halves of a cutoff key
// ---------------------------------------------------------------------------

/// Reservation category a cutoff rank is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Oc,
    Bca,
    Bcb,
    Bcc,
    Bcd,
    Bce,
    Sc,
    St,
    OcEws,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Oc,
        Category::Bca,
        Category::Bcb,
        Category::Bcc,
        Category::Bcd,
        Category::Bce,
        Category::Sc,
        Category::St,
        Category::OcEws,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Oc => "OC",
            Category::Bca => "BCA",
            Category::Bcb => "BCB",
            Category::Bcc => "BCC",
            Category::Bcd => "BCD",
            Category::Bce => "BCE",
            Category::Sc => "SC",
            Category::St => "ST",
            Category::OcEws => "OC_EWS",
        }
    }
}

impl FromStr for Category {
    type Err = ();

    /// Case-insensitive; `EWS` is accepted for `OC_EWS`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        if upper == "EWS" {
            return Ok(Category::OcEws);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == upper)
            .ok_or(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Gender {
    Boys,
    Girls,
}

impl Gender {
    pub const ALL: [Gender; 2] = [Gender::Boys, Gender::Girls];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Boys => "BOYS",
            Gender::Girls => "GIRLS",
        }
    }
}

impl FromStr for Gender {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BOYS" => Ok(Gender::Boys),
            "GIRLS" => Ok(Gender::Girls),
            _ => Err(()),
        }
    }
}

// ---------------------------------------------------------------------------
// CutoffKey – selects one cutoff column, e.g. `OC_BOYS`
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CutoffKey {
    pub category: Category,
    pub gender: Gender,
}

impl CutoffKey {
    /// Number of distinct (category, gender) combinations.
    pub const COUNT: usize = Category::ALL.len() * Gender::ALL.len();

    pub fn new(category: Category, gender: Gender) -> Self {
        Self { category, gender }
    }

    /// All keys in column order: `OC_BOYS, OC_GIRLS, BCA_BOYS, ...`.
    pub fn all() -> impl Iterator<Item = CutoffKey> {
        Category::ALL
            .into_iter()
            .flat_map(|c| Gender::ALL.into_iter().map(move |g| CutoffKey::new(c, g)))
    }

    fn slot(&self) -> usize {
        self.category as usize * Gender::ALL.len() + self.gender as usize
    }
}

impl fmt::Display for CutoffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category.as_str(), self.gender.as_str())
    }
}

impl FromStr for CutoffKey {
    type Err = ();

    /// Parses `CATEGORY_GENDER`; the gender is everything after the last `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, gender) = s.trim().rsplit_once('_').ok_or(())?;
        Ok(CutoffKey::new(category.parse()?, gender.parse()?))
    }
}

// ---------------------------------------------------------------------------
// Cutoffs – one optional closing rank per key
// ---------------------------------------------------------------------------

/// Closing ranks of one institution-branch row. `None` means no cutoff was
/// recorded for that key, which is distinct from a rank of zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cutoffs([Option<u32>; CutoffKey::COUNT]);

impl Cutoffs {
    pub fn get(&self, key: CutoffKey) -> Option<u32> {
        self.0[key.slot()]
    }

    pub fn set(&mut self, key: CutoffKey, rank: Option<u32>) {
        self.0[key.slot()] = rank;
    }
}

impl Serialize for Cutoffs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CutoffKey::COUNT))?;
        for key in CutoffKey::all() {
            map.serialize_entry(&key.to_string(), &self.get(key))?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// CutoffRecord – one row of the source sheet
// ---------------------------------------------------------------------------

/// One institution + branch row with its descriptive fields and closing ranks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CutoffRecord {
    #[serde(rename = "INSTCODE")]
    pub inst_code: Option<String>,
    #[serde(rename = "COLLEGE_NAME")]
    pub college_name: Option<String>,
    #[serde(rename = "PLACE")]
    pub place: Option<String>,
    #[serde(rename = "DIST")]
    pub district: Option<String>,
    #[serde(rename = "COED")]
    pub coed: Option<String>,
    #[serde(rename = "TYPE")]
    pub college_type: Option<String>,
    /// Year of establishment, kept as text.
    #[serde(rename = "INST_REG")]
    pub established: Option<String>,
    #[serde(rename = "BRANCH")]
    pub branch: Option<String>,
    #[serde(rename = "BRANCH_NAME")]
    pub branch_name: Option<String>,
    #[serde(flatten)]
    pub cutoffs: Cutoffs,
    #[serde(rename = "COLLFEE")]
    pub tuition_fee: Option<u32>,
    #[serde(rename = "AFFL")]
    pub affiliation: Option<String>,
}

impl CutoffRecord {
    pub fn cutoff(&self, key: CutoffKey) -> Option<u32> {
        self.cutoffs.get(key)
    }
}

// ---------------------------------------------------------------------------
// CutoffTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// All loaded rows plus the distinct values offered as filter choices.
/// Built once at startup and never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct CutoffTable {
    pub records: Vec<CutoffRecord>,
    pub branches: BTreeSet<String>,
    pub districts: BTreeSet<String>,
    pub years: BTreeSet<String>,
}

impl CutoffTable {
    pub fn from_records(records: Vec<CutoffRecord>) -> Self {
        let mut branches = BTreeSet::new();
        let mut districts = BTreeSet::new();
        let mut years = BTreeSet::new();

        for rec in &records {
            branches.extend(rec.branch.clone());
            districts.extend(rec.district.clone());
            years.extend(rec.established.clone());
        }

        CutoffTable {
            records,
            branches,
            districts,
            years,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
