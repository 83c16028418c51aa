use serde::{Deserialize, Deserializer};

use crate::error::QueryError;

use super::model::{CutoffKey, CutoffRecord, CutoffTable};

// ---------------------------------------------------------------------------
// RankWindow – which cutoffs count as reachable for a rank
// ---------------------------------------------------------------------------

/// Inclusive band `[rank - below, rank + above]` around the applicant's rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankWindow {
    pub below: u32,
    pub above: u32,
}

impl Default for RankWindow {
    fn default() -> Self {
        Self {
            below: 10_000,
            above: 20_000,
        }
    }
}

impl RankWindow {
    pub fn contains(&self, rank: i64, cutoff: u32) -> bool {
        let cutoff = i64::from(cutoff);
        rank - i64::from(self.below) <= cutoff && cutoff <= rank + i64::from(self.above)
    }
}

// ---------------------------------------------------------------------------
// PredictRequest – the raw request body
// ---------------------------------------------------------------------------

/// Request as received. Every field is optional here; presence of the
/// required ones is checked by [`Query::from_request`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PredictRequest {
    #[serde(default, deserialize_with = "lenient_rank")]
    pub rank: Option<RankInput>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub district: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub branch: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub inst_reg: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

/// A supplied rank: a whole number, or the raw text of a value that is not one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankInput {
    Value(i64),
    Invalid(String),
}

impl From<i64> for RankInput {
    fn from(n: i64) -> Self {
        RankInput::Value(n)
    }
}

/// Number or numeric string. Absent, `null`, `""` and `0` read as not
/// supplied; any other non-integer is kept as [`RankInput::Invalid`].
fn lenient_rank<'de, D: Deserializer<'de>>(d: D) -> Result<Option<RankInput>, D::Error> {
    let rank = match Option::<Scalar>::deserialize(d)? {
        None => None,
        Some(Scalar::Int(n)) => Some(RankInput::Value(n)),
        Some(Scalar::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
            Some(RankInput::Value(f as i64))
        }
        Some(Scalar::Float(f)) => Some(RankInput::Invalid(f.to_string())),
        Some(Scalar::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                Some(
                    s.parse::<i64>()
                        .map_or_else(|_| RankInput::Invalid(s.to_string()), RankInput::Value),
                )
            }
        }
    };
    Ok(rank.filter(|r| *r != RankInput::Value(0)))
}

/// String or number, as trimmed text. Empty text reads as not supplied.
fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let text = match Option::<Scalar>::deserialize(d)? {
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(f)) if f.fract() == 0.0 && f.abs() < 1e15 => {
            Some((f as i64).to_string())
        }
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Text(s)) => Some(s.trim().to_string()),
        None => None,
    };
    Ok(text.filter(|s| !s.is_empty()))
}

// ---------------------------------------------------------------------------
// Query – a validated request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub rank: i64,
    /// `CATEGORY_GENDER`, upper-cased, echoed back to the caller.
    pub key: String,
    /// Resolved cutoff column; `None` when the key names no known column.
    pub cutoff: Option<CutoffKey>,
    pub branch: Option<String>,
    pub district: Option<String>,
    pub inst_reg: Option<String>,
}

impl Query {
    pub fn from_request(req: PredictRequest) -> Result<Self, QueryError> {
        let mut missing = Vec::new();
        if req.rank.is_none() {
            missing.push("rank");
        }
        if req.category.is_none() {
            missing.push("category");
        }
        if req.gender.is_none() {
            missing.push("gender");
        }

        let (Some(rank), Some(category), Some(gender)) = (req.rank, req.category, req.gender)
        else {
            return Err(QueryError::MissingInput(missing));
        };
        let rank = match rank {
            RankInput::Value(n) => n,
            RankInput::Invalid(raw) => return Err(QueryError::InvalidRank(raw)),
        };

        let key = format!("{}_{}", category.to_uppercase(), gender.to_uppercase());
        let cutoff = key.parse::<CutoffKey>().ok();

        Ok(Query {
            rank,
            key,
            cutoff,
            branch: req.branch,
            district: req.district,
            inst_reg: req.inst_reg,
        })
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<'a> {
    /// Matching rows, ascending by closing rank.
    pub results: Vec<&'a CutoffRecord>,
    pub key: String,
    pub known_key: bool,
}

/// Validate `req` and run it against `table`.
pub fn predict<'a>(
    table: &'a CutoffTable,
    req: PredictRequest,
    window: RankWindow,
) -> Result<QueryOutcome<'a>, QueryError> {
    let query = Query::from_request(req)?;
    Ok(run_query(table, &query, window))
}

/// Return rows whose cutoff at the query key lies inside `window` and that
/// pass every supplied filter, sorted ascending by that cutoff.
///
/// Filters, in order:
/// * branch   – case-insensitive match on the branch code
/// * district – case-insensitive match on the district code
/// * inst_reg – exact text match on the year of establishment
///
/// A row lacking the filtered field never matches a supplied filter.
pub fn run_query<'a>(table: &'a CutoffTable, query: &Query, window: RankWindow) -> QueryOutcome<'a> {
    log::debug!("Using cutoff key: {}", query.key);

    let Some(key) = query.cutoff else {
        log::warn!("Unrecognized cutoff key {:?}; no rows can match", query.key);
        return QueryOutcome {
            results: Vec::new(),
            key: query.key.clone(),
            known_key: false,
        };
    };

    let mut hits: Vec<&CutoffRecord> = table
        .records
        .iter()
        .filter(|rec| rec.cutoff(key).is_some_and(|c| window.contains(query.rank, c)))
        .collect();
    log::debug!("After rank filter: {}", hits.len());

    if let Some(branch) = &query.branch {
        hits.retain(|rec| eq_ignore_case(rec.branch.as_deref(), branch));
        log::debug!("After branch filter: {}", hits.len());
    }
    if let Some(district) = &query.district {
        hits.retain(|rec| eq_ignore_case(rec.district.as_deref(), district));
        log::debug!("After district filter: {}", hits.len());
    }
    if let Some(year) = &query.inst_reg {
        hits.retain(|rec| rec.established.as_deref() == Some(year.as_str()));
        log::debug!("After year filter: {}", hits.len());
    }

    // Stable: equal cutoffs keep table order. Absent sorts last.
    hits.sort_by_key(|rec| rec.cutoff(key).map_or(u64::MAX, u64::from));
    log::debug!("Final result count: {}", hits.len());

    QueryOutcome {
        results: hits,
        key: query.key.clone(),
        known_key: true,
    }
}

fn eq_ignore_case(field: Option<&str>, wanted: &str) -> bool {
    field.is_some_and(|v| v.to_uppercase() == wanted.to_uppercase())
}
