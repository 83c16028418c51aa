use serde::Serialize;

use crate::data::filter::{predict, PredictRequest, QueryOutcome, RankWindow};
use crate::data::model::{CutoffKey, CutoffTable};
use crate::error::QueryError;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Process-wide state shared by every request. Read-only after startup.
#[derive(Debug)]
pub struct AppState {
    pub table: CutoffTable,
    pub window: RankWindow,
}

/// Choices a client can offer for the optional filters and the key.
#[derive(Debug, Serialize)]
pub struct FilterOptions<'a> {
    pub branches: Vec<&'a str>,
    pub districts: Vec<&'a str>,
    pub years: Vec<&'a str>,
    pub keys: Vec<String>,
}

impl AppState {
    pub fn new(table: CutoffTable, window: RankWindow) -> Self {
        Self { table, window }
    }

    pub fn predict(&self, req: PredictRequest) -> Result<QueryOutcome<'_>, QueryError> {
        predict(&self.table, req, self.window)
    }

    pub fn filter_options(&self) -> FilterOptions<'_> {
        FilterOptions {
            branches: self.table.branches.iter().map(String::as_str).collect(),
            districts: self.table.districts.iter().map(String::as_str).collect(),
            years: self.table.years.iter().map(String::as_str).collect(),
            keys: CutoffKey::all().map(|k| k.to_string()).collect(),
        }
    }
}
