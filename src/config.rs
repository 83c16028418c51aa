//! Command-line / environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::data::filter::RankWindow;
use crate::data::headers::HeaderMap;
use crate::data::loader::LoadOptions;
use crate::error::LoadError;

/// College predictor over historical admission cutoff ranks
#[derive(Parser, Debug, Clone)]
#[command(name = "cutoff-predictor")]
#[command(about = "Serves college/branch predictions from a last-rank spreadsheet")]
pub struct Config {
    /// Cutoff table (.xlsx, .xls, .ods, .csv or .parquet)
    #[arg(long, env = "CUTOFF_DATA", default_value = "ts.xlsx")]
    pub data: PathBuf,

    /// Worksheet name (defaults to the first sheet)
    #[arg(long, env = "CUTOFF_SHEET")]
    pub sheet: Option<String>,

    /// Title rows above the column-header row
    #[arg(long, env = "CUTOFF_TITLE_ROWS", default_value_t = 1)]
    pub title_rows: usize,

    /// JSON file mapping source header text to field names
    #[arg(long, env = "CUTOFF_HEADER_MAP")]
    pub header_map: Option<PathBuf>,

    /// Listen address
    #[arg(long, env = "CUTOFF_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// How many ranks better than the applicant a cutoff may be
    #[arg(long, env = "CUTOFF_WINDOW_BELOW", default_value_t = 10_000)]
    pub window_below: u32,

    /// How many ranks worse than the applicant a cutoff may be
    #[arg(long, env = "CUTOFF_WINDOW_ABOVE", default_value_t = 20_000)]
    pub window_above: u32,

    /// Disable the permissive CORS layer
    #[arg(long)]
    pub no_cors: bool,
}

impl Config {
    pub fn load_options(&self) -> Result<LoadOptions, LoadError> {
        let headers = match &self.header_map {
            Some(path) => HeaderMap::from_json_file(path)?,
            None => HeaderMap::default(),
        };
        Ok(LoadOptions {
            sheet: self.sheet.clone(),
            title_rows: self.title_rows,
            headers,
        })
    }

    pub fn window(&self) -> RankWindow {
        RankWindow {
            below: self.window_below,
            above: self.window_above,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::data::headers::Field;

    #[test]
    fn defaults_match_the_published_window() {
        let config = Config::try_parse_from(["cutoff-predictor"]).unwrap();
        assert_eq!(config.window(), RankWindow::default());
        assert_eq!(config.title_rows, 1);
        assert!(!config.no_cors);

        let opts = config.load_options().unwrap();
        assert_eq!(opts.headers, HeaderMap::default());
        assert_eq!(opts.sheet, None);
    }

    #[test]
    fn header_map_file_replaces_builtin_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "Code": "BRANCH" }}"#).unwrap();

        let path = file.path().to_str().unwrap();
        let config = Config::try_parse_from([
            "cutoff-predictor",
            "--header-map",
            path,
            "--title-rows",
            "0",
            "--window-below",
            "5000",
        ])
        .unwrap();

        let opts = config.load_options().unwrap();
        assert_eq!(opts.headers.entries(), &[("Code".to_string(), Field::Branch)]);
        assert_eq!(opts.title_rows, 0);
        assert_eq!(config.window().below, 5000);
        assert_eq!(config.window().above, 20_000);
    }
}
