use std::fs::File;
use std::path::Path;

use arrow::array::Array;
use arrow::util::display::array_value_to_string;
use calamine::{open_workbook_auto, Data, Reader};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::error::LoadError;

use super::headers::{Field, HeaderMap};
use super::model::{CutoffRecord, CutoffTable};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Worksheet to read; the first sheet when `None`. Ignored for CSV/Parquet.
    pub sheet: Option<String>,
    /// Rows above the header row (the sheet title). Ignored for Parquet.
    pub title_rows: usize,
    pub headers: HeaderMap,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            sheet: None,
            title_rows: 1,
            headers: HeaderMap::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load the cutoff table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet, title row then headers
/// * `.csv`     – same layout as the spreadsheet
/// * `.parquet` – column names are the headers, no title row
pub fn load_file(path: &Path, opts: &LoadOptions) -> Result<CutoffTable, LoadError> {
    log::debug!("Mapping {} source headers", opts.headers.entries().len());
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let sheet = match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => {
            RawSheet::from_grid(read_workbook(path, opts.sheet.as_deref())?, opts.title_rows)?
        }
        "csv" => RawSheet::from_grid(read_csv(path)?, opts.title_rows)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    let table = CutoffTable::from_records(build_records(&sheet, &opts.headers));
    log::info!("Loaded {} cutoff rows from {}", table.len(), path.display());
    Ok(table)
}

// ---------------------------------------------------------------------------
// RawSheet – header row plus data rows, every cell as trimmed text
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq)]
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl RawSheet {
    /// Skip `title_rows`, take the next row as headers and the rest as data.
    /// Blank rows are dropped.
    fn from_grid(grid: Vec<Vec<String>>, title_rows: usize) -> Result<Self, LoadError> {
        let mut rows = grid.into_iter().skip(title_rows);
        let headers = rows.next().ok_or(LoadError::MissingHeaderRow(title_rows))?;
        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();
        Ok(RawSheet { headers, rows })
    }
}

fn build_records(sheet: &RawSheet, headers: &HeaderMap) -> Vec<CutoffRecord> {
    let columns = headers.resolve(&sheet.headers);

    sheet
        .rows
        .iter()
        .map(|row| {
            let mut rec = CutoffRecord::default();
            for (idx, field) in &columns {
                let cell = row.get(*idx).map(String::as_str).unwrap_or("");
                apply_cell(&mut rec, *field, cell);
            }
            rec
        })
        .collect()
}

fn apply_cell(rec: &mut CutoffRecord, field: Field, cell: &str) {
    let text = (!cell.is_empty()).then(|| cell.to_string());
    match field {
        Field::InstCode => rec.inst_code = text,
        Field::CollegeName => rec.college_name = text,
        Field::Place => rec.place = text,
        Field::District => rec.district = text,
        Field::Coed => rec.coed = text,
        Field::CollegeType => rec.college_type = text,
        Field::Established => rec.established = text,
        Field::Branch => rec.branch = text,
        Field::BranchName => rec.branch_name = text,
        Field::Affiliation => rec.affiliation = text,
        Field::TuitionFee => rec.tuition_fee = parse_rank(cell),
        Field::Cutoff(key) => rec.cutoffs.set(key, parse_rank(cell)),
    }
}

/// Parse a rank or fee cell. Anything that is not a non-negative whole
/// number (empty, text, fractional, negative) is absent, never zero.
pub fn parse_rank(cell: &str) -> Option<u32> {
    let s = cell.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(n) = s.parse::<u32>() {
        return Some(n);
    }
    // Spreadsheet exports often render whole numbers as `15000.0`.
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
            Some(f as u32)
        }
        _ => None,
    }
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Spreadsheet reader
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path, sheet: Option<&str>) -> Result<Vec<Vec<String>>, LoadError> {
    std::fs::metadata(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut workbook = open_workbook_auto(path)?;

    let name = match sheet {
        Some(name) => {
            if !workbook.sheet_names().iter().any(|s| s == name) {
                return Err(LoadError::MissingSheet(name.to_string()));
            }
            name.to_string()
        }
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| LoadError::MissingSheet("<first sheet>".to_string()))?,
    };

    let range = workbook.worksheet_range(&name)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty | Data::Error(_) => String::new(),
        Data::Float(f) => float_text(*f),
        other => other.to_string().trim().to_string(),
    }
}

/// Whole floats render without the fractional part, so a year stored as
/// `1998.0` reads as `"1998"`.
fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// Rows may have ragged lengths; quoted headers may contain line breaks.
/// A cell that is not valid UTF-8 reads as empty.
fn read_csv(path: &Path) -> Result<Vec<Vec<String>>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(open(path)?);

    let mut grid = Vec::new();
    for (row_no, result) in reader.byte_records().enumerate() {
        let record = result?;
        let row = record
            .iter()
            .enumerate()
            .map(|(col, cell)| match std::str::from_utf8(cell) {
                Ok(text) => text.trim().to_string(),
                Err(_) => {
                    log::warn!("CSV row {row_no}, column {col}: invalid UTF-8, treated as empty");
                    String::new()
                }
            })
            .collect();
        grid.push(row);
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Column names are the headers. Each cell is rendered through Arrow's
/// display formatter; nulls become empty cells.
fn read_parquet(path: &Path) -> Result<RawSheet, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(open(path)?)?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            let mut cells = Vec::with_capacity(batch.num_columns());
            for col in batch.columns() {
                if col.is_null(row) {
                    cells.push(String::new());
                    continue;
                }
                let text = array_value_to_string(col, row)?;
                let text = if col.data_type().is_floating() {
                    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
                } else {
                    text
                };
                cells.push(text.trim().to_string());
            }
            rows.push(cells);
        }
    }

    Ok(RawSheet {
        headers,
        rows: rows
            .into_iter()
            .filter(|row: &Vec<String>| row.iter().any(|cell| !cell.is_empty()))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field as ArrowField, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;

    use super::*;
    use crate::data::model::{Category, CutoffKey, Gender};

    const OC_BOYS: CutoffKey = CutoffKey {
        category: Category::Oc,
        gender: Gender::Boys,
    };
    const OC_EWS_GIRLS: CutoffKey = CutoffKey {
        category: Category::OcEws,
        gender: Gender::Girls,
    };

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    const SAMPLE_CSV: &str = "\
TG EAPCET 2024 Final Phase Last Ranks,,,,,,
\"Inst\n Code\",Institute Name,\"Dist \nCode\",Branch Code,Year of Estab,\"OC \nBOYS\",\"EWS \nGIRLS OU\",Tuition Fee
ABCD,Alpha College,HYD, CSE ,1998,15000,N/A,35000
,,,,,,,
EFGH,Beta College,RR,ECE,2001.0,,4200.0,
IJKL,Gamma College,HYD,MEC
";

    #[test]
    fn parse_rank_distinguishes_absent_from_zero() {
        assert_eq!(parse_rank("15000"), Some(15000));
        assert_eq!(parse_rank(" 15000.0 "), Some(15000));
        assert_eq!(parse_rank("0"), Some(0));
        assert_eq!(parse_rank(""), None);
        assert_eq!(parse_rank("   "), None);
        assert_eq!(parse_rank("NA"), None);
        assert_eq!(parse_rank("-3"), None);
        assert_eq!(parse_rank("12.5"), None);
        assert_eq!(parse_rank("15000abc"), None);
    }

    #[test]
    fn loads_csv_skipping_title_and_blank_rows() {
        let file = write_temp(".csv", SAMPLE_CSV);
        let table = load_file(file.path(), &LoadOptions::default()).unwrap();

        assert_eq!(table.len(), 3);
        let alpha = &table.records[0];
        assert_eq!(alpha.inst_code.as_deref(), Some("ABCD"));
        assert_eq!(alpha.college_name.as_deref(), Some("Alpha College"));
        assert_eq!(alpha.branch.as_deref(), Some("CSE"));
        assert_eq!(alpha.established.as_deref(), Some("1998"));
        assert_eq!(alpha.cutoff(OC_BOYS), Some(15000));
        assert_eq!(alpha.cutoff(OC_EWS_GIRLS), None);
        assert_eq!(alpha.tuition_fee, Some(35000));
        // Not in the source at all.
        assert_eq!(alpha.place, None);

        let beta = &table.records[1];
        assert_eq!(beta.cutoff(OC_BOYS), None);
        assert_eq!(beta.cutoff(OC_EWS_GIRLS), Some(4200));
        assert_eq!(beta.tuition_fee, None);

        // Short row: trailing cells are absent.
        let gamma = &table.records[2];
        assert_eq!(gamma.branch.as_deref(), Some("MEC"));
        assert_eq!(gamma.established, None);
        assert_eq!(gamma.cutoff(OC_BOYS), None);

        assert_eq!(table.branches.iter().collect::<Vec<_>>(), ["CSE", "ECE", "MEC"]);
    }

    #[test]
    fn custom_header_map_and_no_title_row() {
        let file = write_temp(".csv", "code,oc\nCSE,100\n");
        let opts = LoadOptions {
            title_rows: 0,
            headers: HeaderMap::new(vec![
                ("code".into(), Field::Branch),
                ("oc".into(), Field::Cutoff(OC_BOYS)),
            ]),
            ..Default::default()
        };
        let table = load_file(file.path(), &opts).unwrap();
        assert_eq!(table.records[0].branch.as_deref(), Some("CSE"));
        assert_eq!(table.records[0].cutoff(OC_BOYS), Some(100));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = load_file(Path::new("/nonexistent/cutoffs.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));

        let err = load_file(Path::new("/nonexistent/cutoffs.xlsx"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let file = write_temp(".txt", "anything");
        let err = load_file(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "txt"));
    }

    #[test]
    fn title_only_file_has_no_header_row() {
        let file = write_temp(".csv", "Just a title\n");
        let err = load_file(file.path(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeaderRow(1)));
    }

    #[test]
    fn invalid_utf8_cell_is_absent_not_fatal() {
        let mut bytes = b"Title\nBranch Code,\"OC \nBOYS\",Institute Name\nCSE,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe]);
        bytes.extend_from_slice(b",Alpha\nECE,20000,\xc3\x28\n");

        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(&bytes).unwrap();

        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].branch.as_deref(), Some("CSE"));
        assert_eq!(table.records[0].cutoff(OC_BOYS), None);
        assert_eq!(table.records[0].college_name.as_deref(), Some("Alpha"));
        assert_eq!(table.records[1].cutoff(OC_BOYS), Some(20000));
        assert_eq!(table.records[1].college_name, None);
    }

    fn write_workbook(path: &Path) {
        let mut workbook = Workbook::new();

        let ranks = workbook.add_worksheet();
        ranks.set_name("Ranks").unwrap();
        ranks.write_string(0, 0, "TG EAPCET 2024 Final Phase Last Ranks").unwrap();
        ranks.write_string(1, 0, "Inst\n Code").unwrap();
        ranks.write_string(1, 1, "Branch Code").unwrap();
        ranks.write_string(1, 2, "Year of Estab").unwrap();
        ranks.write_string(1, 3, "OC \nBOYS").unwrap();
        ranks.write_string(2, 0, "ABCD").unwrap();
        ranks.write_string(2, 1, "CSE").unwrap();
        ranks.write_number(2, 2, 1998.0).unwrap();
        ranks.write_number(2, 3, 15000.0).unwrap();
        ranks.write_string(3, 0, "EFGH").unwrap();
        ranks.write_string(3, 1, "ECE").unwrap();
        ranks.write_string(3, 3, "NA").unwrap();

        let other = workbook.add_worksheet();
        other.set_name("Phase1").unwrap();
        other.write_string(0, 0, "Phase 1").unwrap();
        other.write_string(1, 0, "Branch Code").unwrap();
        other.write_string(2, 0, "MEC").unwrap();

        workbook.save(path).unwrap();
    }

    #[test]
    fn loads_first_worksheet_of_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ts.xlsx");
        write_workbook(&path);

        let table = load_file(&path, &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 2);

        let first = &table.records[0];
        assert_eq!(first.inst_code.as_deref(), Some("ABCD"));
        assert_eq!(first.branch.as_deref(), Some("CSE"));
        assert_eq!(first.established.as_deref(), Some("1998"));
        assert_eq!(first.cutoff(OC_BOYS), Some(15000));

        let second = &table.records[1];
        assert_eq!(second.branch.as_deref(), Some("ECE"));
        assert_eq!(second.established, None);
        assert_eq!(second.cutoff(OC_BOYS), None);
    }

    #[test]
    fn named_worksheet_is_selected_or_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ts.xlsx");
        write_workbook(&path);

        let opts = LoadOptions {
            sheet: Some("Phase1".into()),
            ..Default::default()
        };
        let table = load_file(&path, &opts).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records[0].branch.as_deref(), Some("MEC"));
        assert_eq!(table.records[0].cutoff(OC_BOYS), None);

        let opts = LoadOptions {
            sheet: Some("Nope".into()),
            ..Default::default()
        };
        let err = load_file(&path, &opts).unwrap_err();
        assert!(matches!(err, LoadError::MissingSheet(name) if name == "Nope"));
    }

    #[test]
    fn workbook_cells_render_as_text() {
        assert_eq!(cell_text(&Data::Float(1998.0)), "1998");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::Int(42)), "42");
        assert_eq!(cell_text(&Data::String("  CSE ".into())), "CSE");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn loads_parquet_with_column_names_as_headers() {
        let schema = Arc::new(Schema::new(vec![
            ArrowField::new("Branch Code", DataType::Utf8, true),
            ArrowField::new("Year of Estab", DataType::Float64, true),
            ArrowField::new("OC \nBOYS", DataType::Int64, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec![Some("CSE"), Some("ECE")])),
                Arc::new(Float64Array::from(vec![Some(1998.0), None])),
                Arc::new(Int64Array::from(vec![Some(15000), None])),
            ],
        )
        .unwrap();

        let file = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.as_file().try_clone().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(file.path(), &LoadOptions::default()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].established.as_deref(), Some("1998"));
        assert_eq!(table.records[0].cutoff(OC_BOYS), Some(15000));
        assert_eq!(table.records[1].branch.as_deref(), Some("ECE"));
        assert_eq!(table.records[1].established, None);
        assert_eq!(table.records[1].cutoff(OC_BOYS), None);
    }
}
