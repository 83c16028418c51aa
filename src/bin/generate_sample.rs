//! Writes `sample_cutoffs.csv` (title row + headers, spreadsheet layout) and
//! `sample_cutoffs.parquet` (headers as column names) with synthetic
//! closing ranks, for running the server without the real sheet.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const TEXT_HEADERS: [&str; 9] = [
    "Inst\n Code",
    "Institute Name",
    "Place",
    "Dist \nCode",
    "Co Education",
    "College Type",
    "Year of Estab",
    "Branch Code",
    "Branch Name",
];

const RANK_HEADERS: [&str; 18] = [
    "OC \nBOYS",
    "OC \nGIRLS",
    "BC_A \nBOYS",
    "BC_A \nGIRLS",
    "BC_B \nBOYS",
    "BC_B \nGIRLS",
    "BC_C \nBOYS",
    "BC_C \nGIRLS",
    "BC_D \nBOYS",
    "BC_D \nGIRLS",
    "BC_E \nBOYS",
    "BC_E \nGIRLS",
    "SC \nBOYS",
    "SC \nGIRLS",
    "ST \nBOYS",
    "ST \nGIRLS",
    "EWS \nGEN OU",
    "EWS \nGIRLS OU",
];

/// Deterministic splitmix64 stream; the same seed always yields the same sheet.
struct SampleRng(u64);

impl SampleRng {
    fn below(&mut self, n: u64) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        (z ^ (z >> 31)) % n
    }
}

struct Row {
    text: [String; 9],
    ranks: [Option<i64>; 18],
    fee: i64,
    affiliation: String,
}

fn generate_rows(rng: &mut SampleRng) -> Vec<Row> {
    let colleges = [
        ("ABCD", "Alpha Institute of Technology", "Hyderabad", "HYD", "PVT", 1998),
        ("BETA", "Beta College of Engineering", "Medchal", "MDL", "PVT", 2001),
        ("CGEC", "Chaitanya Govt Engineering College", "Warangal", "WGL", "UNIV", 1980),
        ("DLTA", "Delta Engineering College", "Rangareddy", "RR", "PVT", 2008),
    ];
    let branches = [
        ("CSE", "Computer Science and Engineering", 1.0),
        ("ECE", "Electronics and Communication Engineering", 1.6),
        ("EEE", "Electrical and Electronics Engineering", 2.4),
        ("MEC", "Mechanical Engineering", 3.5),
    ];

    let mut rows = Vec::new();
    for (ci, (code, name, place, dist, kind, year)) in colleges.iter().enumerate() {
        let base = 4_000 + ci as i64 * 9_000;
        for (branch, branch_name, hardness) in &branches {
            let mut ranks = [None; 18];
            for (k, slot) in ranks.iter_mut().enumerate() {
                // Reserved categories close later; roughly one seat in eight is unfilled.
                if rng.below(8) == 0 {
                    continue;
                }
                let category_factor = 1.0 + (k / 2) as f64 * 0.6;
                let jitter = rng.below(3_000) as i64;
                *slot = Some((base as f64 * hardness * category_factor) as i64 + jitter);
            }
            rows.push(Row {
                text: [
                    code.to_string(),
                    name.to_string(),
                    place.to_string(),
                    dist.to_string(),
                    "COED".to_string(),
                    kind.to_string(),
                    year.to_string(),
                    branch.to_string(),
                    branch_name.to_string(),
                ],
                ranks,
                fee: 35_000 + rng.below(8) as i64 * 10_000,
                affiliation: if *kind == "UNIV" { "KU" } else { "JNTUH" }.to_string(),
            });
        }
    }
    rows
}

fn headers() -> Vec<&'static str> {
    TEXT_HEADERS
        .iter()
        .chain(RANK_HEADERS.iter())
        .copied()
        .chain(["Tuition Fee", "Affiliated To"])
        .collect()
}

fn write_csv(rows: &[Row], path: &str) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("creating {path}"))?;

    writer.write_record(["TG EAPCET Final Phase Last Ranks (synthetic sample)"])?;
    writer.write_record(headers())?;
    for row in rows {
        let mut record: Vec<String> = row.text.to_vec();
        record.extend(
            row.ranks
                .iter()
                .map(|r| r.map(|v| v.to_string()).unwrap_or_else(|| "NA".to_string())),
        );
        record.push(row.fee.to_string());
        record.push(row.affiliation.clone());
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_parquet(rows: &[Row], path: &str) -> Result<()> {
    let mut fields = Vec::new();
    let mut columns: Vec<ArrayRef> = Vec::new();

    for (i, header) in TEXT_HEADERS.iter().enumerate() {
        fields.push(Field::new(*header, DataType::Utf8, true));
        let values: Vec<&str> = rows.iter().map(|r| r.text[i].as_str()).collect();
        columns.push(Arc::new(StringArray::from(values)));
    }
    for (i, header) in RANK_HEADERS.iter().enumerate() {
        fields.push(Field::new(*header, DataType::Int64, true));
        let values: Vec<Option<i64>> = rows.iter().map(|r| r.ranks[i]).collect();
        columns.push(Arc::new(Int64Array::from(values)));
    }
    fields.push(Field::new("Tuition Fee", DataType::Int64, true));
    columns.push(Arc::new(Int64Array::from(
        rows.iter().map(|r| r.fee).collect::<Vec<_>>(),
    )));
    fields.push(Field::new("Affiliated To", DataType::Utf8, true));
    columns.push(Arc::new(StringArray::from(
        rows.iter().map(|r| r.affiliation.as_str()).collect::<Vec<_>>(),
    )));

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SampleRng(42);
    let rows = generate_rows(&mut rng);

    write_csv(&rows, "sample_cutoffs.csv")?;
    write_parquet(&rows, "sample_cutoffs.parquet")?;

    println!(
        "Wrote {} institution-branch rows to sample_cutoffs.csv and sample_cutoffs.parquet",
        rows.len()
    );
    Ok(())
}
