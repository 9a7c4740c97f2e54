use std::io::Read;
use std::path::Path;

use crate::error::{InsightError, InsightResult};
use crate::models::{Dataset, Record};

/// Columns every upload must carry, matched exactly and case-sensitively.
pub const REQUIRED_COLUMNS: [&str; 13] = [
    "Customer",
    "Region",
    "Q1",
    "Discount Q1",
    "Q2",
    "Discount Q2",
    "Q3",
    "Discount Q3",
    "Q4",
    "Discount Q4",
    "Total",
    "Interactions",
    "Total Contacts",
];

/// Names from [`REQUIRED_COLUMNS`] absent in `headers`, in schema order.
pub fn missing_columns(headers: &csv::StringRecord) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == **required))
        .map(|required| required.to_string())
        .collect()
}

/// Parse a whole CSV document into a [`Dataset`]. Any bad row fails the load.
pub fn load_dataset<R: Read>(reader: R) -> InsightResult<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Fields)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let missing = missing_columns(&headers);
    if !missing.is_empty() {
        return Err(InsightError::MissingColumns { missing });
    }

    let mut records = Vec::new();
    let mut raw = csv::StringRecord::new();
    loop {
        let line = reader.position().line();
        let more = reader
            .read_record(&mut raw)
            .map_err(|source| InsightError::Malformed { line, source })?;
        if !more {
            break;
        }

        let line = raw.position().map(|p| p.line()).unwrap_or(line);
        let record: Record = raw
            .deserialize(Some(&headers))
            .map_err(|source| InsightError::Malformed { line, source })?;

        if let Some((column, _)) = record
            .numeric_fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(InsightError::NonFinite { line, column });
        }
        records.push(record);
    }

    if records.is_empty() {
        return Err(InsightError::EmptyDataset);
    }

    Ok(Dataset::new(records))
}

pub fn load_dataset_file(path: &Path) -> InsightResult<Dataset> {
    let file = std::fs::File::open(path)?;
    load_dataset(file)
}
