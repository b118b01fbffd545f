use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::{InMemoryRateTable, RateRangeDraft, RateRangeValidationError};
use crate::pricing::domain::Lender;

const IMPORT_ACTOR: &str = "csv-import";

#[derive(Debug, thiserror::Error)]
pub enum RateTableLoadError {
    #[error("failed to read rate table export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid rate table CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: unknown lender '{value}'")]
    UnknownLender { line: usize, value: String },
    #[error("line {line}: {source}")]
    Invalid {
        line: usize,
        #[source]
        source: RateRangeValidationError,
    },
}

pub fn load_rate_table_path<P: AsRef<Path>>(
    path: P,
) -> Result<InMemoryRateTable, RateTableLoadError> {
    let file = std::fs::File::open(path)?;
    load_rate_table_csv(file)
}

/// Parses a rate table export. Every row goes through the same validation as an
/// administrative save; the first bad row aborts the load.
pub fn load_rate_table_csv<R: Read>(reader: R) -> Result<InMemoryRateTable, RateTableLoadError> {
    let table = InMemoryRateTable::new();
    load_rows_into(&table, reader, IMPORT_ACTOR)?;
    Ok(table)
}

pub(super) fn load_rows_into<R: Read>(
    table: &InMemoryRateTable,
    reader: R,
    actor: &str,
) -> Result<(), RateTableLoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    for (index, record) in csv_reader.deserialize::<RateRow>().enumerate() {
        let row = record?;
        let line = index + 2;
        let lender = Lender::parse(&row.lender).ok_or_else(|| RateTableLoadError::UnknownLender {
            line,
            value: row.lender.clone(),
        })?;

        let draft = RateRangeDraft {
            lender,
            cibil_min: row.cibil_min,
            cibil_max: row.cibil_max,
            amount_min: row.amount_min,
            amount_max: row.amount_max,
            rate_salaried: row.rate_salaried,
            rate_non_salaried: row.rate_non_salaried,
            processing_fee: row.processing_fee,
            active: row.active.unwrap_or(true),
        };

        table
            .save(draft, actor)
            .map_err(|source| RateTableLoadError::Invalid { line, source })?;
    }

    Ok(())
}

#[derive(Debug, Deserialize)]
struct RateRow {
    lender: String,
    cibil_min: u16,
    cibil_max: u16,
    amount_min: f64,
    amount_max: f64,
    rate_salaried: f64,
    rate_non_salaried: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    processing_fee: Option<f64>,
    #[serde(default, deserialize_with = "parse_flag")]
    active: Option<bool>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn parse_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(|value| value.trim().to_ascii_lowercase()) {
        None => Ok(None),
        Some(value) => match value.as_str() {
            "" => Ok(None),
            "1" | "true" | "yes" | "y" => Ok(Some(true)),
            "0" | "false" | "no" | "n" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format_args!(
                "expected boolean flag, got '{other}'"
            ))),
        },
    }
}
