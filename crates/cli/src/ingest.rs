//! CSV ingestion into `(basket, item)` rows.
//!
//! Two layouts are understood: a plain pair table, and the service-order export
//! (`UserId, ServiceId, CategoryId, CreateDate`) where an item is the
//! `ServiceId_CategoryId` variant and a basket is one user's purchases in one month.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use affinity_core::{ApplicationError, RawRow};
use chrono::{NaiveDate, NaiveDateTime};
use clap::ValueEnum;
use csv::StringRecord;
use tracing::info;

pub const DEFAULT_BASKET_COLUMN: &str = "basket_id";
pub const DEFAULT_ITEM_COLUMN: &str = "item";

const USER_COLUMN: &str = "UserId";
const SERVICE_COLUMN: &str = "ServiceId";
const CATEGORY_COLUMN: &str = "CategoryId";
const DATE_COLUMN: &str = "CreateDate";

const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum InputFormat {
    /// One row per (basket, item) observation
    #[default]
    Pairs,
    /// Service order export bucketed into monthly baskets per user
    Services,
}

#[derive(Clone, Debug)]
pub struct IngestOptions {
    pub format: InputFormat,
    pub basket_column: String,
    pub item_column: String,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            format: InputFormat::Pairs,
            basket_column: DEFAULT_BASKET_COLUMN.to_string(),
            item_column: DEFAULT_ITEM_COLUMN.to_string(),
        }
    }
}

pub fn read_rows(path: &Path, options: &IngestOptions) -> Result<Vec<RawRow>, ApplicationError> {
    let file = File::open(path).map_err(|error| {
        ApplicationError::Input(format!("could not open `{}`: {error}", path.display()))
    })?;
    let rows = rows_from_reader(file, options)?;
    info!(
        event_name = "ingest.completed",
        path = %path.display(),
        format = ?options.format,
        rows = rows.len(),
        "input rows loaded"
    );
    Ok(rows)
}

pub fn rows_from_reader<R: Read>(
    reader: R,
    options: &IngestOptions,
) -> Result<Vec<RawRow>, ApplicationError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = reader.headers().map_err(csv_error)?.clone();

    match options.format {
        InputFormat::Pairs => {
            let basket = column_index(&headers, &options.basket_column)?;
            let item = column_index(&headers, &options.item_column)?;
            let mut rows = Vec::new();
            for record in reader.records() {
                let record = record.map_err(csv_error)?;
                rows.push(RawRow { basket_id: field(&record, basket), item: field(&record, item) });
            }
            Ok(rows)
        }
        InputFormat::Services => {
            let user = column_index(&headers, USER_COLUMN)?;
            let service = column_index(&headers, SERVICE_COLUMN)?;
            let category = column_index(&headers, CATEGORY_COLUMN)?;
            let date = column_index(&headers, DATE_COLUMN)?;
            let mut rows = Vec::new();
            for (index, record) in reader.records().enumerate() {
                let record = record.map_err(csv_error)?;
                let row_number = index + 1;

                let item = match (field(&record, service), field(&record, category)) {
                    (Some(service), Some(category)) => Some(format!("{service}_{category}")),
                    _ => None,
                };
                let basket_id = match (field(&record, user), field(&record, date)) {
                    (Some(user), Some(raw_date)) => {
                        Some(format!("{user}_{}", month_bucket(&raw_date, row_number)?))
                    }
                    _ => None,
                };
                rows.push(RawRow { basket_id, item });
            }
            Ok(rows)
        }
    }
}

/// `YYYY-MM` bucket of a timestamp or date.
pub fn month_bucket(raw: &str, row: usize) -> Result<String, ApplicationError> {
    let date = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| {
            NaiveDateTime::parse_from_str(raw, format).ok().map(|value| value.date())
        })
        .or_else(|| NaiveDate::parse_from_str(raw, DATE_FORMAT).ok())
        .ok_or_else(|| {
            ApplicationError::Input(format!("row {row}: unparsable {DATE_COLUMN} `{raw}`"))
        })?;
    Ok(date.format("%Y-%m").to_string())
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize, ApplicationError> {
    headers
        .iter()
        .position(|header| header == name)
        .ok_or_else(|| {
            ApplicationError::Input(format!("input is missing required column `{name}`"))
        })
}

fn field(record: &StringRecord, index: usize) -> Option<String> {
    record.get(index).filter(|value| !value.is_empty()).map(str::to_string)
}

fn csv_error(error: csv::Error) -> ApplicationError {
    ApplicationError::Input(format!("could not parse CSV input: {error}"))
}
