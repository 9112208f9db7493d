use bytes::Bytes;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use crate::error::AppError;
use crate::models::{Cell, Dataset, Record};
use crate::services::explorer::ExcelSerialDateConverter;

/// Reads the first worksheet of an xlsx workbook. The first row names the columns;
/// rows with no content at all are dropped.
pub fn dataset_from_xlsx(file_data: Bytes) -> Result<Dataset, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Reading workbook of {}KB", file_data.len() / 1024);

    let cursor = Cursor::new(file_data);
    let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::FileProcessingError(format!("Failed to open Excel file: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = sheet_names
        .first()
        .ok_or_else(|| AppError::FileProcessingError("No sheets found in workbook".to_string()))?;
    if sheet_names.len() > 1 {
        tracing::info!("Workbook has {} sheets, using {}", sheet_names.len(), sheet_name);
    }

    let range = workbook.worksheet_range(sheet_name).map_err(|e| {
        tracing::warn!("Failed to read worksheet {}: {}", sheet_name, e);
        AppError::FileProcessingError(format!("Failed to read worksheet {}: {}", sheet_name, e))
    })?;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        tracing::warn!("Sheet {} is empty", sheet_name);
        return Ok(Dataset::default());
    };
    let columns = unique_column_names(header.iter().map(|cell| cell.to_string()));

    let records: Vec<Record> = rows
        .map(|row| row.iter().map(cell_from_data).collect::<Record>())
        .filter(|record| !record.iter().all(Cell::is_empty))
        .collect();

    tracing::info!(
        "Sheet {} read: {} rows x {} columns in {:?}",
        sheet_name,
        records.len(),
        columns.len(),
        start.elapsed()
    );
    Ok(Dataset::new(columns, records))
}

/// Builds a dataset from JSON-style objects keyed by column name.
pub fn dataset_from_objects(
    columns: Vec<String>,
    objects: Vec<HashMap<String, Cell>>,
) -> Result<Dataset, AppError> {
    if columns.is_empty() {
        return Err(AppError::InvalidInput("At least one column is required".to_string()));
    }
    let mut seen = HashSet::new();
    for name in &columns {
        if name.trim().is_empty() {
            return Err(AppError::InvalidInput("Column names cannot be blank".to_string()));
        }
        if !seen.insert(name.as_str()) {
            return Err(AppError::InvalidInput(format!("Duplicate column name: {}", name)));
        }
    }
    Ok(Dataset::from_objects(columns, objects))
}

pub fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::DateTime(dt) => ExcelSerialDateConverter::to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Null),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        _ => Cell::Null,
    }
}

/// Trimmed header names; blanks become `column_{n}` and repeats get `_1`, `_2`... suffixes.
pub fn unique_column_names<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut existing_names = HashSet::new();
    raw.into_iter()
        .enumerate()
        .map(|(idx, name)| {
            let base_name = match name.trim() {
                "" => format!("column_{}", idx + 1),
                trimmed => trimmed.to_string(),
            };

            // If the name already exists, add a numeric suffix
            let mut cleaned = base_name.clone();
            let mut counter = 1;
            while !existing_names.insert(cleaned.clone()) {
                cleaned = format!("{}_{}", base_name, counter);
                counter += 1;
            }
            cleaned
        })
        .collect()
}
