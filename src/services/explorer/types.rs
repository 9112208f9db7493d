use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::models::Cell;

pub const SAMPLE_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Date,
    Numeric,
    Categorical,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub unique_count: usize,
    pub null_count: usize,
    pub sample_values: SmallVec<[String; SAMPLE_SIZE]>,
}

impl ColumnProfile {
    pub fn is_date(&self) -> bool {
        self.column_type == ColumnType::Date
    }

    pub fn is_numeric(&self) -> bool {
        self.column_type == ColumnType::Numeric
    }

    pub fn is_categorical(&self) -> bool {
        self.column_type == ColumnType::Categorical
    }
}

pub fn find_profile<'a>(profiles: &'a [ColumnProfile], name: &str) -> Option<&'a ColumnProfile> {
    profiles.iter().find(|p| p.name == name)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnQuality {
    pub name: String,
    pub empty_count: usize,
    #[serde(rename = "type")]
    pub inferred_type: ColumnType,
    pub duplicate_count: usize,
    pub outlier_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub row_count: usize,
    pub total_cells: usize,
    pub empty_cells: usize,
    pub duplicate_row_count: usize,
    pub per_column: Vec<ColumnQuality>,
    pub score: f64,
}

impl QualityReport {
    pub fn column(&self, name: &str) -> Option<&ColumnQuality> {
        self.per_column.iter().find(|c| c.name == name)
    }

    pub fn total_outliers(&self) -> usize {
        self.per_column.iter().map(|c| c.outlier_count).sum()
    }

    /// Share of empty cells in percent; `0` when there are no cells.
    pub fn empty_percentage(&self) -> f64 {
        percentage(self.empty_cells, self.total_cells)
    }

    /// Share of duplicate rows in percent; `0` for an empty dataset.
    pub fn duplicate_percentage(&self) -> f64 {
        percentage(self.duplicate_row_count, self.row_count)
    }
}

pub(crate) fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: Cell,
    pub y: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieGroup {
    pub name: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
    pub start_y: f64,
    pub end_y: f64,
}
