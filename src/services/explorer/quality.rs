use std::collections::HashSet;

use super::stats::{mean_and_std, parsed_column_values};
use super::types::{find_profile, ColumnProfile, ColumnQuality, ColumnType, QualityReport};
use crate::models::{cell_at, Cell, Dataset, Record};

pub const EMPTY_WEIGHT: f64 = 30.0;
pub const DUPLICATE_WEIGHT: f64 = 30.0;
pub const OUTLIER_WEIGHT: f64 = 20.0;
pub const OUTLIER_SIGMA: f64 = 2.0;

/// Missingness, duplication and outlier statistics with a composite 0-100 score.
pub struct QualityScorer;

impl QualityScorer {
    pub fn score(&self, dataset: &Dataset, profiles: &[ColumnProfile]) -> QualityReport {
        let start = std::time::Instant::now();
        let row_count = dataset.row_count();
        let total_cells = row_count * dataset.column_count();

        let per_column: Vec<ColumnQuality> = dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let inferred_type = find_profile(profiles, name)
                    .map(|p| p.column_type)
                    .unwrap_or(ColumnType::Categorical);
                self.analyze_column(dataset, idx, name, inferred_type)
            })
            .collect();

        let empty_cells = per_column.iter().map(|c| c.empty_count).sum();
        let duplicate_row_count = row_count - distinct_rows(dataset);
        let total_outliers = per_column.iter().map(|c| c.outlier_count).sum();

        let score = composite_score(
            empty_cells,
            total_cells,
            duplicate_row_count,
            total_outliers,
            row_count,
        );

        tracing::info!(
            "Quality scored {:.1} ({} empty cells, {} duplicate rows, {} outliers) in {:?}",
            score,
            empty_cells,
            duplicate_row_count,
            total_outliers,
            start.elapsed()
        );

        QualityReport {
            row_count,
            total_cells,
            empty_cells,
            duplicate_row_count,
            per_column,
            score,
        }
    }

    fn analyze_column(
        &self,
        dataset: &Dataset,
        idx: usize,
        name: &str,
        inferred_type: ColumnType,
    ) -> ColumnQuality {
        let mut empty_count = 0;
        let mut distinct = HashSet::new();
        for value in dataset.column_values(idx) {
            if value.is_empty() {
                empty_count += 1;
            }
            distinct.insert(value.to_string());
        }

        let outlier_count = match inferred_type {
            ColumnType::Numeric => count_outliers(&parsed_column_values(dataset, idx)),
            _ => 0,
        };

        ColumnQuality {
            name: name.to_string(),
            empty_count,
            inferred_type,
            duplicate_count: dataset.row_count() - distinct.len(),
            outlier_count,
        }
    }
}

/// Values further than two population standard deviations from the mean.
/// Needs more than two values and a non-zero spread.
pub fn count_outliers(values: &[f64]) -> usize {
    if values.len() <= 2 {
        return 0;
    }
    match mean_and_std(values) {
        Some((mean, std)) if std > 0.0 && std.is_finite() => values
            .iter()
            .filter(|v| (*v - mean).abs() > OUTLIER_SIGMA * std)
            .count(),
        _ => 0,
    }
}

pub fn composite_score(
    empty_cells: usize,
    total_cells: usize,
    duplicate_rows: usize,
    outliers: usize,
    row_count: usize,
) -> f64 {
    if row_count == 0 {
        return 0.0;
    }
    let rows = row_count as f64;

    let empty_penalty = if total_cells == 0 {
        0.0
    } else {
        empty_cells as f64 / total_cells as f64 * EMPTY_WEIGHT
    };
    let duplicate_penalty = duplicate_rows as f64 / rows * DUPLICATE_WEIGHT;
    let outlier_penalty = (outliers as f64 / rows * OUTLIER_WEIGHT).min(OUTLIER_WEIGHT);

    (100.0 - empty_penalty - duplicate_penalty - outlier_penalty).clamp(0.0, 100.0)
}

fn distinct_rows(dataset: &Dataset) -> usize {
    let width = dataset.column_count();
    dataset
        .rows()
        .iter()
        .map(|row| canonical_row(row, width))
        .collect::<HashSet<_>>()
        .len()
}

/// JSON array of the row's cells in column order, short rows padded with null.
fn canonical_row(row: &Record, width: usize) -> String {
    let cells: Vec<&Cell> = (0..width).map(|idx| cell_at(row, idx)).collect();
    serde_json::to_string(&cells).unwrap_or_else(|_| format!("{:?}", cells))
}
