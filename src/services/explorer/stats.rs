use serde::Serialize;

use super::numeric::NumericParser;
use super::types::ColumnProfile;
use crate::models::Dataset;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStatistics {
    pub name: String,
    #[serde(flatten)]
    pub summary: Summary,
}

/// Mean and population standard deviation, `None` for no values.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, variance.sqrt()))
}

pub fn summary(values: &[f64]) -> Summary {
    let Some((mean, std)) = mean_and_std(values) else {
        return Summary::default();
    };

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    };

    Summary {
        count: sorted.len(),
        mean,
        median,
        std,
        min: sorted[0],
        max: sorted[sorted.len() - 1],
    }
}

/// Ordinary least squares fit of `ys` on `xs`.
pub fn linear_regression(xs: &[f64], ys: &[f64]) -> Option<Regression> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let (covariance, variance) = xs
        .iter()
        .zip(ys)
        .fold((0.0, 0.0), |(cov, var), (x, y)| {
            (cov + (x - mean_x) * (y - mean_y), var + (x - mean_x).powi(2))
        });
    if variance == 0.0 {
        return None;
    }

    let slope = covariance / variance;
    Some(Regression {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}

/// Values of a column that read as numbers without falling back; empty cells are skipped.
pub fn parsed_column_values(dataset: &Dataset, column: usize) -> Vec<f64> {
    dataset
        .column_values(column)
        .filter(|cell| !cell.is_empty())
        .filter_map(|cell| NumericParser::parse_strict(cell).ok())
        .collect()
}

/// Summary of every Numeric column, in column order.
pub fn column_statistics(dataset: &Dataset, profiles: &[ColumnProfile]) -> Vec<ColumnStatistics> {
    profiles
        .iter()
        .filter(|p| p.is_numeric())
        .filter_map(|p| {
            let idx = dataset.column_index(&p.name)?;
            Some(ColumnStatistics {
                name: p.name.clone(),
                summary: summary(&parsed_column_values(dataset, idx)),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_of_even_count_averages_middle() {
        let s = summary(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, 2.5);
        assert_eq!(s.median, 2.5);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 4.0);
        assert!((s.std - 1.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        assert_eq!(summary(&[]), Summary::default());
    }

    #[test]
    fn regression_fits_a_line() {
        let fit = linear_regression(&[0.0, 1.0, 2.0], &[1.0, 3.0, 5.0]).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
    }

    #[test]
    fn regression_rejects_degenerate_input() {
        assert!(linear_regression(&[1.0], &[2.0]).is_none());
        assert!(linear_regression(&[1.0, 1.0], &[2.0, 3.0]).is_none());
        assert!(linear_regression(&[1.0, 2.0], &[2.0]).is_none());
    }
}
