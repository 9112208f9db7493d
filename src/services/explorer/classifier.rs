use smallvec::SmallVec;
use std::collections::HashSet;

use super::dates::is_date_like;
use super::numeric::NumericParser;
use super::types::{ColumnProfile, ColumnType, SAMPLE_SIZE};
use crate::models::{Cell, Dataset};

/// Assigns each column a semantic type by majority vote over its non-empty cells.
pub struct ColumnClassifier;

impl ColumnClassifier {
    pub fn classify(&self, dataset: &Dataset) -> Vec<ColumnProfile> {
        let start = std::time::Instant::now();

        let profiles: Vec<ColumnProfile> = dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| self.analyze_column(name, dataset.column_values(idx)))
            .collect();

        tracing::info!(
            "Classified {} columns over {} rows in {:?}",
            profiles.len(),
            dataset.row_count(),
            start.elapsed()
        );
        profiles
    }

    fn analyze_column<'a>(
        &self,
        name: &str,
        values: impl Iterator<Item = &'a Cell>,
    ) -> ColumnProfile {
        let mut null_count = 0;
        let mut seen_values = HashSet::new();
        let mut sample_values = SmallVec::<[String; SAMPLE_SIZE]>::new();
        let mut present = Vec::new();

        for value in values {
            if value.is_empty() {
                null_count += 1;
                continue;
            }
            let str_value = value.to_string();
            if sample_values.len() < SAMPLE_SIZE {
                sample_values.push(str_value.clone());
            }
            seen_values.insert(str_value);
            present.push(value);
        }

        let column_type = self.detect_column_type(&present);
        tracing::debug!(
            column = name,
            ?column_type,
            unique = seen_values.len(),
            nulls = null_count,
            "column classified"
        );

        ColumnProfile {
            name: name.to_string(),
            column_type,
            unique_count: seen_values.len(),
            null_count,
            sample_values,
        }
    }

    /// Date wins when at least half the values are date-like, so a tie between
    /// dates and anything else resolves to Date. Numeric needs a strict majority.
    pub fn detect_column_type(&self, values: &[&Cell]) -> ColumnType {
        let total = values.len();
        if total == 0 {
            return ColumnType::Categorical;
        }

        let date_count = values.iter().filter(|v| is_date_like(v)).count();
        if date_count * 2 >= total {
            return ColumnType::Date;
        }

        let numeric_count = values
            .iter()
            .filter(|v| NumericParser::is_numeric_like(v))
            .count();
        if numeric_count * 2 > total {
            ColumnType::Numeric
        } else {
            ColumnType::Categorical
        }
    }
}
