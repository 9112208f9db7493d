use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::models::{cell_at, Cell, Dataset, Record};

pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Current sort indicator. Both fields are set or both are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: Option<SortDirection>,
}

impl SortState {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(column: &str, direction: SortDirection) -> Self {
        Self {
            column: Some(column.to_string()),
            direction: Some(direction),
        }
    }

    /// Next state after a sort request on `column`: none -> asc -> desc -> none
    /// for the same column, asc for any other column.
    pub fn toggle(&self, column: &str) -> Self {
        if self.column.as_deref() != Some(column) {
            return Self::by(column, SortDirection::Asc);
        }
        match self.direction {
            None => Self::by(column, SortDirection::Asc),
            Some(SortDirection::Asc) => Self::by(column, SortDirection::Desc),
            Some(SortDirection::Desc) => Self::unsorted(),
        }
    }

    pub fn active(&self) -> Option<(&str, SortDirection)> {
        match (&self.column, self.direction) {
            (Some(column), Some(direction)) => Some((column.as_str(), direction)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TablePage<'a> {
    pub rows: Vec<&'a Record>,
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub sort: SortState,
}

/// Sorted, paginated browsing of the raw rows.
pub struct TableView;

impl TableView {
    pub fn sort<'a>(
        dataset: &'a Dataset,
        column: &str,
        direction: SortDirection,
    ) -> Vec<&'a Record> {
        let order = Self::sorted_order(dataset, &SortState::by(column, direction));
        order.into_iter().map(|idx| &dataset.rows()[idx]).collect()
    }

    /// Row indices in display order. Unsorted or unknown columns keep source order.
    pub fn sorted_order(dataset: &Dataset, sort: &SortState) -> Vec<usize> {
        let mut order: Vec<usize> = (0..dataset.row_count()).collect();
        let Some((column, direction)) = sort.active() else {
            return order;
        };
        let Some(col) = dataset.column_index(column) else {
            tracing::debug!("Sort column {} not in dataset, keeping source order", column);
            return order;
        };

        let keys: Vec<SortKey> = dataset
            .rows()
            .iter()
            .map(|row| SortKey::from_cell(cell_at(row, col)))
            .collect();
        order.sort_by(|&a, &b| keys[a].compare(&keys[b], direction));
        order
    }

    pub fn paginate<T>(items: &[T], page_index: usize, page_size: usize) -> &[T] {
        let start = page_index.saturating_mul(page_size).min(items.len());
        let end = start.saturating_add(page_size).min(items.len());
        &items[start..end]
    }

    pub fn total_pages(row_count: usize, page_size: usize) -> usize {
        if page_size == 0 {
            0
        } else {
            row_count.div_ceil(page_size)
        }
    }

    pub fn view<'a>(dataset: &'a Dataset, sort: &SortState, page_index: usize) -> TablePage<'a> {
        let order = Self::sorted_order(dataset, sort);
        Self::page_from_order(dataset, &order, sort, page_index)
    }

    pub fn page_from_order<'a>(
        dataset: &'a Dataset,
        order: &[usize],
        sort: &SortState,
        page_index: usize,
    ) -> TablePage<'a> {
        let rows = Self::paginate(order, page_index, PAGE_SIZE)
            .iter()
            .filter_map(|&idx| dataset.rows().get(idx))
            .collect();

        TablePage {
            rows,
            page_index,
            page_size: PAGE_SIZE,
            total_pages: Self::total_pages(order.len(), PAGE_SIZE),
            total_rows: order.len(),
            sort: sort.clone(),
        }
    }
}

/// Totally ordered sort key for one cell: numbers, then text, then empty cells.
#[derive(Debug, Clone, PartialEq)]
pub enum SortKey {
    Number(f64),
    Text { folded: String, raw: String },
    Empty,
}

impl SortKey {
    pub fn from_cell(cell: &Cell) -> Self {
        if cell.is_empty() {
            return SortKey::Empty;
        }
        match sort_number(cell) {
            Some(n) => SortKey::Number(n),
            None => {
                let raw = cell.to_string();
                SortKey::Text {
                    folded: collation_key(&raw),
                    raw,
                }
            }
        }
    }

    fn rank(&self) -> u8 {
        match self {
            SortKey::Number(_) => 0,
            SortKey::Text { .. } => 1,
            SortKey::Empty => 2,
        }
    }

    /// Empty keys stay last in either direction.
    pub fn compare(&self, other: &Self, direction: SortDirection) -> Ordering {
        let ordering = match (self, other) {
            (SortKey::Empty, _) | (_, SortKey::Empty) => {
                return self.rank().cmp(&other.rank());
            }
            (SortKey::Number(a), SortKey::Number(b)) => a.total_cmp(b),
            (
                SortKey::Text { folded: fa, raw: ra },
                SortKey::Text { folded: fb, raw: rb },
            ) => fa.cmp(fb).then_with(|| ra.cmp(rb)),
            _ => self.rank().cmp(&other.rank()),
        };
        match direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

fn sort_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Date(d) => d.and_utc().timestamp_millis() as f64,
        Cell::Text(s) => s.trim().parse::<f64>().ok()?,
        Cell::Null => return None,
    };
    value.is_finite().then_some(value)
}

/// Lowercased text with diacritics removed, so "Água" sorts beside "agua".
fn collation_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}
