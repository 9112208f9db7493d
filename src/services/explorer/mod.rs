//! In-memory exploration engine: column typing, quality scoring, table
//! browsing and chart projection over a fully materialized dataset.
//!
//! Every view is a pure function of the dataset plus the caller's selection
//! state. [`Explorer`] memoizes those views for one dataset.

pub mod chart;
pub mod classifier;
pub mod dates;
pub mod numeric;
pub mod quality;
pub mod session;
pub mod stats;
pub mod table;
pub mod types;

pub use chart::{
    AxisSelection, AxisWarning, ChartKind, ChartProjection, ChartProjector, ChartRequest,
};
pub use classifier::ColumnClassifier;
pub use dates::ExcelSerialDateConverter;
pub use numeric::{NumericParseError, NumericParser};
pub use quality::QualityScorer;
pub use session::Explorer;
pub use stats::{ColumnStatistics, Summary};
pub use table::{SortDirection, SortKey, SortState, TablePage, TableView, PAGE_SIZE};
pub use types::*;
