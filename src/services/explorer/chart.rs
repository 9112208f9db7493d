use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::dates::ExcelSerialDateConverter;
use super::numeric::NumericParser;
use super::stats::{linear_regression, Regression};
use super::types::{find_profile, ChartPoint, ColumnProfile, ColumnType, PieGroup, TrendLine};
use crate::models::{cell_at, Cell, Dataset};

pub const PIE_GROUP_LIMIT: usize = 10;
/// Categorical columns with more distinct values than this are not offered as X.
pub const X_CATEGORY_LIMIT: usize = 50;
/// A categorical column is picked as default X only below this share of distinct values.
pub const AUTO_X_CARDINALITY_RATIO: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Area,
    Scatter,
    Pie,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AxisWarning {
    /// Y resolved to a date column; X and Y are probably the wrong way round.
    AxesLikelySwapped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisSelection {
    pub x: Option<String>,
    pub y: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<AxisWarning>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct ChartRequest {
    pub x: Option<String>,
    pub y: Option<String>,
    #[serde(default)]
    pub kind: ChartKind,
    #[serde(default)]
    pub trend: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartProjection {
    pub axes: AxisSelection,
    pub points: Vec<ChartPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pie_groups: Option<Vec<PieGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<TrendLine>,
}

/// Turns classified columns into chart-ready series.
pub struct ChartProjector;

impl ChartProjector {
    pub fn valid_y_columns<'a>(
        profiles: &'a [ColumnProfile],
        x: Option<&str>,
    ) -> Vec<&'a ColumnProfile> {
        profiles
            .iter()
            .filter(|p| p.is_numeric() && Some(p.name.as_str()) != x)
            .collect()
    }

    pub fn valid_x_columns<'a>(
        profiles: &'a [ColumnProfile],
        y: Option<&str>,
    ) -> Vec<&'a ColumnProfile> {
        profiles
            .iter()
            .filter(|p| {
                p.is_date()
                    || (p.is_categorical() && p.unique_count <= X_CATEGORY_LIMIT)
                    || Some(p.name.as_str()) != y
            })
            .collect()
    }

    /// Default axes: first Date column, else the first low-cardinality categorical
    /// column, else the first column; Y is the first Numeric column other than X.
    pub fn auto_select(profiles: &[ColumnProfile], row_count: usize) -> AxisSelection {
        let x = default_x(profiles, row_count);
        let y = default_y(profiles, x.as_deref());
        selection(profiles, x, y)
    }

    /// Keeps requested axes that still make sense for these profiles and fills the
    /// rest from the defaults. A date-typed Y is kept but flagged.
    pub fn resolve_axes(
        profiles: &[ColumnProfile],
        row_count: usize,
        requested_x: Option<&str>,
        requested_y: Option<&str>,
    ) -> AxisSelection {
        let x = match requested_x {
            Some(name) if find_profile(profiles, name).is_some() => Some(name.to_string()),
            _ => default_x(profiles, row_count),
        };

        let y = match requested_y.and_then(|name| find_profile(profiles, name)) {
            Some(p)
                if Some(p.name.as_str()) != x.as_deref()
                    && matches!(p.column_type, ColumnType::Numeric | ColumnType::Date) =>
            {
                Some(p.name.clone())
            }
            _ => default_y(profiles, x.as_deref()),
        };

        selection(profiles, x, y)
    }

    /// Resolves the request's axes and projects the dataset onto them.
    pub fn render(
        dataset: &Dataset,
        profiles: &[ColumnProfile],
        request: &ChartRequest,
    ) -> ChartProjection {
        let axes = Self::resolve_axes(
            profiles,
            dataset.row_count(),
            request.x.as_deref(),
            request.y.as_deref(),
        );
        let (points, pie_groups, trend) = match (&axes.x, &axes.y) {
            (Some(x), Some(y)) => Self::project(dataset, x, y, request.kind, request.trend),
            _ => (Vec::new(), None, None),
        };
        ChartProjection {
            axes,
            points,
            pie_groups,
            trend,
        }
    }

    /// Points for every row whose Y reads as a finite number, plus pie groups for
    /// `Pie` and an optional trend line for the other kinds.
    pub fn project(
        dataset: &Dataset,
        x_column: &str,
        y_column: &str,
        kind: ChartKind,
        with_trend: bool,
    ) -> (Vec<ChartPoint>, Option<Vec<PieGroup>>, Option<TrendLine>) {
        let Some(y_idx) = dataset.column_index(y_column) else {
            return (Vec::new(), None, None);
        };
        let x_idx = dataset.column_index(x_column);

        let points: Vec<ChartPoint> = dataset
            .rows()
            .iter()
            .enumerate()
            .filter_map(|(i, row)| {
                let y = NumericParser::parse(cell_at(row, y_idx));
                if !y.is_finite() {
                    return None;
                }
                let point = match x_idx.map(|c| cell_at(row, c)).filter(|c| !c.is_empty()) {
                    Some(x) => ChartPoint {
                        label: format_axis_label(x),
                        x: x.clone(),
                        y,
                    },
                    None => ChartPoint {
                        x: Cell::Number(i as f64),
                        y,
                        label: i.to_string(),
                    },
                };
                Some(point)
            })
            .collect();

        let pie_groups = (kind == ChartKind::Pie).then(|| group_for_pie(&points));
        let trend = if with_trend && kind != ChartKind::Pie {
            trend_line(&points)
        } else {
            None
        };

        tracing::debug!(
            x = x_column,
            y = y_column,
            ?kind,
            points = points.len(),
            has_trend = trend.is_some(),
            "chart projected"
        );
        (points, pie_groups, trend)
    }
}

/// Display text for an X value: dates and serials in the 40000-60000 window as
/// `DD/MM/YYYY`, everything else as stringified.
pub fn format_axis_label(value: &Cell) -> String {
    match value {
        Cell::Date(d) => d.format("%d/%m/%Y").to_string(),
        Cell::Number(n) if ExcelSerialDateConverter::is_label_serial(*n) => {
            ExcelSerialDateConverter::to_date(*n)
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Sums Y per label, largest first, top ten only.
pub fn group_for_pie(points: &[ChartPoint]) -> Vec<PieGroup> {
    let mut groups: Vec<PieGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for point in points {
        match index.get(point.label.as_str()) {
            Some(&i) => groups[i].value += point.y,
            None => {
                index.insert(point.label.as_str(), groups.len());
                groups.push(PieGroup {
                    name: point.label.clone(),
                    value: point.y,
                });
            }
        }
    }

    groups.sort_by(|a, b| b.value.total_cmp(&a.value));
    groups.truncate(PIE_GROUP_LIMIT);
    groups
}

/// Least squares over `(point index, y)`, skipping zero and non-finite `y`.
pub fn trend_line(points: &[ChartPoint]) -> Option<TrendLine> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.y.is_finite() && p.y != 0.0)
        .map(|(i, p)| (i as f64, p.y))
        .unzip();
    if xs.len() < 2 {
        return None;
    }

    let Regression { slope, intercept } = linear_regression(&xs, &ys)?;
    if !slope.is_finite() || !intercept.is_finite() {
        return None;
    }

    Some(TrendLine {
        slope,
        intercept,
        start_y: intercept,
        end_y: slope * (points.len() as f64 - 1.0) + intercept,
    })
}

fn default_x(profiles: &[ColumnProfile], row_count: usize) -> Option<String> {
    let cardinality_cap = row_count as f64 * AUTO_X_CARDINALITY_RATIO;
    profiles
        .iter()
        .find(|p| p.is_date())
        .or_else(|| {
            profiles
                .iter()
                .find(|p| p.is_categorical() && (p.unique_count as f64) < cardinality_cap)
        })
        .or_else(|| profiles.first())
        .map(|p| p.name.clone())
}

fn default_y(profiles: &[ColumnProfile], x: Option<&str>) -> Option<String> {
    ChartProjector::valid_y_columns(profiles, x)
        .first()
        .map(|p| p.name.clone())
}

fn selection(profiles: &[ColumnProfile], x: Option<String>, y: Option<String>) -> AxisSelection {
    let warning = y
        .as_deref()
        .and_then(|name| find_profile(profiles, name))
        .filter(|p| p.is_date())
        .map(|p| {
            tracing::warn!("Y column {} holds dates; the axes are likely swapped", p.name);
            AxisWarning::AxesLikelySwapped
        });
    AxisSelection { x, y, warning }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::explorer::classifier::ColumnClassifier;
    use smallvec::SmallVec;

    fn profile(name: &str, column_type: ColumnType, unique_count: usize) -> ColumnProfile {
        ColumnProfile {
            name: name.to_string(),
            column_type,
            unique_count,
            null_count: 0,
            sample_values: SmallVec::new(),
        }
    }

    fn point(label: &str, y: f64) -> ChartPoint {
        ChartPoint {
            x: Cell::from(label),
            y,
            label: label.to_string(),
        }
    }

    #[test]
    fn auto_select_prefers_date_then_low_cardinality_category() {
        let profiles = vec![
            profile("id", ColumnType::Numeric, 100),
            profile("store", ColumnType::Categorical, 5),
            profile("day", ColumnType::Date, 100),
            profile("sales", ColumnType::Numeric, 90),
        ];
        let axes = ChartProjector::auto_select(&profiles, 100);
        assert_eq!(axes.x.as_deref(), Some("day"));
        assert_eq!(axes.y.as_deref(), Some("id"));
        assert_eq!(axes.warning, None);

        let no_dates = &profiles[..2];
        let axes = ChartProjector::auto_select(no_dates, 100);
        assert_eq!(axes.x.as_deref(), Some("store"));

        let high_cardinality = vec![
            profile("name", ColumnType::Categorical, 40),
            profile("v", ColumnType::Numeric, 3),
        ];
        let axes = ChartProjector::auto_select(&high_cardinality, 100);
        assert_eq!(axes.x.as_deref(), Some("name"));
        assert_eq!(axes.y.as_deref(), Some("v"));
    }

    #[test]
    fn invalid_axes_are_replaced() {
        let profiles = vec![
            profile("day", ColumnType::Date, 10),
            profile("sales", ColumnType::Numeric, 10),
            profile("store", ColumnType::Categorical, 3),
        ];
        let axes = ChartProjector::resolve_axes(&profiles, 10, Some("gone"), Some("store"));
        assert_eq!(axes.x.as_deref(), Some("day"));
        assert_eq!(axes.y.as_deref(), Some("sales"));

        let kept = ChartProjector::resolve_axes(&profiles, 10, Some("store"), Some("sales"));
        assert_eq!(kept.x.as_deref(), Some("store"));
        assert_eq!(kept.y.as_deref(), Some("sales"));
    }

    #[test]
    fn date_y_is_flagged_but_kept() {
        let profiles = vec![
            profile("sales", ColumnType::Numeric, 10),
            profile("day", ColumnType::Date, 10),
        ];
        let axes = ChartProjector::resolve_axes(&profiles, 10, Some("sales"), Some("day"));
        assert_eq!(axes.y.as_deref(), Some("day"));
        assert_eq!(axes.warning, Some(AxisWarning::AxesLikelySwapped));
    }

    #[test]
    fn valid_axis_lists() {
        let profiles = vec![
            profile("day", ColumnType::Date, 10),
            profile("a", ColumnType::Numeric, 10),
            profile("b", ColumnType::Numeric, 10),
        ];
        let ys: Vec<&str> = ChartProjector::valid_y_columns(&profiles, Some("a"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(ys, ["b"]);

        let xs: Vec<&str> = ChartProjector::valid_x_columns(&profiles, Some("b"))
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(xs, ["day", "a"]);
    }

    #[test]
    fn pie_groups_sum_sort_and_truncate() {
        let mut points: Vec<ChartPoint> =
            (0..12).map(|i| point(&format!("g{i}"), i as f64)).collect();
        points.push(point("g0", 50.0));

        let groups = group_for_pie(&points);
        assert_eq!(groups.len(), PIE_GROUP_LIMIT);
        assert_eq!(groups[0], PieGroup { name: "g0".into(), value: 50.0 });
        assert_eq!(groups[1].name, "g11");
        assert!(groups.iter().all(|g| g.name != "g1" && g.name != "g2"));
    }

    #[test]
    fn trend_needs_two_non_zero_points() {
        assert!(trend_line(&[point("a", 5.0)]).is_none());
        assert!(trend_line(&[point("a", 5.0), point("b", 0.0)]).is_none());

        let trend = trend_line(&[point("a", 1.0), point("b", 0.0), point("c", 5.0)]).unwrap();
        assert!((trend.slope - 2.0).abs() < 1e-12);
        assert!((trend.start_y - 1.0).abs() < 1e-12);
        assert!((trend.end_y - 5.0).abs() < 1e-12);
    }

    #[test]
    fn labels_format_dates_and_late_serials() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(format_axis_label(&Cell::from(date)), "05/03/2024");
        assert_eq!(format_axis_label(&Cell::Number(45292.0)), "01/01/2024");
        assert_eq!(format_axis_label(&Cell::Number(30000.0)), "30000");
        assert_eq!(format_axis_label(&Cell::from("Norte")), "Norte");
    }

    #[test]
    fn projection_drops_nothing_finite_and_indexes_missing_x() {
        let ds = Dataset::new(
            vec!["k".into(), "v".into()],
            vec![
                vec!["a".into(), "1,5".into()],
                vec![Cell::Null, "abc".into()],
                vec!["b".into(), Cell::Number(f64::NAN)],
            ],
        );
        let (points, pie, trend) = ChartProjector::project(&ds, "k", "v", ChartKind::Bar, true);

        assert_eq!(points.len(), 3);
        assert!(points.iter().all(|p| p.y.is_finite()));
        assert_eq!(points[0].y, 1.5);
        assert_eq!(points[1].x, Cell::Number(1.0));
        assert_eq!(points[1].label, "1");
        assert!(pie.is_none());
        assert!(trend.is_none());
    }

    #[test]
    fn render_resolves_axes_from_profiles() {
        let ds = Dataset::new(
            vec!["store".into(), "sales".into()],
            vec![
                vec!["Centro".into(), "10".into()],
                vec!["Norte".into(), "20".into()],
                vec!["Centro".into(), "5".into()],
                vec!["Centro".into(), "1".into()],
                vec!["Norte".into(), "2".into()],
                vec!["Centro".into(), "3".into()],
                vec!["Centro".into(), "4".into()],
            ],
        );
        let profiles = ColumnClassifier.classify(&ds);
        let request = ChartRequest {
            kind: ChartKind::Pie,
            ..ChartRequest::default()
        };
        let chart = ChartProjector::render(&ds, &profiles, &request);

        assert_eq!(chart.axes.x.as_deref(), Some("store"));
        assert_eq!(chart.axes.y.as_deref(), Some("sales"));
        let pie = chart.pie_groups.unwrap();
        assert_eq!(pie[0], PieGroup { name: "Centro".into(), value: 23.0 });
        assert_eq!(pie[1], PieGroup { name: "Norte".into(), value: 22.0 });
        assert!(chart.trend.is_none());
    }
}
