//! Derived series shapes consumed by chart bindings.
//!
//! These are recomputed from store payloads on every filter or selection
//! change, never cached.

use traffic_stops_datasets_models::Group;

/// One categorical data point (pie slice, bar).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    /// Category label (group name, contraband type, ...).
    pub x: String,
    pub y: f64,
    /// Chart color, when the view layer has assigned one.
    pub color: Option<String>,
}

impl SeriesPoint {
    #[must_use]
    pub fn new(x: impl Into<String>, y: f64) -> Self {
        Self {
            x: x.into(),
            y,
            color: None,
        }
    }
}

/// One point of a per-group time series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimePoint {
    pub x: u16,
    pub y: f64,
}

/// A per-group time series (one chart line).
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTimeSeries {
    pub id: Group,
    pub points: Vec<TimePoint>,
}

/// Result of comparing one group's rate against the baseline group.
///
/// `NoBaselineData` is deliberately not a numeric zero: zero would read as
/// "no disparity" when the truth is "no comparison possible".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaselineComparison {
    /// `(group_rate - baseline_rate) / baseline_rate`.
    Difference(f64),
    /// The baseline group's rate is zero across the entire selected scope.
    NoBaselineData,
}
