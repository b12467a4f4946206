#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! View-local filter and group selection state.
//!
//! These values are owned by whatever renders a chart and live as long as
//! the chart is mounted. Changing them never touches the dataset store —
//! only the date range (and the officer scope) affects the fetch query;
//! everything else is an input to local re-aggregation.
//!
//! [`GroupSelection`] is a value type: toggling produces a new selection
//! instead of mutating shared state, so two charts holding "the same"
//! default legend can never contaminate each other's toggles.

use chrono::NaiveDate;
use traffic_stops_datasets_models::{EthnicGroup, QueryParams, YearFilter};

/// One legend entry: an ethnic group and whether it is shown on the chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupToggle {
    pub group: EthnicGroup,
    pub label: String,
    pub selected: bool,
}

/// Ordered set of group legend toggles.
///
/// Selected groups are a subset of the closed group set by construction —
/// that is the only validation this layer has.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSelection {
    toggles: Vec<GroupToggle>,
}

impl Default for GroupSelection {
    fn default() -> Self {
        Self::all_selected()
    }
}

impl GroupSelection {
    /// Every group present and selected — the default legend state for
    /// every chart.
    #[must_use]
    pub fn all_selected() -> Self {
        Self {
            toggles: EthnicGroup::ALL
                .iter()
                .map(|group| GroupToggle {
                    group: *group,
                    label: group.label().to_string(),
                    selected: true,
                })
                .collect(),
        }
    }

    /// The toggles, in display order.
    #[must_use]
    pub fn toggles(&self) -> &[GroupToggle] {
        &self.toggles
    }

    /// A new selection with one group's visibility flipped. The receiver
    /// is untouched.
    #[must_use]
    pub fn with_toggled(&self, group: EthnicGroup) -> Self {
        Self {
            toggles: self
                .toggles
                .iter()
                .map(|toggle| {
                    let mut toggle = toggle.clone();
                    if toggle.group == group {
                        toggle.selected = !toggle.selected;
                    }
                    toggle
                })
                .collect(),
        }
    }

    /// The currently visible groups, in display order. An empty result
    /// renders an empty chart.
    #[must_use]
    pub fn selected_groups(&self) -> Vec<EthnicGroup> {
        self.toggles
            .iter()
            .filter(|toggle| toggle.selected)
            .map(|toggle| toggle.group)
            .collect()
    }
}

/// An inclusive reporting date range. The only filter input that scopes
/// the fetch query rather than local recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// User-chosen view parameters for one chart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    /// Year subset — recomputed locally, never re-fetched.
    pub year: YearFilter,
    /// Narrow reason-scoped stop datasets to one purpose.
    pub stop_purpose: Option<String>,
    /// Narrow type-scoped search datasets to one search type.
    pub search_type: Option<String>,
    /// Reporting date range — part of the fetch query.
    pub date_range: Option<DateRange>,
}

impl FilterState {
    /// The query parameters this filter contributes to a fetch, combined
    /// with the entity's officer scope.
    #[must_use]
    pub fn query_params(&self, officer_id: Option<&str>) -> QueryParams {
        QueryParams {
            officer: officer_id.map(ToString::to_string),
            from: self.date_range.map(|range| range.from),
            to: self.date_range.map(|range| range.to),
        }
    }
}
