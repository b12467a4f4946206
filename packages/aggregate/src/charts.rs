//! Chart-level recompute functions.
//!
//! These bridge raw payloads to derived series for the canonical dashboard
//! charts. They take already-filtered group lists (the selection layer
//! owns which groups are toggled visible) and a year scope, and are
//! recomputed on every render pass.

use traffic_stops_datasets_models::{
    CensusProfile, ContrabandHitRatePayload, EthnicGroup, Group, SearchTypeRecord,
    StopPurposeRecord, YearFilter, YearlyRecord,
};

use crate::series::{GroupTimeSeries, SeriesPoint, TimePoint};
use crate::{percentage, rates, reduce_across_years};

/// The distinct years present in a dataset, in record order.
#[must_use]
pub fn available_years(records: &[YearlyRecord]) -> Vec<u16> {
    let mut years: Vec<u16> = Vec::new();
    for record in records {
        if !years.contains(&record.year) {
            years.push(record.year);
        }
    }
    years
}

/// The distinct stop purposes present, in record order.
#[must_use]
pub fn available_purposes(records: &[StopPurposeRecord]) -> Vec<String> {
    let mut purposes: Vec<String> = Vec::new();
    for record in records {
        if !purposes.contains(&record.purpose) {
            purposes.push(record.purpose.clone());
        }
    }
    purposes
}

/// The distinct search types present, in record order.
#[must_use]
pub fn available_search_types(records: &[SearchTypeRecord]) -> Vec<String> {
    let mut types: Vec<String> = Vec::new();
    for record in records {
        if !types.contains(&record.search_type) {
            types.push(record.search_type.clone());
        }
    }
    types
}

/// Narrows reason-scoped records to one purpose, as a plain yearly series.
#[must_use]
pub fn filter_single_purpose(records: &[StopPurposeRecord], purpose: &str) -> Vec<YearlyRecord> {
    records
        .iter()
        .filter(|record| record.purpose == purpose)
        .map(|record| YearlyRecord {
            year: record.year,
            counts: record.counts,
        })
        .collect()
}

/// Narrows type-scoped search records to one search type.
#[must_use]
pub fn filter_single_search_type(
    records: &[SearchTypeRecord],
    search_type: &str,
) -> Vec<YearlyRecord> {
    records
        .iter()
        .filter(|record| record.search_type == search_type)
        .map(|record| YearlyRecord {
            year: record.year,
            counts: record.counts,
        })
        .collect()
}

/// Raw count lines per group over time ("stops by count").
#[must_use]
pub fn counts_by_year(records: &[YearlyRecord], groups: &[EthnicGroup]) -> Vec<GroupTimeSeries> {
    groups
        .iter()
        .map(|group| GroupTimeSeries {
            id: Group::Real(*group),
            points: records
                .iter()
                .map(|record| TimePoint {
                    x: record.year,
                    y: record.count(*group) as f64,
                })
                .collect(),
        })
        .collect()
}

/// Rate lines per group over time (e.g., departmental search rate:
/// searches over stops). Include [`Group::Average`] in `groups` to get the
/// pooled across-all-groups line.
#[must_use]
pub fn rate_series(
    numerators: &[YearlyRecord],
    denominators: &[YearlyRecord],
    years: &[u16],
    groups: &[Group],
    all_groups: &[EthnicGroup],
) -> Vec<GroupTimeSeries> {
    groups
        .iter()
        .map(|group| GroupTimeSeries {
            id: *group,
            points: years
                .iter()
                .map(|year| TimePoint {
                    x: *year,
                    y: rates::rate_for_year_by_group(
                        numerators,
                        denominators,
                        *year,
                        *group,
                        all_groups,
                    ),
                })
                .collect(),
        })
        .collect()
}

/// Contraband hit-rate bars: per group, contraband found as a percentage
/// of searches, pooled across the year scope.
#[must_use]
pub fn hit_rate_bars(
    payload: &ContrabandHitRatePayload,
    year: YearFilter,
    groups: &[EthnicGroup],
) -> Vec<SeriesPoint> {
    let scoped_count = |records: &[YearlyRecord], group: EthnicGroup| match year {
        YearFilter::All => reduce_across_years(records, group),
        YearFilter::Year(y) => records
            .iter()
            .find(|record| record.year == y)
            .map_or(0, |record| record.count(group)),
    };
    groups
        .iter()
        .map(|group| {
            SeriesPoint::new(
                group.label(),
                percentage(
                    scoped_count(&payload.contraband, *group) as f64,
                    scoped_count(&payload.searches, *group) as f64,
                ),
            )
        })
        .collect()
}

/// Census population breakdown from an agency's census profile.
#[must_use]
pub fn census_breakdown(profile: &CensusProfile, groups: &[EthnicGroup]) -> Vec<SeriesPoint> {
    groups
        .iter()
        .map(|group| {
            SeriesPoint::new(
                group.label(),
                percentage(profile.counts.count(*group) as f64, profile.total as f64),
            )
        })
        .collect()
}
