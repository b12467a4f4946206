#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]
#![allow(clippy::cast_precision_loss)]

//! Pure aggregation engine for traffic stop statistics.
//!
//! Every function here is side-effect free and total: the documented
//! zero/empty edge cases return defined numeric results, never an error.
//! Payload shape validation happens at the fetch boundary, not here.
//!
//! The one rule that is visible in the UI and must hold everywhere: any
//! ratio with a zero denominator is `0`, not `NaN` and not an error.
//! Agencies frequently report no incidents at all in a category and their
//! charts must render `0%`.

pub mod breakdown;
pub mod charts;
pub mod rates;
pub mod series;

use traffic_stops_datasets_models::{EthnicGroup, YearlyRecord};

/// Rounds to one decimal place.
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part` as a percentage of `total`, rounded to one decimal place.
///
/// Returns `0.0` when `total` is zero, regardless of `part`.
#[must_use]
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        round1(part / total * 100.0)
    }
}

/// Sums the named groups' counts within one record.
///
/// Only the groups passed in are counted, so callers can exclude a group
/// from a total without touching the record.
#[must_use]
pub fn year_total(record: &YearlyRecord, groups: &[EthnicGroup]) -> u64 {
    groups.iter().map(|group| record.count(*group)).sum()
}

/// Sums one group's count across all supplied records ("All years" views).
#[must_use]
pub fn reduce_across_years(records: &[YearlyRecord], group: EthnicGroup) -> u64 {
    records.iter().map(|record| record.count(group)).sum()
}
