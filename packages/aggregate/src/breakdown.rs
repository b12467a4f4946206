//! Percentage-of-total breakdowns over yearly records.

use traffic_stops_datasets_models::{EthnicGroup, YearFilter, YearlyRecord};

use crate::series::{GroupTimeSeries, SeriesPoint, TimePoint};
use crate::{percentage, reduce_across_years, year_total};

/// For each group, its summed count as a percentage of the summed total
/// across all groups and years — the canonical "overview pie" computation.
///
/// Percentages sum to 100 (within rounding) whenever any group has a
/// nonzero count, and are all zero when every count is zero.
#[must_use]
pub fn full_dataset_breakdown(
    records: &[YearlyRecord],
    groups: &[EthnicGroup],
) -> Vec<SeriesPoint> {
    let totals: Vec<u64> = groups
        .iter()
        .map(|group| reduce_across_years(records, *group))
        .collect();
    let total: u64 = totals.iter().sum();
    groups
        .iter()
        .zip(totals)
        .map(|(group, count)| {
            SeriesPoint::new(group.label(), percentage(count as f64, total as f64))
        })
        .collect()
}

/// Per-group percentages of a single year's total. Falls back to all-zero
/// points when the year is absent from the dataset.
#[must_use]
pub fn year_breakdown(
    records: &[YearlyRecord],
    year: u16,
    groups: &[EthnicGroup],
) -> Vec<SeriesPoint> {
    records.iter().find(|record| record.year == year).map_or_else(
        || {
            groups
                .iter()
                .map(|group| SeriesPoint::new(group.label(), 0.0))
                .collect()
        },
        |record| {
            let total = year_total(record, groups);
            groups
                .iter()
                .map(|group| {
                    SeriesPoint::new(
                        group.label(),
                        percentage(record.count(*group) as f64, total as f64),
                    )
                })
                .collect()
        },
    )
}

/// Breakdown for a year subset: the whole dataset or a single year.
#[must_use]
pub fn breakdown(
    records: &[YearlyRecord],
    year: YearFilter,
    groups: &[EthnicGroup],
) -> Vec<SeriesPoint> {
    match year {
        YearFilter::All => full_dataset_breakdown(records, groups),
        YearFilter::Year(y) => year_breakdown(records, y, groups),
    }
}

/// For every year present, each group's percentage of that year's total.
///
/// Years are processed independently: a group missing from one year does
/// not distort another year's total.
#[must_use]
pub fn stacked_percentages_by_year(
    records: &[YearlyRecord],
    groups: &[EthnicGroup],
) -> Vec<GroupTimeSeries> {
    groups
        .iter()
        .map(|group| GroupTimeSeries {
            id: traffic_stops_datasets_models::Group::Real(*group),
            points: records
                .iter()
                .map(|record| TimePoint {
                    x: record.year,
                    y: percentage(
                        record.count(*group) as f64,
                        year_total(record, groups) as f64,
                    ),
                })
                .collect(),
        })
        .collect()
}

/// `true` when every count for the named groups is zero across all years.
/// A successfully fetched but all-zero dataset is a valid data state and
/// surfaces as "no data reported", not as an error.
#[must_use]
pub fn is_empty_dataset(records: &[YearlyRecord], groups: &[EthnicGroup]) -> bool {
    groups
        .iter()
        .all(|group| reduce_across_years(records, *group) == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;
    use traffic_stops_datasets_models::Group;

    #[test]
    fn breakdown_percentages_sum_to_one_hundred() {
        let records = vec![
            record(2019, &[(EthnicGroup::White, 7), (EthnicGroup::Black, 3)]),
            record(
                2020,
                &[(EthnicGroup::White, 5), (EthnicGroup::Hispanic, 11)],
            ),
        ];
        let points = full_dataset_breakdown(&records, EthnicGroup::ALL);
        let sum: f64 = points.iter().map(|p| p.y).sum();
        assert!((sum - 100.0).abs() <= 0.1, "sum was {sum}");
    }

    #[test]
    fn breakdown_of_all_zero_dataset_is_all_zero() {
        let records = vec![record(2020, &[])];
        let points = full_dataset_breakdown(&records, EthnicGroup::ALL);
        assert!(points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn year_breakdown_uses_that_years_total_only() {
        let records = vec![
            record(2019, &[(EthnicGroup::White, 1000)]),
            record(2020, &[(EthnicGroup::White, 80), (EthnicGroup::Black, 20)]),
        ];
        let points = year_breakdown(&records, 2020, EthnicGroup::ALL);
        assert_eq!(points[0].y, 80.0);
        assert_eq!(points[1].y, 20.0);
    }

    #[test]
    fn missing_year_breaks_down_to_zero_points() {
        let records = vec![record(2020, &[(EthnicGroup::White, 80)])];
        let points = year_breakdown(&records, 1999, EthnicGroup::ALL);
        assert_eq!(points.len(), EthnicGroup::ALL.len());
        assert!(points.iter().all(|p| p.y == 0.0));
    }

    #[test]
    fn stacked_percentages_treat_years_independently() {
        let records = vec![
            record(2019, &[(EthnicGroup::White, 50), (EthnicGroup::Black, 50)]),
            // Black missing in 2020 — must not distort 2020's total.
            record(2020, &[(EthnicGroup::White, 40)]),
        ];
        let series =
            stacked_percentages_by_year(&records, &[EthnicGroup::White, EthnicGroup::Black]);
        let white = series
            .iter()
            .find(|s| s.id == Group::Real(EthnicGroup::White))
            .unwrap();
        assert_eq!(white.points[0].y, 50.0);
        assert_eq!(white.points[1].y, 100.0);
    }

    #[test]
    fn detects_empty_dataset() {
        let records = vec![record(2019, &[]), record(2020, &[])];
        assert!(is_empty_dataset(&records, EthnicGroup::ALL));
        let records = vec![record(2020, &[(EthnicGroup::Other, 1)])];
        assert!(!is_empty_dataset(&records, EthnicGroup::ALL));
    }
}
