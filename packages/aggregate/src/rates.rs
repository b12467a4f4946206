//! Rate-of-two-counts and baseline-relative comparisons.

use traffic_stops_datasets_models::{EthnicGroup, Group, YearFilter, YearlyRecord};

use crate::series::BaselineComparison;
use crate::{percentage, reduce_across_years};

fn count_for_year(records: &[YearlyRecord], year: u16, group: EthnicGroup) -> u64 {
    records
        .iter()
        .find(|record| record.year == year)
        .map_or(0, |record| record.count(group))
}

fn pooled_for_year(records: &[YearlyRecord], year: u16, groups: &[EthnicGroup]) -> u64 {
    groups
        .iter()
        .map(|group| count_for_year(records, year, *group))
        .sum()
}

/// Rate of one count series against another for a single year, as a
/// percentage. A record missing for the year, or a group missing from a
/// record, counts as zero; a zero denominator yields `0.0`.
///
/// [`Group::Average`] pools summed numerators and denominators across all
/// of `all_groups` before dividing. The pooled form is *not* the mean of
/// per-group rates — those differ whenever group sizes differ, and pooled
/// is the one that matches "average searches across all stops".
#[must_use]
pub fn rate_for_year_by_group(
    numerators: &[YearlyRecord],
    denominators: &[YearlyRecord],
    year: u16,
    group: Group,
    all_groups: &[EthnicGroup],
) -> f64 {
    match group {
        Group::Real(group) => percentage(
            count_for_year(numerators, year, group) as f64,
            count_for_year(denominators, year, group) as f64,
        ),
        Group::Average => percentage(
            pooled_for_year(numerators, year, all_groups) as f64,
            pooled_for_year(denominators, year, all_groups) as f64,
        ),
    }
}

/// Relative difference of a group's rate against the baseline group's
/// rate: `(group - baseline) / baseline`.
///
/// Returns `0.0` when the baseline rate is zero — per-pair there is no
/// comparison to make. Whether the *entire* baseline series is zero (the
/// user-facing "no comparison possible" condition) is decided by
/// [`baseline_comparisons`], not here.
#[must_use]
pub fn rate_difference_against_baseline(group_rate: f64, baseline_rate: f64) -> f64 {
    if baseline_rate == 0.0 {
        0.0
    } else {
        (group_rate - baseline_rate) / baseline_rate
    }
}

fn scoped_total(records: &[YearlyRecord], year: YearFilter, group: EthnicGroup) -> u64 {
    match year {
        YearFilter::All => reduce_across_years(records, group),
        YearFilter::Year(y) => count_for_year(records, y, group),
    }
}

/// Baseline-relative comparison for every non-baseline group over the
/// selected year scope, using pooled-within-scope rates.
///
/// When the baseline group's rate is zero across the entire scope (no
/// numerator incidents reported for it at all, or no denominator
/// incidents), every row is [`BaselineComparison::NoBaselineData`]: the
/// department has nothing to compare against and a numeric `0` would
/// misleadingly read as "no disparity". A single zero year within a wider
/// scope is not special — it just contributes zero to the pooled counts.
#[must_use]
pub fn baseline_comparisons(
    numerators: &[YearlyRecord],
    denominators: &[YearlyRecord],
    year: YearFilter,
    groups: &[EthnicGroup],
    baseline: EthnicGroup,
) -> Vec<(EthnicGroup, BaselineComparison)> {
    let rate = |group: EthnicGroup| {
        percentage(
            scoped_total(numerators, year, group) as f64,
            scoped_total(denominators, year, group) as f64,
        )
    };

    let no_baseline = scoped_total(numerators, year, baseline) == 0
        || scoped_total(denominators, year, baseline) == 0;
    let baseline_rate = rate(baseline);

    groups
        .iter()
        .filter(|group| **group != baseline)
        .map(|group| {
            let comparison = if no_baseline {
                BaselineComparison::NoBaselineData
            } else {
                BaselineComparison::Difference(rate_difference_against_baseline(
                    rate(*group),
                    baseline_rate,
                ))
            };
            (*group, comparison)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    const TWO_GROUPS: &[EthnicGroup] = &[EthnicGroup::White, EthnicGroup::Black];

    #[test]
    fn rate_for_year_divides_group_counts() {
        let searches = vec![record(
            2020,
            &[(EthnicGroup::White, 8), (EthnicGroup::Black, 6)],
        )];
        let stops = vec![record(
            2020,
            &[(EthnicGroup::White, 80), (EthnicGroup::Black, 20)],
        )];
        let rate = rate_for_year_by_group(
            &searches,
            &stops,
            2020,
            Group::Real(EthnicGroup::Black),
            TWO_GROUPS,
        );
        assert_eq!(rate, 30.0);
    }

    #[test]
    fn missing_year_or_group_counts_as_zero() {
        let searches = vec![record(2020, &[(EthnicGroup::White, 8)])];
        let stops = vec![record(2020, &[(EthnicGroup::White, 80)])];
        assert_eq!(
            rate_for_year_by_group(
                &searches,
                &stops,
                1999,
                Group::Real(EthnicGroup::White),
                TWO_GROUPS
            ),
            0.0
        );
        assert_eq!(
            rate_for_year_by_group(
                &searches,
                &stops,
                2020,
                Group::Real(EthnicGroup::Black),
                TWO_GROUPS
            ),
            0.0
        );
    }

    #[test]
    fn average_is_pooled_not_mean_of_rates() {
        // Group rates are 50% (1/2) and 10% (1/10). Pooled: 2/12 ≈ 16.7%,
        // not the 30% arithmetic mean.
        let numerators = vec![record(
            2020,
            &[(EthnicGroup::White, 1), (EthnicGroup::Black, 1)],
        )];
        let denominators = vec![record(
            2020,
            &[(EthnicGroup::White, 2), (EthnicGroup::Black, 10)],
        )];
        let average =
            rate_for_year_by_group(&numerators, &denominators, 2020, Group::Average, TWO_GROUPS);
        assert_eq!(average, 16.7);
    }

    #[test]
    fn equal_rates_have_zero_difference() {
        assert_eq!(rate_difference_against_baseline(25.0, 25.0), 0.0);
    }

    #[test]
    fn zero_baseline_rate_is_not_nan_or_infinite() {
        let diff = rate_difference_against_baseline(30.0, 0.0);
        assert_eq!(diff, 0.0);
    }

    #[test]
    fn comparison_is_relative_to_baseline() {
        let diff = rate_difference_against_baseline(30.0, 10.0);
        assert!((diff - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_zero_baseline_yields_no_baseline_data_for_every_group() {
        // The department never reported searching a white driver.
        let searches = vec![
            record(2019, &[(EthnicGroup::Black, 4)]),
            record(2020, &[(EthnicGroup::Black, 6), (EthnicGroup::Hispanic, 2)]),
        ];
        let stops = vec![
            record(2019, &[(EthnicGroup::White, 50), (EthnicGroup::Black, 30)]),
            record(2020, &[(EthnicGroup::White, 60), (EthnicGroup::Black, 40)]),
        ];
        let comparisons = baseline_comparisons(
            &searches,
            &stops,
            YearFilter::All,
            EthnicGroup::ALL,
            EthnicGroup::White,
        );
        assert_eq!(comparisons.len(), EthnicGroup::ALL.len() - 1);
        assert!(
            comparisons
                .iter()
                .all(|(_, c)| *c == BaselineComparison::NoBaselineData)
        );
    }

    #[test]
    fn single_zero_year_is_not_no_baseline_data() {
        let searches = vec![
            record(2019, &[(EthnicGroup::Black, 4)]),
            record(2020, &[(EthnicGroup::White, 5), (EthnicGroup::Black, 6)]),
        ];
        let stops = vec![
            record(2019, &[(EthnicGroup::White, 50), (EthnicGroup::Black, 20)]),
            record(2020, &[(EthnicGroup::White, 50), (EthnicGroup::Black, 20)]),
        ];
        let comparisons = baseline_comparisons(
            &searches,
            &stops,
            YearFilter::All,
            TWO_GROUPS,
            EthnicGroup::White,
        );
        let (group, comparison) = comparisons[0];
        assert_eq!(group, EthnicGroup::Black);
        // white: 5/100 = 5%, black: 10/40 = 25% → (25 - 5) / 5 = 4.
        assert_eq!(comparison, BaselineComparison::Difference(4.0));
    }

    #[test]
    fn year_scoped_comparison_uses_that_year_only() {
        let searches = vec![
            record(2019, &[(EthnicGroup::White, 10), (EthnicGroup::Black, 10)]),
            record(2020, &[(EthnicGroup::Black, 6)]),
        ];
        let stops = vec![
            record(2019, &[(EthnicGroup::White, 100), (EthnicGroup::Black, 50)]),
            record(2020, &[(EthnicGroup::White, 100), (EthnicGroup::Black, 50)]),
        ];
        let comparisons = baseline_comparisons(
            &searches,
            &stops,
            YearFilter::Year(2020),
            TWO_GROUPS,
            EthnicGroup::White,
        );
        // White searched nobody in 2020 — scoped to that year there is no
        // baseline to compare against.
        assert_eq!(comparisons[0].1, BaselineComparison::NoBaselineData);
    }
}
