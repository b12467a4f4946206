#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Closed data model for per-agency traffic stop statistics.
//!
//! Every dataset the dashboard consumes is identified by a [`DatasetKey`]
//! and deserializes into a [`DatasetPayload`]. The ethnic group vocabulary
//! is a closed set — a count missing from a payload is zero, never
//! "unknown".

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The fixed set of ethnic group labels used across every dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EthnicGroup {
    White,
    Black,
    Hispanic,
    Asian,
    NativeAmerican,
    Other,
}

impl EthnicGroup {
    /// All groups, in the display order the dashboard uses.
    pub const ALL: &[Self] = &[
        Self::White,
        Self::Black,
        Self::Hispanic,
        Self::Asian,
        Self::NativeAmerican,
        Self::Other,
    ];

    /// Human-readable label (e.g., "Native American").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
            Self::Hispanic => "Hispanic",
            Self::Asian => "Asian",
            Self::NativeAmerican => "Native American",
            Self::Other => "Other",
        }
    }
}

/// A group selector for rate computations.
///
/// `Average` is not a real group — it pools summed numerators and
/// denominators across all real groups before computing a rate, which is
/// what "average searches across all stops" means. Modeling it as a
/// variant (rather than a magic string mixed into the group list) makes
/// the pooling branch an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    /// One of the closed set of real ethnic groups.
    Real(EthnicGroup),
    /// Pooled rate across all real groups.
    Average,
}

impl Group {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Real(group) => group.label(),
            Self::Average => "Average",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifies a kind of statistical dataset. Stable and known at compile
/// time — endpoint resolution and payload decoding match exhaustively on
/// this enum so a new dataset cannot be half-wired.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetKey {
    /// Agency name and census profile.
    AgencyDetails,
    /// Traffic stops per year per group.
    Stops,
    /// Searches per year per group.
    Searches,
    /// Stops per year per group, broken down by stop purpose.
    StopsByReason,
    /// Searches per year per group, broken down by search type.
    SearchesByType,
    /// Use-of-force incidents per year per group.
    UseOfForce,
    /// Composite contraband/searches dataset for hit-rate charts.
    ContrabandHitRate,
}

impl DatasetKey {
    /// All dataset keys.
    pub const ALL: &[Self] = &[
        Self::AgencyDetails,
        Self::Stops,
        Self::Searches,
        Self::StopsByReason,
        Self::SearchesByType,
        Self::UseOfForce,
        Self::ContrabandHitRate,
    ];
}

/// Whose data is being viewed. Officer scope is always nested under an
/// agency — it narrows the same endpoints with a query parameter rather
/// than changing the dataset key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityScope {
    /// Agency identifier. Must be non-empty.
    pub agency_id: String,
    /// Officer identifier within the agency, if viewing a single officer.
    pub officer_id: Option<String>,
}

impl EntityScope {
    /// Scope for a whole agency.
    #[must_use]
    pub fn agency(agency_id: impl Into<String>) -> Self {
        Self {
            agency_id: agency_id.into(),
            officer_id: None,
        }
    }

    /// Scope for one officer within an agency.
    #[must_use]
    pub fn officer(agency_id: impl Into<String>, officer_id: impl Into<String>) -> Self {
        Self {
            agency_id: agency_id.into(),
            officer_id: Some(officer_id.into()),
        }
    }
}

/// Per-group counts. Missing keys deserialize to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupCounts {
    #[serde(default)]
    pub white: u64,
    #[serde(default)]
    pub black: u64,
    #[serde(default)]
    pub hispanic: u64,
    #[serde(default)]
    pub asian: u64,
    #[serde(default)]
    pub native_american: u64,
    #[serde(default)]
    pub other: u64,
}

impl GroupCounts {
    /// The count for one group.
    #[must_use]
    pub const fn count(&self, group: EthnicGroup) -> u64 {
        match group {
            EthnicGroup::White => self.white,
            EthnicGroup::Black => self.black,
            EthnicGroup::Hispanic => self.hispanic,
            EthnicGroup::Asian => self.asian,
            EthnicGroup::NativeAmerican => self.native_american,
            EthnicGroup::Other => self.other,
        }
    }

    /// Sum across every group.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.white + self.black + self.hispanic + self.asian + self.native_american + self.other
    }
}

/// One year's counts for each ethnic group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyRecord {
    pub year: u16,
    #[serde(flatten)]
    pub counts: GroupCounts,
}

impl YearlyRecord {
    /// The count for one group, zero when absent from the payload.
    #[must_use]
    pub const fn count(&self, group: EthnicGroup) -> u64 {
        self.counts.count(group)
    }
}

/// One year's counts for a single stop purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopPurposeRecord {
    pub purpose: String,
    pub year: u16,
    #[serde(flatten)]
    pub counts: GroupCounts,
}

/// One year's counts for a single search type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTypeRecord {
    pub search_type: String,
    pub year: u16,
    #[serde(flatten)]
    pub counts: GroupCounts,
}

/// Census population profile for an agency's jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusProfile {
    pub total: u64,
    #[serde(flatten)]
    pub counts: GroupCounts,
}

/// Agency name plus optional census profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgencyDetails {
    pub name: String,
    #[serde(default)]
    pub census_profile: Option<CensusProfile>,
}

/// Payload for [`DatasetKey::StopsByReason`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopsByReasonPayload {
    pub stops: Vec<StopPurposeRecord>,
    #[serde(default)]
    pub searches: Vec<StopPurposeRecord>,
}

/// Payload for [`DatasetKey::ContrabandHitRate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContrabandHitRatePayload {
    pub contraband: Vec<YearlyRecord>,
    pub searches: Vec<YearlyRecord>,
    #[serde(default)]
    pub contraband_types: Vec<YearlyRecord>,
}

/// A successfully decoded dataset payload.
///
/// Decoding is typed per key so a malformed body fails at the fetch
/// boundary instead of leaking undefined values into aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetPayload {
    AgencyDetails(AgencyDetails),
    StopsByReason(StopsByReasonPayload),
    ContrabandHitRate(ContrabandHitRatePayload),
    SearchesByType(Vec<SearchTypeRecord>),
    Yearly(Vec<YearlyRecord>),
}

impl DatasetPayload {
    /// Decodes a raw JSON body into the payload shape for `key`.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the body does not
    /// match the expected shape for the key.
    pub fn from_json(
        key: DatasetKey,
        value: serde_json::Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match key {
            DatasetKey::AgencyDetails => Self::AgencyDetails(serde_json::from_value(value)?),
            DatasetKey::Stops | DatasetKey::Searches | DatasetKey::UseOfForce => {
                Self::Yearly(serde_json::from_value(value)?)
            }
            DatasetKey::StopsByReason => Self::StopsByReason(serde_json::from_value(value)?),
            DatasetKey::SearchesByType => Self::SearchesByType(serde_json::from_value(value)?),
            DatasetKey::ContrabandHitRate => {
                Self::ContrabandHitRate(serde_json::from_value(value)?)
            }
        })
    }

    /// The yearly records, for keys whose payload is a plain yearly series.
    #[must_use]
    pub fn as_yearly(&self) -> Option<&[YearlyRecord]> {
        match self {
            Self::Yearly(records) => Some(records),
            _ => None,
        }
    }

    /// The agency details, if this is an [`DatasetKey::AgencyDetails`] payload.
    #[must_use]
    pub const fn as_agency_details(&self) -> Option<&AgencyDetails> {
        match self {
            Self::AgencyDetails(details) => Some(details),
            _ => None,
        }
    }

    /// The stops-by-reason payload, if applicable.
    #[must_use]
    pub const fn as_stops_by_reason(&self) -> Option<&StopsByReasonPayload> {
        match self {
            Self::StopsByReason(payload) => Some(payload),
            _ => None,
        }
    }

    /// The search-type records, if applicable.
    #[must_use]
    pub fn as_searches_by_type(&self) -> Option<&[SearchTypeRecord]> {
        match self {
            Self::SearchesByType(records) => Some(records),
            _ => None,
        }
    }

    /// The contraband hit-rate payload, if applicable.
    #[must_use]
    pub const fn as_contraband_hit_rate(&self) -> Option<&ContrabandHitRatePayload> {
        match self {
            Self::ContrabandHitRate(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Year subset for locally-recomputed views. Never triggers a re-fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearFilter {
    /// Aggregate across every year in the dataset.
    #[default]
    All,
    /// A single year.
    Year(u16),
}

/// Query parameters that scope a fetch. Changing any of these invalidates
/// the cached entry for a key and triggers a re-fetch; everything else
/// (year subset, group toggles) is recomputed locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    /// Officer id, when viewing a single officer's slice of the agency.
    pub officer: Option<String>,
    /// Start of an optional reporting date range.
    pub from: Option<NaiveDate>,
    /// End of an optional reporting date range.
    pub to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_group_counts_deserialize_to_zero() {
        let record: YearlyRecord =
            serde_json::from_value(json!({ "year": 2020, "white": 80, "black": 20 })).unwrap();
        assert_eq!(record.count(EthnicGroup::White), 80);
        assert_eq!(record.count(EthnicGroup::Black), 20);
        assert_eq!(record.count(EthnicGroup::Hispanic), 0);
        assert_eq!(record.count(EthnicGroup::NativeAmerican), 0);
        assert_eq!(record.counts.total(), 100);
    }

    #[test]
    fn dataset_key_round_trips_through_strings() {
        for key in DatasetKey::ALL {
            let parsed: DatasetKey = key.to_string().parse().unwrap();
            assert_eq!(parsed, *key);
        }
        assert_eq!(DatasetKey::ContrabandHitRate.to_string(), "CONTRABAND_HIT_RATE");
    }

    #[test]
    fn decodes_yearly_payload_for_stops() {
        let payload = DatasetPayload::from_json(
            DatasetKey::Stops,
            json!([{ "year": 2019, "white": 1 }, { "year": 2020, "black": 2 }]),
        )
        .unwrap();
        let records = payload.as_yearly().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].count(EthnicGroup::Black), 2);
    }

    #[test]
    fn decodes_stops_by_reason_payload() {
        let payload = DatasetPayload::from_json(
            DatasetKey::StopsByReason,
            json!({
                "stops": [{ "purpose": "Speed Limit Violation", "year": 2020, "white": 5 }],
                "searches": []
            }),
        )
        .unwrap();
        let reason = payload.as_stops_by_reason().unwrap();
        assert_eq!(reason.stops[0].purpose, "Speed Limit Violation");
        assert_eq!(reason.stops[0].counts.count(EthnicGroup::White), 5);
    }

    #[test]
    fn decodes_contraband_hit_rate_payload_without_types() {
        let payload = DatasetPayload::from_json(
            DatasetKey::ContrabandHitRate,
            json!({
                "contraband": [{ "year": 2020, "white": 2 }],
                "searches": [{ "year": 2020, "white": 10 }]
            }),
        )
        .unwrap();
        let hit_rate = payload.as_contraband_hit_rate().unwrap();
        assert!(hit_rate.contraband_types.is_empty());
    }

    #[test]
    fn rejects_malformed_payload_shape() {
        let result = DatasetPayload::from_json(
            DatasetKey::Stops,
            json!({ "unexpected": "object instead of array" }),
        );
        assert!(result.is_err());
    }

    #[test]
    fn officer_scope_keeps_agency_id() {
        let scope = EntityScope::officer("66", "123");
        assert_eq!(scope.agency_id, "66");
        assert_eq!(scope.officer_id.as_deref(), Some("123"));
    }
}
