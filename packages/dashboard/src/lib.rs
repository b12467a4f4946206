#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-agency dashboard sessions binding datasets to derived chart series.
//!
//! An [`AgencyDashboard`] is the consumer contract charts program against:
//! declare which dataset keys a chart needs, get back a
//! [`ChartSnapshot`] (`loading`/`error`/data presence) plus recompute
//! calls that turn the cached payloads into derived series under the
//! current filter and group selection. Charts never read raw payloads —
//! everything numeric goes through the aggregation engine.
//!
//! The session is scoped to one entity; navigating to a different agency
//! or officer discards the whole dataset store.

use std::sync::Arc;

use traffic_stops_aggregate::series::{BaselineComparison, GroupTimeSeries, SeriesPoint};
use traffic_stops_aggregate::{breakdown, charts, rates};
use traffic_stops_datasets_models::{
    DatasetKey, DatasetPayload, EntityScope, EthnicGroup, Group, YearlyRecord,
};
use traffic_stops_fetch::client::{HttpClient, ReqwestClient};
use traffic_stops_fetch::orchestrator::FetchOrchestrator;
use traffic_stops_fetch::FetchError;
use traffic_stops_selection::{FilterState, GroupSelection};
use traffic_stops_store::FetchStatus;

/// The group disparity rates are compared against.
pub const BASELINE_GROUP: EthnicGroup = EthnicGroup::White;

/// User-facing explanation for [`BaselineComparison::NoBaselineData`].
pub const NO_BASELINE_EXPLANATION: &str = "This department has not reported searching anyone \
     in the baseline group for the selected period — no comparison is possible.";

/// Errors that can occur while setting up a dashboard session.
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The fetch layer rejected the session parameters.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// What a chart needs to know before touching derived data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSnapshot {
    /// Any of the chart's datasets has a request in flight.
    pub loading: bool,
    /// First error message among the chart's datasets, if any.
    pub error: Option<String>,
    /// Every dataset the chart needs has a payload available.
    pub has_data: bool,
}

/// One agency/officer view session over the dataset pipeline.
pub struct AgencyDashboard {
    orchestrator: FetchOrchestrator,
    base_url: String,
    client: Arc<dyn HttpClient>,
}

impl AgencyDashboard {
    /// Creates a session for `scope` using the given HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] when the scope is invalid.
    pub fn new(
        scope: EntityScope,
        base_url: impl Into<String>,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, DashboardError> {
        let base_url = base_url.into();
        let orchestrator = FetchOrchestrator::new(scope, base_url.clone(), client.clone())?;
        Ok(Self {
            orchestrator,
            base_url,
            client,
        })
    }

    /// Creates a session backed by the default retrying HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] when the scope is invalid or the HTTP
    /// client cannot be built.
    pub fn connect(
        scope: EntityScope,
        base_url: impl Into<String>,
    ) -> Result<Self, DashboardError> {
        let client = Arc::new(ReqwestClient::new()?);
        Self::new(scope, base_url, client)
    }

    /// The entity this session is scoped to.
    #[must_use]
    pub const fn scope(&self) -> &EntityScope {
        self.orchestrator.scope()
    }

    /// Re-scopes the session to a different entity, discarding every
    /// cached dataset. Charts start over from `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`DashboardError`] when the new scope is invalid; the old
    /// session state is kept in that case.
    pub fn rescope(&mut self, scope: EntityScope) -> Result<(), DashboardError> {
        log::info!(
            "re-scoping dashboard from agency {} to agency {}",
            self.orchestrator.scope().agency_id,
            scope.agency_id,
        );
        self.orchestrator =
            FetchOrchestrator::new(scope, self.base_url.clone(), self.client.clone())?;
        Ok(())
    }

    /// Fetches (or re-fetches, when the filter's query-relevant parts
    /// changed) every named dataset. Redundant calls are cheap: already
    /// cached or in-flight keys are skipped. Datasets load independently —
    /// one slow or failing key never blocks the others.
    pub async fn load(&self, keys: &[DatasetKey], filter: &FilterState) {
        let params = filter.query_params(self.scope().officer_id.as_deref());
        futures::future::join_all(
            keys.iter()
                .map(|key| self.orchestrator.ensure(*key, &params)),
        )
        .await;
    }

    /// Loading/error/data state for a chart depending on the named keys.
    #[must_use]
    pub fn snapshot(&self, keys: &[DatasetKey]) -> ChartSnapshot {
        self.orchestrator.with_store(|store| ChartSnapshot {
            loading: store.is_loading(keys),
            error: keys
                .iter()
                .find_map(|key| {
                    let entry = store.get(*key);
                    (entry.status == FetchStatus::Error)
                        .then(|| entry.error_message.clone())
                        .flatten()
                }),
            has_data: keys.iter().all(|key| store.payload(*key).is_some()),
        })
    }

    /// "No stops have been reported" style message for an all-zero (but
    /// successfully fetched) dataset. `None` while the dataset is missing
    /// or has any nonzero count.
    #[must_use]
    pub fn no_data_message(&self, key: DatasetKey) -> Option<&'static str> {
        let empty = self
            .orchestrator
            .with_store(|store| store.payload(key).map(payload_is_empty))?;
        if !empty {
            return None;
        }
        Some(match key {
            DatasetKey::Stops | DatasetKey::StopsByReason => "No stops have been reported",
            DatasetKey::Searches | DatasetKey::SearchesByType => "No searches have been reported",
            DatasetKey::UseOfForce => "No use of force has been reported",
            DatasetKey::ContrabandHitRate => "No contraband has been reported",
            DatasetKey::AgencyDetails => "No data has been reported",
        })
    }

    /// Overview breakdown pie for a plain yearly dataset (stops, searches,
    /// use of force), under the filter's year subset.
    #[must_use]
    pub fn overview_breakdown(
        &self,
        key: DatasetKey,
        filter: &FilterState,
    ) -> Option<Vec<SeriesPoint>> {
        self.with_yearly(key, |records| {
            breakdown::breakdown(records, filter.year, EthnicGroup::ALL)
        })
    }

    /// Census population breakdown from the agency details profile.
    #[must_use]
    pub fn census_breakdown(&self) -> Option<Vec<SeriesPoint>> {
        let payload = self.orchestrator.payload(DatasetKey::AgencyDetails)?;
        let profile = payload.as_agency_details()?.census_profile?;
        Some(charts::census_breakdown(&profile, EthnicGroup::ALL))
    }

    /// Stops-by-percentage stacked series for the selected groups.
    #[must_use]
    pub fn stops_by_percentage(
        &self,
        selection: &GroupSelection,
    ) -> Option<Vec<GroupTimeSeries>> {
        let groups = selection.selected_groups();
        self.with_yearly(DatasetKey::Stops, |records| {
            breakdown::stacked_percentages_by_year(records, &groups)
        })
    }

    /// Stops-by-count lines for the selected groups, optionally narrowed
    /// to a single stop purpose.
    #[must_use]
    pub fn stops_by_count(
        &self,
        filter: &FilterState,
        selection: &GroupSelection,
    ) -> Option<Vec<GroupTimeSeries>> {
        let groups = selection.selected_groups();
        if let Some(purpose) = &filter.stop_purpose {
            let payload = self.orchestrator.payload(DatasetKey::StopsByReason)?;
            let reason = payload.as_stops_by_reason()?;
            let records = charts::filter_single_purpose(&reason.stops, purpose);
            Some(charts::counts_by_year(&records, &groups))
        } else {
            self.with_yearly(DatasetKey::Stops, |records| {
                charts::counts_by_year(records, &groups)
            })
        }
    }

    /// Searches-by-count lines, optionally narrowed to one search type.
    #[must_use]
    pub fn searches_by_count(
        &self,
        filter: &FilterState,
        selection: &GroupSelection,
    ) -> Option<Vec<GroupTimeSeries>> {
        let groups = selection.selected_groups();
        if let Some(search_type) = &filter.search_type {
            let payload = self.orchestrator.payload(DatasetKey::SearchesByType)?;
            let records =
                charts::filter_single_search_type(payload.as_searches_by_type()?, search_type);
            Some(charts::counts_by_year(&records, &groups))
        } else {
            self.with_yearly(DatasetKey::Searches, |records| {
                charts::counts_by_year(records, &groups)
            })
        }
    }

    /// Departmental search rate lines (searches over stops) per selected
    /// group, plus the pooled average line.
    #[must_use]
    pub fn search_rate(&self, selection: &GroupSelection) -> Option<Vec<GroupTimeSeries>> {
        let searches = self.yearly_payload(DatasetKey::Searches)?;
        let stops = self.yearly_payload(DatasetKey::Stops)?;
        let years = charts::available_years(&stops);
        let mut groups: Vec<Group> = selection
            .selected_groups()
            .into_iter()
            .map(Group::Real)
            .collect();
        groups.push(Group::Average);
        Some(charts::rate_series(
            &searches,
            &stops,
            &years,
            &groups,
            EthnicGroup::ALL,
        ))
    }

    /// Contraband hit-rate bars for the selected groups under the filter's
    /// year subset.
    #[must_use]
    pub fn contraband_hit_rate(
        &self,
        filter: &FilterState,
        selection: &GroupSelection,
    ) -> Option<Vec<SeriesPoint>> {
        let payload = self.orchestrator.payload(DatasetKey::ContrabandHitRate)?;
        let hit_rate = payload.as_contraband_hit_rate()?;
        Some(charts::hit_rate_bars(
            hit_rate,
            filter.year,
            &selection.selected_groups(),
        ))
    }

    /// Likelihood-of-search comparison of every group against the baseline
    /// group, under the filter's year subset. Yields
    /// [`BaselineComparison::NoBaselineData`] rows (see
    /// [`NO_BASELINE_EXPLANATION`]) when the baseline has no usable rate
    /// anywhere in scope.
    #[must_use]
    pub fn likelihood_of_search(
        &self,
        filter: &FilterState,
    ) -> Option<Vec<(EthnicGroup, BaselineComparison)>> {
        let searches = self.yearly_payload(DatasetKey::Searches)?;
        let stops = self.yearly_payload(DatasetKey::Stops)?;
        Some(rates::baseline_comparisons(
            &searches,
            &stops,
            filter.year,
            EthnicGroup::ALL,
            BASELINE_GROUP,
        ))
    }

    fn yearly_payload(&self, key: DatasetKey) -> Option<Vec<YearlyRecord>> {
        self.orchestrator
            .payload(key)
            .and_then(|payload| payload.as_yearly().map(<[YearlyRecord]>::to_vec))
    }

    fn with_yearly<R>(&self, key: DatasetKey, f: impl FnOnce(&[YearlyRecord]) -> R) -> Option<R> {
        self.orchestrator
            .with_store(|store| store.payload(key).and_then(DatasetPayload::as_yearly).map(f))
    }
}

/// Whether every count in a payload is zero, per payload shape. An
/// all-zero payload renders as "no data reported", not as an error.
fn payload_is_empty(payload: &DatasetPayload) -> bool {
    match payload {
        DatasetPayload::Yearly(records) => {
            breakdown::is_empty_dataset(records, EthnicGroup::ALL)
        }
        // Emptiness follows what the chart displays: hit-rate bars show
        // contraband, reason/type charts show their record vectors.
        DatasetPayload::ContrabandHitRate(hit_rate) => {
            breakdown::is_empty_dataset(&hit_rate.contraband, EthnicGroup::ALL)
        }
        DatasetPayload::StopsByReason(reason) => {
            reason.stops.iter().all(|record| record.counts.total() == 0)
        }
        DatasetPayload::SearchesByType(records) => {
            records.iter().all(|record| record.counts.total() == 0)
        }
        DatasetPayload::AgencyDetails(_) => false,
    }
}
