//! Declarative re-fetch rule.
//!
//! Whether a dataset needs (re-)fetching is a pure function of the entry's
//! current state and the requested query parameters, evaluated on every
//! consumer invocation. Re-fetches are parameter-driven only — there is no
//! polling and no refresh-on-interval.

use traffic_stops_datasets_models::QueryParams;
use traffic_stops_store::{DatasetEntry, FetchStatus};

/// `true` when a new request must be issued for this entry.
///
/// - `Idle`: always fetch.
/// - `Loading` with the same params: an identical request is already in
///   flight — redundant consumers piggyback on it instead of duplicating
///   the network call.
/// - `Loading`/`Success`/`Error` with different params: the relevant query
///   parameters changed since the last issued request, so fetch again (the
///   newer request supersedes any in-flight one via its higher token).
/// - `Success`/`Error` with the same params: keep the cached result; an
///   errored entry is retried only by an explicit parameter change or a
///   fresh store.
#[must_use]
pub fn should_refetch(entry: &DatasetEntry, params: &QueryParams) -> bool {
    match entry.status {
        FetchStatus::Idle => true,
        FetchStatus::Loading | FetchStatus::Success | FetchStatus::Error => {
            entry.requested_params() != Some(params)
        }
    }
}
