//! Dataset key to endpoint resolution.
//!
//! Every key maps to a path under `/api/agency/{agencyId}/`. The officer
//! id and date range scope the same endpoint through query parameters —
//! they never change which endpoint a key resolves to.

use traffic_stops_datasets_models::{DatasetKey, EntityScope, QueryParams};

/// Path segment for a dataset key under the agency endpoint.
#[must_use]
pub const fn endpoint_path(key: DatasetKey) -> &'static str {
    match key {
        DatasetKey::AgencyDetails => "",
        DatasetKey::Stops => "stops/",
        DatasetKey::Searches => "searches/",
        DatasetKey::StopsByReason => "stops_by_reason/",
        DatasetKey::SearchesByType => "searches_by_type/",
        DatasetKey::UseOfForce => "use_of_force/",
        DatasetKey::ContrabandHitRate => "contraband_hit_rate/",
    }
}

/// Full request URL for a dataset fetch.
#[must_use]
pub fn dataset_url(
    base_url: &str,
    key: DatasetKey,
    scope: &EntityScope,
    params: &QueryParams,
) -> String {
    let mut url = format!(
        "{}/api/agency/{}/{}",
        base_url.trim_end_matches('/'),
        scope.agency_id,
        endpoint_path(key),
    );

    let mut query: Vec<String> = Vec::new();
    if let Some(officer) = &params.officer {
        query.push(format!("officer={officer}"));
    }
    if let Some(from) = params.from {
        query.push(format!("from={from}"));
    }
    if let Some(to) = params.to {
        query.push(format!("to={to}"));
    }
    if !query.is_empty() {
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}
