//! Fetch orchestrator: resolves endpoints, issues requests, and drives the
//! dataset store.
//!
//! One orchestrator is scoped to a single [`EntityScope`] and owns that
//! entity's [`DatasetStore`]. Viewing a different agency or officer means
//! building a fresh orchestrator — there is no cross-entity cache.
//!
//! Any number of consumers may call [`FetchOrchestrator::ensure`] for the
//! same key concurrently; identical in-flight requests are not duplicated,
//! and superseded responses are dropped by the store's token check. The
//! store mutex is held only across event application, never across an
//! await.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use traffic_stops_datasets_models::{
    DatasetKey, DatasetPayload, EntityScope, QueryParams,
};
use traffic_stops_store::{DatasetEntry, DatasetStore, StoreEvent};

use crate::client::HttpClient;
use crate::{FetchError, endpoints, rules};

/// Drives dataset fetches for one agency/officer view.
pub struct FetchOrchestrator {
    scope: EntityScope,
    base_url: String,
    client: Arc<dyn HttpClient>,
    store: Mutex<DatasetStore>,
}

impl FetchOrchestrator {
    /// Creates an orchestrator with an empty store for `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidScope`] when the agency id is empty.
    pub fn new(
        scope: EntityScope,
        base_url: impl Into<String>,
        client: Arc<dyn HttpClient>,
    ) -> Result<Self, FetchError> {
        if scope.agency_id.trim().is_empty() {
            return Err(FetchError::InvalidScope {
                message: "agency id must be non-empty".to_string(),
            });
        }
        Ok(Self {
            scope,
            base_url: base_url.into(),
            client,
            store: Mutex::new(DatasetStore::new()),
        })
    }

    /// The entity this orchestrator is scoped to.
    #[must_use]
    pub const fn scope(&self) -> &EntityScope {
        &self.scope
    }

    /// Ensures a dataset is fetched (or re-fetched) for the given query
    /// parameters.
    ///
    /// Safe to invoke redundantly from multiple consumers: when the entry
    /// is already loaded or an identical request is in flight, this
    /// returns without issuing anything. Failures never propagate — they
    /// land in the store as error state for the one affected key.
    pub async fn ensure(&self, key: DatasetKey, params: &QueryParams) {
        let token = {
            let mut store = self.lock_store();
            if !rules::should_refetch(store.get(key), params) {
                return;
            }
            let token = store.issue_token(key);
            store.apply(StoreEvent::FetchStarted {
                key,
                token,
                params: params.clone(),
            });
            token
        };

        let url = endpoints::dataset_url(&self.base_url, key, &self.scope, params);
        log::debug!("fetching {key} (token {token}) from {url}");

        let event = match self.fetch_payload(key, &url).await {
            Ok(payload) => StoreEvent::FetchSucceeded {
                key,
                token,
                payload,
            },
            Err(e) => StoreEvent::FetchFailed {
                key,
                token,
                message: e.to_string(),
            },
        };
        self.lock_store().apply(event);
    }

    async fn fetch_payload(&self, key: DatasetKey, url: &str) -> Result<DatasetPayload, FetchError> {
        let body = self.client.get_json(url).await?;
        // Validate the shape here so aggregation never sees a payload with
        // missing fields — a mismatch is a fetch failure like any other.
        DatasetPayload::from_json(key, body).map_err(|e| FetchError::MalformedPayload {
            key,
            message: e.to_string(),
        })
    }

    /// Read-only snapshot of one entry.
    #[must_use]
    pub fn entry(&self, key: DatasetKey) -> DatasetEntry {
        self.lock_store().get(key).clone()
    }

    /// The last successful payload for a key, if any.
    #[must_use]
    pub fn payload(&self, key: DatasetKey) -> Option<DatasetPayload> {
        self.lock_store().payload(key).cloned()
    }

    /// `true` when any of the named keys has a request in flight.
    #[must_use]
    pub fn is_loading(&self, keys: &[DatasetKey]) -> bool {
        self.lock_store().is_loading(keys)
    }

    /// `true` when any of the named keys is in the error state.
    #[must_use]
    pub fn has_error(&self, keys: &[DatasetKey]) -> bool {
        self.lock_store().has_error(keys)
    }

    /// Runs a closure against the store without cloning payloads out.
    pub fn with_store<R>(&self, f: impl FnOnce(&DatasetStore) -> R) -> R {
        f(&self.lock_store())
    }

    fn lock_store(&self) -> MutexGuard<'_, DatasetStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use traffic_stops_store::FetchStatus;

    type Handler = Box<dyn Fn(&str) -> (Duration, Result<serde_json::Value, u16>) + Send + Sync>;

    struct MockClient {
        handler: Handler,
        calls: AtomicUsize,
    }

    impl MockClient {
        fn new(
            handler: impl Fn(&str) -> (Duration, Result<serde_json::Value, u16>)
            + Send
            + Sync
            + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                handler: Box::new(handler),
                calls: AtomicUsize::new(0),
            })
        }

        fn immediate(value: serde_json::Value) -> Arc<Self> {
            Self::new(move |_| (Duration::ZERO, Ok(value.clone())))
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HttpClient for MockClient {
        async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let (delay, result) = (self.handler)(url);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result.map_err(|status| FetchError::Status {
                status: reqwest::StatusCode::from_u16(status).unwrap(),
            })
        }
    }

    fn orchestrator(client: Arc<dyn HttpClient>) -> FetchOrchestrator {
        FetchOrchestrator::new(EntityScope::agency("66"), "http://localhost:8000", client)
            .unwrap()
    }

    fn stops_body(white: u64) -> serde_json::Value {
        json!([{ "year": 2020, "white": white, "black": 20 }])
    }

    #[test]
    fn rejects_empty_agency_id() {
        let client = MockClient::immediate(json!([]));
        let result =
            FetchOrchestrator::new(EntityScope::agency("  "), "http://localhost:8000", client);
        assert!(matches!(result, Err(FetchError::InvalidScope { .. })));
    }

    #[tokio::test]
    async fn fetch_lands_in_the_store_as_success() {
        let client = MockClient::immediate(stops_body(80));
        let orchestrator = orchestrator(client);

        orchestrator
            .ensure(DatasetKey::Stops, &QueryParams::default())
            .await;

        let entry = orchestrator.entry(DatasetKey::Stops);
        assert_eq!(entry.status, FetchStatus::Success);
        let payload = entry.payload.unwrap();
        let records = payload.as_yearly().unwrap();
        assert_eq!(records[0].year, 2020);
    }

    #[tokio::test]
    async fn concurrent_consumers_share_one_request() {
        let client = MockClient::new(|_| (Duration::from_millis(10), Ok(stops_body(80))));
        let orchestrator = orchestrator(client.clone());

        let params = QueryParams::default();
        tokio::join!(
            orchestrator.ensure(DatasetKey::Stops, &params),
            orchestrator.ensure(DatasetKey::Stops, &params),
            orchestrator.ensure(DatasetKey::Stops, &params),
        );

        assert_eq!(client.call_count(), 1);
        assert_eq!(
            orchestrator.entry(DatasetKey::Stops).status,
            FetchStatus::Success
        );
    }

    #[tokio::test]
    async fn redundant_ensure_after_success_does_not_refetch() {
        let client = MockClient::immediate(stops_body(80));
        let orchestrator = orchestrator(client.clone());

        let params = QueryParams::default();
        orchestrator.ensure(DatasetKey::Stops, &params).await;
        orchestrator.ensure(DatasetKey::Stops, &params).await;

        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn param_change_triggers_a_refetch() {
        let client = MockClient::immediate(stops_body(80));
        let orchestrator = orchestrator(client.clone());

        orchestrator
            .ensure(DatasetKey::Stops, &QueryParams::default())
            .await;
        let officer = QueryParams {
            officer: Some("123".to_string()),
            from: None,
            to: None,
        };
        orchestrator.ensure(DatasetKey::Stops, &officer).await;

        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test]
    async fn slower_superseded_response_is_dropped() {
        // The first request (no officer) is slow; the second (officer
        // scoped) is fast and newer. The store must end up with the
        // second result even though the first resolves last.
        let client = MockClient::new(|url| {
            if url.contains("officer=") {
                (Duration::from_millis(5), Ok(stops_body(11)))
            } else {
                (Duration::from_millis(50), Ok(stops_body(99)))
            }
        });
        let orchestrator = orchestrator(client.clone());

        let officer = QueryParams {
            officer: Some("123".to_string()),
            from: None,
            to: None,
        };
        let default_params = QueryParams::default();
        tokio::join!(
            orchestrator.ensure(DatasetKey::Stops, &default_params),
            orchestrator.ensure(DatasetKey::Stops, &officer),
        );

        assert_eq!(client.call_count(), 2);
        let payload = orchestrator.payload(DatasetKey::Stops).unwrap();
        let records = payload.as_yearly().unwrap();
        assert_eq!(
            records[0].count(traffic_stops_datasets_models::EthnicGroup::White),
            11
        );
    }

    #[tokio::test]
    async fn failure_is_store_state_not_a_panic_or_propagated_error() {
        let client = MockClient::new(|_| (Duration::ZERO, Err(500)));
        let orchestrator = orchestrator(client);

        orchestrator
            .ensure(DatasetKey::UseOfForce, &QueryParams::default())
            .await;

        let entry = orchestrator.entry(DatasetKey::UseOfForce);
        assert_eq!(entry.status, FetchStatus::Error);
        assert!(entry.error_message.unwrap().contains("HTTP 500"));
        // Other keys are unaffected.
        assert_eq!(
            orchestrator.entry(DatasetKey::Stops).status,
            FetchStatus::Idle
        );
    }

    #[tokio::test]
    async fn malformed_payload_is_converted_to_fetch_failure() {
        // Valid JSON, wrong shape for the key.
        let client = MockClient::immediate(json!({ "unexpected": true }));
        let orchestrator = orchestrator(client);

        orchestrator
            .ensure(DatasetKey::Stops, &QueryParams::default())
            .await;

        let entry = orchestrator.entry(DatasetKey::Stops);
        assert_eq!(entry.status, FetchStatus::Error);
        assert!(entry.error_message.unwrap().contains("malformed"));
        assert!(entry.payload.is_none());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_payload() {
        let client = MockClient::new(|url| {
            if url.contains("officer=") {
                (Duration::ZERO, Err(502))
            } else {
                (Duration::ZERO, Ok(stops_body(80)))
            }
        });
        let orchestrator = orchestrator(client);

        orchestrator
            .ensure(DatasetKey::Stops, &QueryParams::default())
            .await;
        let officer = QueryParams {
            officer: Some("123".to_string()),
            from: None,
            to: None,
        };
        orchestrator.ensure(DatasetKey::Stops, &officer).await;

        let entry = orchestrator.entry(DatasetKey::Stops);
        assert_eq!(entry.status, FetchStatus::Error);
        // Stale data keeps rendering under the error banner.
        assert!(entry.payload.is_some());
    }
}
