#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-entity dataset cache and fetch state machine.
//!
//! One [`DatasetStore`] holds the fetch state for every [`DatasetKey`] of a
//! single agency/officer view. The store is driven exclusively by
//! [`StoreEvent`]s applied through a reducer; charts only ever read
//! snapshots. Re-scoping the view to a different entity means discarding
//! the whole store and creating a fresh one.
//!
//! Responses for the same key are ordered by a per-key monotonic request
//! token: a slower response issued earlier loses to a faster response
//! issued later and is dropped on arrival. There is no cancelled state.

use std::collections::BTreeMap;

use traffic_stops_datasets_models::{DatasetKey, DatasetPayload, QueryParams};

/// Fetch state for a single dataset entry. Exactly one holds at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchStatus {
    /// No fetch issued yet.
    #[default]
    Idle,
    /// A request is in flight.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed.
    Error,
}

/// Cached fetch state for one dataset key.
///
/// `payload` survives `Loading` and `Error` transitions: a chart mid-refresh
/// keeps showing its last good data instead of flashing to empty, and a
/// failed refresh renders the stale data under an error banner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetEntry {
    pub status: FetchStatus,
    /// Last successful payload, retained across later transitions.
    pub payload: Option<DatasetPayload>,
    /// Human-readable message from the last failure.
    pub error_message: Option<String>,
    /// Token of the most recently issued request for this key.
    latest_token: u64,
    /// Query params the most recent request was issued with.
    requested_params: Option<QueryParams>,
}

impl DatasetEntry {
    /// Token of the most recently issued request for this key.
    #[must_use]
    pub const fn latest_token(&self) -> u64 {
        self.latest_token
    }

    /// Query params of the most recently issued request, if any.
    #[must_use]
    pub const fn requested_params(&self) -> Option<&QueryParams> {
        self.requested_params.as_ref()
    }
}

/// An event driving the store's state machine. Only the fetch layer
/// produces these; every mutation of the store goes through
/// [`DatasetStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// A request was issued for `key` with a fresh per-key `token`.
    FetchStarted {
        key: DatasetKey,
        token: u64,
        params: QueryParams,
    },
    /// The request identified by `token` resolved with a decoded payload.
    FetchSucceeded {
        key: DatasetKey,
        token: u64,
        payload: DatasetPayload,
    },
    /// The request identified by `token` failed.
    FetchFailed {
        key: DatasetKey,
        token: u64,
        message: String,
    },
}

/// Keyed cache of fetch state for one entity's session.
#[derive(Debug, Default)]
pub struct DatasetStore {
    entries: BTreeMap<DatasetKey, DatasetEntry>,
}

impl DatasetStore {
    /// Creates an empty store with every key `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DatasetKey::ALL
                .iter()
                .map(|key| (*key, DatasetEntry::default()))
                .collect(),
        }
    }

    /// Read-only snapshot of one entry.
    ///
    /// # Panics
    ///
    /// Never panics: every key is seeded at construction.
    #[must_use]
    pub fn get(&self, key: DatasetKey) -> &DatasetEntry {
        self.entries
            .get(&key)
            .unwrap_or_else(|| unreachable!("store is seeded with every dataset key"))
    }

    /// The last successful payload for a key, if any.
    #[must_use]
    pub fn payload(&self, key: DatasetKey) -> Option<&DatasetPayload> {
        self.get(key).payload.as_ref()
    }

    /// `true` when *any* of the named keys has a request in flight.
    /// Charts that depend on several datasets at once gate on this.
    #[must_use]
    pub fn is_loading(&self, keys: &[DatasetKey]) -> bool {
        keys.iter()
            .any(|key| self.get(*key).status == FetchStatus::Loading)
    }

    /// `true` when *any* of the named keys is in the error state.
    #[must_use]
    pub fn has_error(&self, keys: &[DatasetKey]) -> bool {
        keys.iter()
            .any(|key| self.get(*key).status == FetchStatus::Error)
    }

    /// Issues the next request token for a key. Tokens are strictly
    /// increasing per key; terminal events carrying an older token are
    /// ignored by [`apply`](Self::apply).
    pub fn issue_token(&mut self, key: DatasetKey) -> u64 {
        self.entry_mut(key).latest_token + 1
    }

    /// Applies one event to the store.
    ///
    /// Stale terminal events (token below the latest issued token for the
    /// key) are dropped so that responses land in request-issuance order.
    pub fn apply(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::FetchStarted { key, token, params } => {
                let entry = self.entry_mut(key);
                debug_assert!(token > entry.latest_token, "tokens must be monotonic");
                entry.status = FetchStatus::Loading;
                entry.latest_token = token;
                entry.requested_params = Some(params);
                // payload and error_message are retained until the next
                // terminal state lands.
            }
            StoreEvent::FetchSucceeded {
                key,
                token,
                payload,
            } => {
                let entry = self.entry_mut(key);
                if token != entry.latest_token {
                    log::debug!("dropping stale response for {key} (token {token})");
                    return;
                }
                entry.status = FetchStatus::Success;
                entry.payload = Some(payload);
                entry.error_message = None;
            }
            StoreEvent::FetchFailed {
                key,
                token,
                message,
            } => {
                let entry = self.entry_mut(key);
                if token != entry.latest_token {
                    log::debug!("dropping stale failure for {key} (token {token})");
                    return;
                }
                log::warn!("fetch for {key} failed: {message}");
                entry.status = FetchStatus::Error;
                entry.error_message = Some(message);
                // payload is left untouched so a chart that already had
                // data keeps rendering it with an error banner overlay.
            }
        }
    }

    fn entry_mut(&mut self, key: DatasetKey) -> &mut DatasetEntry {
        self.entries.entry(key).or_default()
    }
}
