//! The board controller: owns the displayed board, the status line and
//! the poll timer.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::board::{BoardConfig, BoardView, last_updated_line};
use crate::domain::{ApiKey, CombinedSnapshot, InvalidApiKey, SnapshotSource};
use crate::feeds::{FeedSource, fetch_cache_then_api, fetch_direct, select_snapshot};
use crate::siri::{ErrorKind, FeedError};
use crate::store::{BoardStore, KeyValueStore, StoreError};

use super::poll::{PollEvent, PollState, TimerCommand};
use super::status::StatusMessage;
use super::timer::PollTimer;

/// Default period between direct fetches.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Which sources a manual refresh may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPath {
    /// Stored snapshot, then cache, then API.
    #[default]
    Selected,
    /// Cache, then API.
    Cache,
    /// API only.
    Api,
}

/// What a refresh did to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The board now shows a snapshot from this source.
    Updated(SnapshotSource),
    /// The fetch failed.
    Failed(ErrorKind),
    /// The key changed while fetching; the result was discarded.
    Superseded,
}

/// Errors from changing the saved API key.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error(transparent)]
    Invalid(#[from] InvalidApiKey),

    #[error("failed to persist API key: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug)]
enum Shown {
    Loading,
    Failed,
    Snapshot(CombinedSnapshot),
}

#[derive(Debug)]
struct Display {
    shown: Shown,
    last_updated: Option<String>,
    status: StatusMessage,
}

#[derive(Debug)]
struct Polling {
    state: PollState,
    visible: bool,
    timer: Option<PollTimer>,
}

struct Inner<F, S> {
    feeds: F,
    config: BoardConfig,
    poll_interval: Duration,
    store: Mutex<BoardStore<S>>,
    display: RwLock<Display>,
    polling: Mutex<Polling>,
    /// Bumped on every key change; results of older fetches are dropped.
    generation: AtomicU64,
}

/// Shared handle to the board. Cheap to clone.
pub struct BoardController<F, S> {
    inner: Arc<Inner<F, S>>,
}

impl<F, S> Clone for BoardController<F, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: FeedSource, S: KeyValueStore> BoardController<F, S> {
    pub fn new(feeds: F, store: S, config: BoardConfig, poll_interval: Duration) -> Self {
        let inner = Inner {
            feeds,
            config,
            poll_interval,
            store: Mutex::new(BoardStore::new(store)),
            display: RwLock::new(Display {
                shown: Shown::Loading,
                last_updated: None,
                status: StatusMessage::NO_KEY,
            }),
            polling: Mutex::new(Polling {
                state: PollState::Idle,
                visible: true,
                timer: None,
            }),
            generation: AtomicU64::new(0),
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    /// Startup: report whether a key is saved, load the board, and start
    /// polling if a key is present.
    pub async fn start(&self) {
        let has_key = self.inner.store.lock().await.credential().is_some();
        self.set_status(if has_key {
            StatusMessage::KEY_LOADED
        } else {
            StatusMessage::NO_KEY
        })
        .await;

        self.load().await;

        if has_key {
            self.apply_event(PollEvent::CredentialSaved).await;
        }
    }

    /// Page load: stored snapshot, else cache, else API.
    pub async fn load(&self) -> RefreshOutcome {
        self.refresh(RefreshPath::Selected).await
    }

    /// Panel reload: re-read the static cache unless a key is saved, in
    /// which case the poll timer keeps the board fresh instead.
    pub async fn reload_if_idle(&self) -> Option<RefreshOutcome> {
        if self.poll_state().await != PollState::Idle {
            return None;
        }
        Some(self.refresh(RefreshPath::Cache).await)
    }

    /// One poll tick: a direct fetch.
    pub async fn poll_once(&self) -> RefreshOutcome {
        self.refresh(RefreshPath::Api).await
    }

    pub async fn refresh(&self, path: RefreshPath) -> RefreshOutcome {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let (credential, stored) = {
            let store = self.inner.store.lock().await;
            let stored = match path {
                RefreshPath::Selected => store.stored_snapshot(),
                _ => None,
            };
            (store.credential(), stored)
        };

        let feeds = &self.inner.feeds;
        let result = match path {
            RefreshPath::Selected => select_snapshot(feeds, stored, credential.as_ref()).await,
            RefreshPath::Cache => fetch_cache_then_api(feeds, credential.as_ref()).await,
            RefreshPath::Api => fetch_direct(feeds, credential.as_ref()).await,
        };

        self.apply(generation, path, credential.is_some(), result)
            .await
    }

    async fn apply(
        &self,
        generation: u64,
        path: RefreshPath,
        had_key: bool,
        result: Result<CombinedSnapshot, FeedError>,
    ) -> RefreshOutcome {
        // Key changes bump the generation under this lock. Held until the
        // board is updated.
        let mut store = self.inner.store.lock().await;
        if generation != self.inner.generation.load(Ordering::SeqCst) {
            debug!(?path, "Discarding result of fetch started before key change");
            return RefreshOutcome::Superseded;
        }

        match result {
            Ok(snapshot) => {
                if snapshot.source == SnapshotSource::Api
                    && let Err(e) = store.store_snapshot(&snapshot)
                {
                    warn!(error = %e, "Failed to persist snapshot");
                }
                info!(source = %snapshot.source, stops = snapshot.stops.len(), "Board updated");
                self.update_ui(Some(&snapshot)).await;
                RefreshOutcome::Updated(snapshot.source)
            }
            Err(e) => {
                warn!(?path, error = %e, "Refresh failed");
                let kind = e.kind();
                if kind == ErrorKind::MissingCredential {
                    self.set_status(StatusMessage::KEY_REQUIRED).await;
                } else if had_key {
                    self.set_status(StatusMessage::FETCH_FAILED).await;
                }

                // A failed direct fetch leaves the current list alone.
                if path != RefreshPath::Api {
                    self.update_ui(None).await;
                }
                RefreshOutcome::Failed(kind)
            }
        }
    }

    /// Replace what the board shows. `None` shows a load failure and keeps
    /// the previous last-updated line.
    pub async fn update_ui(&self, snapshot: Option<&CombinedSnapshot>) {
        let mut display = self.inner.display.write().await;
        match snapshot {
            Some(snapshot) => {
                display.last_updated = Some(last_updated_line(snapshot));
                display.shown = Shown::Snapshot(snapshot.clone());
            }
            None => display.shown = Shown::Failed,
        }
    }

    /// Save a key as typed by the user.
    pub async fn save_credential(&self, raw: &str) -> Result<(), CredentialError> {
        let key = match ApiKey::parse(raw) {
            Ok(key) => key,
            Err(e) => {
                self.set_status(StatusMessage::KEY_INVALID).await;
                return Err(e.into());
            }
        };

        {
            let mut store = self.inner.store.lock().await;
            store.save_credential(&key)?;
            self.inner.generation.fetch_add(1, Ordering::SeqCst);
        }
        info!("API key saved");

        self.set_status(StatusMessage::KEY_SAVED).await;
        self.apply_event(PollEvent::CredentialSaved).await;
        Ok(())
    }

    /// Remove the key and the snapshot fetched with it, then fall back to
    /// the static cache.
    pub async fn remove_credential(&self) -> Result<(), CredentialError> {
        let (result, removed) = {
            let mut store = self.inner.store.lock().await;
            let result = store.remove_credential();
            let removed = store.credential().is_none();
            if removed {
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
            }
            (result, removed)
        };

        // Polling stops whenever the key is gone, even if clearing the
        // rest of the store failed.
        if removed {
            info!("API key removed");
            self.apply_event(PollEvent::CredentialRemoved).await;
        }
        if let Err(e) = result {
            warn!(error = %e, "Failed to remove API key");
            return Err(e.into());
        }

        self.set_status(StatusMessage::KEY_REMOVED).await;
        self.refresh(RefreshPath::Cache).await;
        Ok(())
    }

    pub async fn set_visibility(&self, visible: bool) {
        let event = if visible {
            PollEvent::Visible
        } else {
            PollEvent::Hidden
        };
        self.apply_event(event).await;
    }

    async fn apply_event(&self, event: PollEvent) {
        let mut polling = self.inner.polling.lock().await;
        match event {
            PollEvent::Hidden => polling.visible = false,
            PollEvent::Visible => polling.visible = true,
            PollEvent::CredentialSaved | PollEvent::CredentialRemoved => {}
        }

        let (next, command) = polling.state.on(event, polling.visible);
        if next != polling.state {
            info!(from = ?polling.state, to = ?next, ?event, "Poll state changed");
        }
        polling.state = next;

        match command {
            TimerCommand::Start => {
                // Replacing the old timer drops and aborts it.
                polling.timer = Some(self.spawn_timer());
            }
            TimerCommand::Stop => {
                if let Some(timer) = polling.timer.take() {
                    timer.stop();
                }
            }
            TimerCommand::Keep => {}
        }
    }

    fn spawn_timer(&self) -> PollTimer {
        let weak = Arc::downgrade(&self.inner);
        PollTimer::start(self.inner.poll_interval, move || {
            let weak = weak.clone();
            async move {
                let Some(inner) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                BoardController { inner }.poll_once().await;
                ControlFlow::Continue(())
            }
        })
    }

    async fn set_status(&self, status: StatusMessage) {
        self.inner.display.write().await.status = status;
    }

    /// The board as it should look at `now`.
    pub async fn board_view(&self, now: DateTime<Utc>) -> BoardView {
        let display = self.inner.display.read().await;
        match &display.shown {
            Shown::Loading => BoardView::Loading,
            Shown::Failed => BoardView::render(None, &self.inner.config, now),
            Shown::Snapshot(snapshot) => BoardView::render(Some(snapshot), &self.inner.config, now),
        }
    }

    pub async fn last_updated(&self) -> Option<String> {
        self.inner.display.read().await.last_updated.clone()
    }

    pub async fn status(&self) -> StatusMessage {
        self.inner.display.read().await.status.clone()
    }

    pub async fn poll_state(&self) -> PollState {
        self.inner.polling.lock().await.state
    }

    pub async fn has_credential(&self) -> bool {
        self.inner.store.lock().await.credential().is_some()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.inner.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{StopArrivalFeed, StopCode};
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn snapshot(source: SnapshotSource, minutes: i64) -> CombinedSnapshot {
        let expected = (at() + chrono::Duration::minutes(minutes)).to_rfc3339();
        let mut stops = BTreeMap::new();
        stops.insert(
            StopCode::parse("14448").unwrap(),
            StopArrivalFeed::new(json!({
                "ServiceDelivery": {"StopMonitoringDelivery": {"MonitoredStopVisit": [{
                    "MonitoredVehicleJourney": {
                        "LineRef": "N",
                        "DirectionRef": "IB",
                        "MonitoredCall": {"ExpectedArrivalTime": expected}
                    }
                }]}}
            })),
        );
        CombinedSnapshot::new(stops, at(), source)
    }

    /// Feeds whose outcomes can be flipped during a test.
    #[derive(Default)]
    struct MockFeeds {
        cache_fails: AtomicBool,
        api_fails: AtomicBool,
        api_calls: AtomicU64,
        /// When set, `fetch_api` signals `entered` and waits on `gate`.
        gated: AtomicBool,
        entered: Notify,
        gate: Notify,
    }

    impl FeedSource for Arc<MockFeeds> {
        async fn fetch_cache(&self) -> Result<CombinedSnapshot, FeedError> {
            if self.cache_fails.load(Ordering::SeqCst) {
                return Err(FeedError::Status {
                    document: "metadata.json".into(),
                    status: 404,
                    message: "Not Found".into(),
                });
            }
            Ok(snapshot(SnapshotSource::Cache, 4))
        }

        async fn fetch_api(&self, _key: &ApiKey) -> Result<CombinedSnapshot, FeedError> {
            self.api_calls.fetch_add(1, Ordering::SeqCst);
            if self.gated.load(Ordering::SeqCst) {
                self.entered.notify_one();
                self.gate.notified().await;
            }
            if self.api_fails.load(Ordering::SeqCst) {
                return Err(FeedError::Unauthorized);
            }
            Ok(snapshot(SnapshotSource::Api, 2))
        }
    }

    fn controller(
        feeds: &Arc<MockFeeds>,
        store: MemoryStore,
    ) -> BoardController<Arc<MockFeeds>, MemoryStore> {
        BoardController::new(
            Arc::clone(feeds),
            store,
            BoardConfig::default(),
            DEFAULT_POLL_INTERVAL,
        )
    }

    #[tokio::test]
    async fn shows_loading_before_first_load() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());
        assert_eq!(board.board_view(at()).await, BoardView::Loading);
        assert_eq!(board.poll_state().await, PollState::Idle);
    }

    #[tokio::test]
    async fn start_without_key_loads_cache() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());
        board.start().await;

        assert_eq!(board.status().await, StatusMessage::NO_KEY);
        assert_eq!(board.poll_state().await, PollState::Idle);

        let view = board.board_view(at()).await;
        assert_eq!(view.arrivals().len(), 1);
        assert_eq!(view.arrivals()[0].minutes_until, 4);
        assert!(board.last_updated().await.unwrap().ends_with("(cache)"));
    }

    #[tokio::test]
    async fn cache_failure_without_key_shows_load_failure() {
        let feeds = Arc::new(MockFeeds::default());
        feeds.cache_fails.store(true, Ordering::SeqCst);
        let board = controller(&feeds, MemoryStore::new());

        assert_eq!(
            board.load().await,
            RefreshOutcome::Failed(ErrorKind::NetworkFailure)
        );
        assert_eq!(board.board_view(at()).await, BoardView::LoadFailed);
        assert_eq!(board.status().await, StatusMessage::NO_KEY);
    }

    #[tokio::test]
    async fn direct_fetch_without_key_asks_for_one() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());

        assert_eq!(
            board.refresh(RefreshPath::Api).await,
            RefreshOutcome::Failed(ErrorKind::MissingCredential)
        );
        assert_eq!(board.status().await, StatusMessage::KEY_REQUIRED);
        assert_eq!(board.board_view(at()).await, BoardView::Loading);
    }

    #[tokio::test]
    async fn failed_direct_fetch_keeps_the_list() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());
        board.refresh(RefreshPath::Cache).await;
        let before = board.board_view(at()).await;

        feeds.api_fails.store(true, Ordering::SeqCst);
        board.save_credential("key").await.unwrap();

        assert_eq!(
            board.refresh(RefreshPath::Api).await,
            RefreshOutcome::Failed(ErrorKind::NetworkFailure)
        );
        assert_eq!(board.status().await, StatusMessage::FETCH_FAILED);
        assert_eq!(board.board_view(at()).await, before);
    }

    #[tokio::test]
    async fn api_snapshot_is_persisted_and_preferred_on_load() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());
        board.save_credential("key").await.unwrap();

        assert_eq!(
            board.refresh(RefreshPath::Api).await,
            RefreshOutcome::Updated(SnapshotSource::Api)
        );
        assert_eq!(
            board.load().await,
            RefreshOutcome::Updated(SnapshotSource::Stored)
        );
        assert!(board.last_updated().await.unwrap().ends_with("(stored)"));
    }

    #[tokio::test]
    async fn removing_key_clears_stored_snapshot() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());
        board.save_credential("key").await.unwrap();
        board.refresh(RefreshPath::Api).await;

        board.remove_credential().await.unwrap();

        assert_eq!(board.status().await, StatusMessage::KEY_REMOVED);
        assert_eq!(board.poll_state().await, PollState::Idle);
        assert!(!board.has_credential().await);
        assert!(board.last_updated().await.unwrap().ends_with("(cache)"));
        assert_eq!(
            board.load().await,
            RefreshOutcome::Updated(SnapshotSource::Cache)
        );
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());

        let err = board.save_credential("   ").await.unwrap_err();
        assert!(matches!(err, CredentialError::Invalid(_)));
        assert_eq!(board.status().await, StatusMessage::KEY_INVALID);
        assert_eq!(board.poll_state().await, PollState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn saving_key_starts_polling_and_hiding_suspends() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());

        board.save_credential("key").await.unwrap();
        assert_eq!(board.poll_state().await, PollState::PollingWithCredential);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(feeds.api_calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(feeds.api_calls.load(Ordering::SeqCst), 2);

        board.set_visibility(false).await;
        assert_eq!(board.poll_state().await, PollState::PollingSuspended);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert_eq!(feeds.api_calls.load(Ordering::SeqCst), 2);

        board.set_visibility(true).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(feeds.api_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn start_with_saved_key_reports_it() {
        let mut store = MemoryStore::new();
        store
            .set(crate::store::CREDENTIAL_KEY, "saved".into())
            .unwrap();
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, store);

        board.start().await;
        assert_eq!(board.status().await, StatusMessage::KEY_LOADED);
        assert_eq!(board.poll_state().await, PollState::PollingWithCredential);
    }

    #[tokio::test]
    async fn results_from_before_a_key_change_are_discarded() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());

        let stale = board.inner.generation.load(Ordering::SeqCst);
        board.remove_credential().await.unwrap();

        let outcome = board
            .apply(
                stale,
                RefreshPath::Api,
                true,
                Ok(snapshot(SnapshotSource::Api, 1)),
            )
            .await;
        assert_eq!(outcome, RefreshOutcome::Superseded);
        assert!(board.last_updated().await.unwrap().ends_with("(cache)"));
        assert!(board.inner.store.lock().await.stored_snapshot().is_none());
    }

    fn store_with_key() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .set(crate::store::CREDENTIAL_KEY, "saved".into())
            .unwrap();
        store
    }

    #[tokio::test]
    async fn fetch_finishing_during_key_removal_is_not_persisted() {
        let feeds = Arc::new(MockFeeds::default());
        feeds.gated.store(true, Ordering::SeqCst);
        let board = controller(&feeds, store_with_key());

        let fetching = tokio::spawn({
            let board = board.clone();
            async move { board.poll_once().await }
        });
        feeds.entered.notified().await;

        // Hold the store so the removal queues on it, then let the fetch
        // finish and queue behind the removal.
        let guard = board.inner.store.lock().await;
        let removing = tokio::spawn({
            let board = board.clone();
            async move { board.remove_credential().await }
        });
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        feeds.gate.notify_one();
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        drop(guard);

        removing.await.unwrap().unwrap();
        assert_eq!(fetching.await.unwrap(), RefreshOutcome::Superseded);

        assert!(!board.has_credential().await);
        assert!(board.inner.store.lock().await.stored_snapshot().is_none());
        assert!(board.last_updated().await.unwrap().ends_with("(cache)"));
        assert_eq!(
            board.load().await,
            RefreshOutcome::Updated(SnapshotSource::Cache)
        );
    }

    /// A store whose removal of one key always reports failure, optionally
    /// after removing it anyway.
    struct FailingRemoval {
        inner: MemoryStore,
        fails_on: &'static str,
        removes_anyway: bool,
    }

    impl KeyValueStore for FailingRemoval {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            if key == self.fails_on {
                if self.removes_anyway {
                    self.inner.remove(key)?;
                }
                return Err(StoreError::Io {
                    path: "store.json".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.remove(key)
        }
    }

    #[tokio::test]
    async fn failed_removal_keeps_key_and_polling() {
        let feeds = Arc::new(MockFeeds::default());
        let store = FailingRemoval {
            inner: store_with_key(),
            fails_on: crate::store::SNAPSHOT_AT_KEY,
            removes_anyway: false,
        };
        let board = BoardController::new(
            Arc::clone(&feeds),
            store,
            BoardConfig::default(),
            DEFAULT_POLL_INTERVAL,
        );
        board.start().await;
        assert_eq!(board.poll_state().await, PollState::PollingWithCredential);

        let err = board.remove_credential().await.unwrap_err();
        assert!(matches!(err, CredentialError::Store(_)));

        assert!(board.has_credential().await);
        assert_eq!(board.poll_state().await, PollState::PollingWithCredential);
        assert_eq!(board.status().await, StatusMessage::KEY_LOADED);
    }

    #[tokio::test]
    async fn key_gone_after_failed_removal_stops_polling() {
        let feeds = Arc::new(MockFeeds::default());
        let store = FailingRemoval {
            inner: store_with_key(),
            fails_on: crate::store::CREDENTIAL_KEY,
            removes_anyway: true,
        };
        let board = BoardController::new(
            Arc::clone(&feeds),
            store,
            BoardConfig::default(),
            DEFAULT_POLL_INTERVAL,
        );
        board.start().await;
        assert_eq!(board.poll_state().await, PollState::PollingWithCredential);

        assert!(board.remove_credential().await.is_err());
        assert!(!board.has_credential().await);
        assert_eq!(board.poll_state().await, PollState::Idle);
    }

    #[tokio::test]
    async fn panel_reload_rereads_cache_only_when_idle() {
        let feeds = Arc::new(MockFeeds::default());
        let board = controller(&feeds, MemoryStore::new());

        assert_eq!(
            board.reload_if_idle().await,
            Some(RefreshOutcome::Updated(SnapshotSource::Cache))
        );

        board.save_credential("key").await.unwrap();
        assert_eq!(board.reload_if_idle().await, None);
    }
}
