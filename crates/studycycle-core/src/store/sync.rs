//! Cache/remote coordination.
//!
//! Write path: every engine mutation is mirrored to the local cache
//! synchronously and offered to a debounced outbox for the remote store.
//! Read path at startup: load the cache for instant state, then reconcile
//! against the remote store, which is authoritative when populated. Remote
//! failures never block local operation.

use crate::config::CycleConfig;
use crate::error::Result;
use crate::store::cache::{CachedState, LocalCache};
use crate::store::client::RemoteStore;
use crate::store::outbox::Outbox;
use crate::timer::{now_ms, CycleEngine, RuntimeSnapshot};

/// Quiet period for config writes. Config edits arrive in bursts (slider
/// drags, bulk subject setup), so the window is wider.
pub const CONFIG_QUIET_MS: u64 = 1_000;
/// Quiet period for runtime snapshot writes.
pub const RUNTIME_QUIET_MS: u64 = 500;

pub struct SyncService {
    cache: LocalCache,
    store: RemoteStore,
    config_outbox: Outbox<CycleConfig>,
    runtime_outbox: Outbox<RuntimeSnapshot>,
}

impl SyncService {
    pub fn new(cache: LocalCache, store: RemoteStore) -> Self {
        Self {
            cache,
            store,
            config_outbox: Outbox::new(CONFIG_QUIET_MS),
            runtime_outbox: Outbox::new(RUNTIME_QUIET_MS),
        }
    }

    /// Load the cached state, settling any stale `running` timer.
    pub fn load_local(&self) -> Option<CachedState> {
        let mut state = self.cache.load()?;
        state.timer.settle(now_ms());
        Some(state)
    }

    /// Reconcile the engine against the remote store.
    ///
    /// Remote documents are authoritative when populated; an empty remote
    /// is seeded from local state instead. Any remote failure is logged and
    /// leaves the engine running on local state.
    pub async fn reconcile(&mut self, engine: &mut CycleEngine) {
        match self.store.fetch_cycle_config().await {
            Ok(Some(config)) => engine.replace_config(config),
            Ok(None) => {
                if !engine.config().subjects.is_empty() {
                    if let Err(e) = self.store.put_cycle_config(engine.config()).await {
                        log::warn!("config seed write failed: {e}");
                    }
                }
            }
            Err(e) => log::warn!("config fetch failed, keeping local: {e}"),
        }

        match self.store.fetch_runtime().await {
            Ok(Some(snapshot)) => engine.replace_runtime(snapshot),
            Ok(None) => {
                if let Err(e) = self.store.put_runtime(&engine.snapshot()).await {
                    log::warn!("runtime seed write failed: {e}");
                }
            }
            Err(e) => log::warn!("runtime fetch failed, keeping local: {e}"),
        }
    }

    /// Mirror the engine's current state: synchronous cache write, debounced
    /// remote offer. Call after every mutation.
    pub fn observe(&mut self, engine: &CycleEngine) {
        let snapshot = engine.snapshot();
        let state = CachedState::new(engine.config().clone(), snapshot.clone());
        if let Err(e) = self.cache.save(&state) {
            log::warn!("cache write failed: {e}");
        }
        let now = now_ms();
        self.config_outbox.offer(now, engine.config().clone());
        self.runtime_outbox.offer(now, snapshot);
    }

    /// Push any outbox entries whose quiet period has elapsed. Failed
    /// writes are logged and dropped; the next mutation re-offers the
    /// document.
    pub async fn pump(&mut self) {
        let now = now_ms();
        if let Some(config) = self.config_outbox.take_ready(now) {
            if let Err(e) = self.store.put_cycle_config(&config).await {
                log::warn!("config sync failed: {e}");
            }
        }
        if let Some(snapshot) = self.runtime_outbox.take_ready(now) {
            if let Err(e) = self.store.put_runtime(&snapshot).await {
                log::warn!("runtime sync failed: {e}");
            }
        }
    }

    /// Push everything pending regardless of quiet periods.
    pub async fn flush(&mut self) {
        if let Some(config) = self.config_outbox.flush() {
            if let Err(e) = self.store.put_cycle_config(&config).await {
                log::warn!("config flush failed: {e}");
            }
        }
        if let Some(snapshot) = self.runtime_outbox.flush() {
            if let Err(e) = self.store.put_runtime(&snapshot).await {
                log::warn!("runtime flush failed: {e}");
            }
        }
    }

    /// Shutdown path: settle the timer, persist the cache, and fire the
    /// best-effort final remote write.
    pub fn shutdown(&mut self, engine: &mut CycleEngine) -> Result<()> {
        engine.settle();
        let snapshot = engine.snapshot();
        let state = CachedState::new(engine.config().clone(), snapshot.clone());
        self.cache.save(&state)?;
        self.store.send_final(&snapshot);
        Ok(())
    }

    pub fn store(&self) -> &RemoteStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Subject;

    fn local_engine() -> CycleEngine {
        let config = CycleConfig {
            subjects: vec![Subject {
                id: "local".into(),
                name: "Local".into(),
                emphasis: 5,
                color: "#8b5cf6".into(),
            }],
            ..CycleConfig::default()
        };
        CycleEngine::new(config)
    }

    fn service(server_url: &str, dir: &std::path::Path) -> SyncService {
        SyncService::new(
            LocalCache::with_path(dir.join("state.json")),
            RemoteStore::new(server_url).unwrap(),
        )
    }

    #[tokio::test]
    async fn populated_remote_config_overrides_local() {
        let mut server = mockito::Server::new_async().await;
        let remote_config = CycleConfig {
            subjects: vec![Subject {
                id: "remote".into(),
                name: "Remote".into(),
                emphasis: 9,
                color: "#3b82f6".into(),
            }],
            ..CycleConfig::default()
        };
        server
            .mock("GET", "/api/focus/cycle-config")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(serde_json::to_string(&remote_config).unwrap())
            .create_async()
            .await;
        server
            .mock("GET", "/api/focus/timer-state")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;
        server
            .mock("PUT", "/api/focus/timer-state")
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut sync = service(&server.url(), dir.path());
        let mut engine = local_engine();
        sync.reconcile(&mut engine).await;
        assert_eq!(engine.config().subjects[0].id, "remote");
    }

    #[tokio::test]
    async fn empty_remote_is_seeded_from_local() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/focus/cycle-config")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;
        let config_seed = server
            .mock("PUT", "/api/focus/cycle-config")
            .with_status(200)
            .create_async()
            .await;
        server
            .mock("GET", "/api/focus/timer-state")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{}")
            .create_async()
            .await;
        let runtime_seed = server
            .mock("PUT", "/api/focus/timer-state")
            .with_status(200)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut sync = service(&server.url(), dir.path());
        let mut engine = local_engine();
        sync.reconcile(&mut engine).await;
        assert_eq!(engine.config().subjects[0].id, "local");
        config_seed.assert_async().await;
        runtime_seed.assert_async().await;
    }

    #[tokio::test]
    async fn remote_failure_keeps_local_state() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/focus/cycle-config")
            .with_status(500)
            .create_async()
            .await;
        server
            .mock("GET", "/api/focus/timer-state")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut sync = service(&server.url(), dir.path());
        let mut engine = local_engine();
        sync.reconcile(&mut engine).await;
        assert_eq!(engine.config().subjects[0].id, "local");
    }

    #[tokio::test]
    async fn observe_mirrors_to_the_cache_immediately() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let mut sync = service(&server.url(), dir.path());
        let engine = local_engine();
        sync.observe(&engine);

        let cached = sync.load_local().unwrap();
        assert_eq!(cached.config.subjects[0].id, "local");
    }

    #[tokio::test]
    async fn load_local_settles_a_stale_running_timer() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let mut sync = service(&server.url(), dir.path());

        let mut engine = local_engine();
        engine.start();
        sync.observe(&engine);

        let cached = sync.load_local().unwrap();
        assert!(!cached.timer.is_running());
        assert!(cached.timer.started_at_ms.is_none());
    }
}
