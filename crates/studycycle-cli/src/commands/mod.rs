pub mod config;
pub mod sessions;
pub mod stopwatch;
pub mod subject;
pub mod sync;
pub mod timer;

use studycycle_core::{
    CycleConfig, CycleEngine, LocalCache, RemoteStore, SyncService,
};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Base URL of the remote store, overridable via STUDYCYCLE_API_URL.
pub fn api_url() -> String {
    std::env::var("STUDYCYCLE_API_URL").unwrap_or_else(|_| "http://localhost:9823".to_string())
}

pub fn open_sync() -> Result<SyncService, Box<dyn std::error::Error>> {
    Ok(SyncService::new(
        LocalCache::open()?,
        RemoteStore::new(&api_url())?,
    ))
}

/// Rebuild the engine from the local cache; a missing cache starts fresh.
pub fn load_engine(sync: &SyncService) -> CycleEngine {
    match sync.load_local() {
        Some(state) => CycleEngine::from_parts(state.config, state.timer, state.cycle),
        None => CycleEngine::new(CycleConfig::default()),
    }
}

pub fn runtime() -> Result<tokio::runtime::Runtime, std::io::Error> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

/// Mirror the engine to the cache and push pending writes immediately.
/// One-shot invocations cannot wait out a debounce window.
pub fn persist(sync: &mut SyncService, engine: &CycleEngine) -> CliResult {
    sync.observe(engine);
    runtime()?.block_on(sync.flush());
    Ok(())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
