mod cache;
mod client;
mod outbox;
mod sync;

pub use cache::{data_dir, CachedState, LocalCache, CACHE_VERSION};
pub use client::{RemoteStore, SessionStats, SubjectStats};
pub use outbox::Outbox;
pub use sync::{SyncService, CONFIG_QUIET_MS, RUNTIME_QUIET_MS};
