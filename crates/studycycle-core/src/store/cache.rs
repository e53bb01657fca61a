//! Local JSON cache with versioned migrations.
//!
//! One blob at `~/.config/studycycle[-dev]/state.json` holds the cycle
//! configuration plus the runtime snapshot. The blob carries a version
//! number; loading applies the pending migrations to the raw JSON before
//! deserializing, so documents written by older versions keep working.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::CycleConfig;
use crate::error::{CacheError, Result};
use crate::timer::{CycleState, RuntimeSnapshot, TimerState};

/// Current cache blob version. Increment when adding a migration.
pub const CACHE_VERSION: u32 = 4;

/// The cached blob: everything needed to rebuild an engine offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedState {
    pub version: u32,
    pub config: CycleConfig,
    pub timer: TimerState,
    pub cycle: CycleState,
}

impl CachedState {
    pub fn new(config: CycleConfig, snapshot: RuntimeSnapshot) -> Self {
        Self {
            version: CACHE_VERSION,
            config,
            timer: snapshot.timer,
            cycle: snapshot.cycle,
        }
    }
}

/// Returns `~/.config/studycycle[-dev]/` based on STUDYCYCLE_ENV.
///
/// Set STUDYCYCLE_ENV=dev to use a separate development data directory.
pub fn data_dir() -> Result<PathBuf, CacheError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("STUDYCYCLE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("studycycle-dev")
    } else {
        base_dir.join("studycycle")
    };

    std::fs::create_dir_all(&dir).map_err(|e| CacheError::Dir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

pub struct LocalCache {
    path: PathBuf,
}

impl LocalCache {
    pub fn open() -> Result<Self, CacheError> {
        Ok(Self {
            path: data_dir()?.join("state.json"),
        })
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and migrate the cached blob.
    ///
    /// Missing file and malformed content both yield `None`: the cache is a
    /// mirror of the remote store, so a corrupt blob is logged and treated
    /// as absent rather than aborting startup.
    pub fn load(&self) -> Option<CachedState> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("cache read failed ({}): {e}", self.path.display());
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("cache blob is not valid JSON, discarding: {e}");
                return None;
            }
        };
        let migrated = migrate(value);
        match serde_json::from_value(migrated) {
            Ok(state) => Some(state),
            Err(e) => {
                log::warn!("cache blob failed to deserialize after migration: {e}");
                None
            }
        }
    }

    pub fn save(&self, state: &CachedState) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CacheError::Dir(format!("{}: {e}", parent.display())))?;
        }
        let json = serde_json::to_string(state)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Apply pending migrations to a raw cache blob. A blob without a version
/// field is treated as version 1. Already-current blobs pass through
/// unchanged, so the chain is idempotent.
pub fn migrate(mut value: Value) -> Value {
    let version = value
        .get("version")
        .and_then(Value::as_u64)
        .unwrap_or(1) as u32;

    if version < 2 {
        migrate_v2(&mut value);
    }
    if version < 3 {
        migrate_v3(&mut value);
    }
    if version < 4 {
        migrate_v4(&mut value);
    }
    value["version"] = Value::from(CACHE_VERSION);
    value
}

/// v2: emphasis moved from a 0.0-1.0 float to an integer 1-10 scale.
/// Fractional legacy values rescale by 10; anything else clamps into range.
fn migrate_v2(value: &mut Value) {
    let Some(subjects) = value
        .get_mut("config")
        .and_then(|c| c.get_mut("subjects"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    for subject in subjects {
        let Some(emphasis) = subject.get("emphasis").and_then(Value::as_f64) else {
            continue;
        };
        let rescaled = if emphasis < 1.0 {
            (emphasis * 10.0).round().max(1.0)
        } else {
            emphasis.round().clamp(1.0, 10.0)
        };
        subject["emphasis"] = Value::from(rescaled as u64);
    }
}

/// v3: the timer variant setting was introduced; older blobs predate the
/// pomodoro variant and ran continuously.
fn migrate_v3(value: &mut Value) {
    let Some(settings) = value
        .get_mut("config")
        .and_then(|c| c.get_mut("settings"))
        .and_then(Value::as_object_mut)
    else {
        return;
    };
    settings
        .entry("variant")
        .or_insert_with(|| Value::from("continuous"));
}

/// v4: the completed-cycles counter was introduced.
fn migrate_v4(value: &mut Value) {
    let Some(cycle) = value.get_mut("cycle").and_then(Value::as_object_mut) else {
        return;
    };
    cycle
        .entry("completedCycles")
        .or_insert_with(|| Value::from(0));
}
