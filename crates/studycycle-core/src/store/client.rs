//! HTTP client for the remote store.
//!
//! The remote store is the durable authority for the cycle configuration,
//! the runtime snapshot and the session history. Documents are whole-blob
//! reads and writes with last-write-wins semantics; there is no partial
//! update surface.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::config::CycleConfig;
use crate::error::{Result, StoreError};
use crate::session::FocusSession;
use crate::timer::RuntimeSnapshot;

/// Aggregate session statistics for a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    #[serde(default)]
    pub total_sessions: u64,
    #[serde(default)]
    pub total_seconds: u64,
    #[serde(default)]
    pub by_subject: Vec<SubjectStats>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub subject_id: String,
    pub subject_name: String,
    pub total_seconds: u64,
    pub sessions: u64,
}

#[derive(Clone)]
pub struct RemoteStore {
    base: Url,
    http: reqwest::Client,
}

impl RemoteStore {
    /// Build a client against the store's base URL (scheme + host + port).
    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| StoreError::InvalidBaseUrl(e.to_string()))?;
        Ok(Self {
            base,
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base
            .join(path)
            .map_err(|e| StoreError::InvalidBaseUrl(e.to_string()))
    }

    /// Fetch the remote cycle configuration.
    ///
    /// A store that has never been written returns an empty document; that
    /// is reported as `None` so reconciliation can tell "remote is empty"
    /// from "remote has an empty subject list the user saved".
    pub async fn fetch_cycle_config(&self) -> Result<Option<CycleConfig>, StoreError> {
        let value = self.get_json("api/focus/cycle-config").await?;
        let has_subjects = value
            .get("subjects")
            .and_then(Value::as_array)
            .map(|s| !s.is_empty())
            .unwrap_or(false);
        if !has_subjects {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn put_cycle_config(&self, config: &CycleConfig) -> Result<(), StoreError> {
        self.put_json("api/focus/cycle-config", config).await
    }

    /// Fetch the remote runtime snapshot, `None` if never written.
    pub async fn fetch_runtime(&self) -> Result<Option<RuntimeSnapshot>, StoreError> {
        let value = self.get_json("api/focus/timer-state").await?;
        if value.get("timer").is_none() {
            return Ok(None);
        }
        serde_json::from_value(value)
            .map(Some)
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn put_runtime(&self, snapshot: &RuntimeSnapshot) -> Result<(), StoreError> {
        self.put_json("api/focus/timer-state", snapshot).await
    }

    /// Record a completed session; returns it with the store-assigned id.
    pub async fn create_session(&self, session: &FocusSession) -> Result<FocusSession, StoreError> {
        let url = self.endpoint("api/focus/sessions")?;
        let response = self.http.post(url).json(session).send().await?;
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// List sessions, optionally restricted to one local date.
    pub async fn sessions(&self, date: Option<NaiveDate>) -> Result<Vec<FocusSession>, StoreError> {
        let mut url = self.endpoint("api/focus/sessions")?;
        if let Some(date) = date {
            url.query_pairs_mut()
                .append_pair("date", &date.to_string());
        }
        let response = self.http.get(url).send().await?;
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn delete_session(&self, id: i64) -> Result<(), StoreError> {
        let url = self.endpoint(&format!("api/focus/sessions/{id}"))?;
        let response = self.http.delete(url).send().await?;
        check_status(response)?;
        Ok(())
    }

    pub async fn stats(&self, from: NaiveDate, to: NaiveDate) -> Result<SessionStats, StoreError> {
        let mut url = self.endpoint("api/focus/sessions/stats")?;
        url.query_pairs_mut()
            .append_pair("from", &from.to_string())
            .append_pair("to", &to.to_string());
        let response = self.http.get(url).send().await?;
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Best-effort final write for process shutdown.
    ///
    /// Spawned detached with a short timeout; failures are logged and
    /// dropped, since the cache already holds the same snapshot.
    pub fn send_final(&self, snapshot: &RuntimeSnapshot) {
        let Ok(url) = self.endpoint("api/focus/timer-state") else {
            return;
        };
        let Ok(body) = serde_json::to_vec(snapshot) else {
            return;
        };

        let send = async move {
            let client = match reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(2))
                .build()
            {
                Ok(client) => client,
                Err(e) => {
                    log::warn!("final write client build failed: {e}");
                    return;
                }
            };
            let result = client
                .put(url)
                .header("content-type", "application/json")
                .body(body)
                .send()
                .await;
            if let Err(e) = result {
                log::warn!("final runtime write failed: {e}");
            }
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(send);
            }
            Err(_) => {
                std::thread::spawn(move || {
                    if let Ok(rt) = tokio::runtime::Builder::new_current_thread()
                        .enable_all()
                        .build()
                    {
                        rt.block_on(send);
                    }
                });
            }
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value, StoreError> {
        let url = self.endpoint(path)?;
        let response = self.http.get(url).send().await?;
        let response = check_status(response)?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn put_json<T: Serialize>(&self, path: &str, body: &T) -> Result<(), StoreError> {
        let url = self.endpoint(path)?;
        let response = self.http.put(url).json(body).send().await?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(StoreError::Status(status.as_u16()))
    }
}
