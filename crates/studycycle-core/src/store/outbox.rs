//! Debounced write coalescing for remote saves.
//!
//! Every local mutation offers the full document to an outbox; the outbox
//! keeps only the latest value and releases it once the quiet period has
//! elapsed without further offers. A content key (the serialized JSON)
//! suppresses writes whose payload matches the last released value.

use serde::Serialize;

pub struct Outbox<T: Serialize + Clone> {
    quiet_ms: u64,
    pending: Option<T>,
    pending_key: Option<String>,
    last_key: Option<String>,
    deadline_ms: Option<u64>,
}

impl<T: Serialize + Clone> Outbox<T> {
    pub fn new(quiet_ms: u64) -> Self {
        Self {
            quiet_ms,
            pending: None,
            pending_key: None,
            last_key: None,
            deadline_ms: None,
        }
    }

    /// Offer the latest document state. Returns false when the payload
    /// matches the last released value and nothing was queued. Each offer
    /// restarts the quiet period.
    pub fn offer(&mut self, now_ms: u64, value: T) -> bool {
        let Ok(key) = serde_json::to_string(&value) else {
            return false;
        };
        if self.pending.is_none() && self.last_key.as_deref() == Some(key.as_str()) {
            return false;
        }
        self.pending = Some(value);
        self.pending_key = Some(key);
        self.deadline_ms = Some(now_ms + self.quiet_ms);
        true
    }

    /// Release the pending document if its quiet period has elapsed.
    pub fn take_ready(&mut self, now_ms: u64) -> Option<T> {
        match self.deadline_ms {
            Some(deadline) if now_ms >= deadline => self.take(),
            _ => None,
        }
    }

    /// Release the pending document immediately, ignoring the quiet period.
    pub fn flush(&mut self) -> Option<T> {
        self.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }

    fn take(&mut self) -> Option<T> {
        let value = self.pending.take()?;
        self.last_key = self.pending_key.take();
        self.deadline_ms = None;
        Some(value)
    }
}
