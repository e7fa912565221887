//! Notification events and the in-memory list
//!
//! Wire payloads arrive as JSON inside SSE `data:` frames. Each parsed
//! payload becomes a [`NotificationEvent`] with a receipt timestamp and a
//! relative-time label computed once at receipt. Events live in a
//! newest-first [`NotificationList`]; mutations are explicit mark-read and
//! removal operations with no network side effects.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// JSON payload carried by one SSE `data:` frame
///
/// `id`, `text` (or its `message` alias) and `timestamp` are the minimal
/// fields; anything else the provider sends is kept in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationPayload {
    pub id: String,
    #[serde(alias = "message")]
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<serde_json::Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NotificationPayload {
    /// Decode the payload timestamp, accepting RFC 3339 strings and epoch
    /// seconds or milliseconds
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            serde_json::Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            serde_json::Value::Number(n) => {
                let raw = n.as_i64()?;
                // Epoch millis once the magnitude is past any plausible
                // seconds value.
                if raw.abs() >= 1_000_000_000_000 {
                    Utc.timestamp_millis_opt(raw).single()
                } else {
                    Utc.timestamp_opt(raw, 0).single()
                }
            }
            _ => None,
        }
    }
}

/// A received notification
#[derive(Debug, Clone)]
pub struct NotificationEvent {
    pub id: String,
    pub text: String,
    pub is_read: bool,
    /// When this client received the frame
    pub received_at: DateTime<Utc>,
    /// Human-readable age of the event, computed once at receipt
    pub age_label: String,
    /// Provider-specific fields passed through untouched
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl NotificationEvent {
    /// Build an event from a parsed payload at receipt time `now`
    pub fn from_payload(payload: NotificationPayload, now: DateTime<Utc>) -> Self {
        let event_time = payload.event_time().unwrap_or(now);
        Self {
            id: payload.id,
            text: payload.text,
            is_read: false,
            received_at: now,
            age_label: relative_age(event_time, now),
            extra: payload.extra,
        }
    }
}

/// Bucketed relative-time label for an event of age `now - event_time`
pub fn relative_age(event_time: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(event_time);
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{} minutes ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{} hours ago", elapsed.num_hours())
    } else {
        format!("{} days ago", elapsed.num_days())
    }
}

/// Newest-first collection of received notifications
#[derive(Debug, Default)]
pub struct NotificationList {
    entries: Vec<NotificationEvent>,
}

impl NotificationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend a freshly received event
    pub fn push_front(&mut self, event: NotificationEvent) {
        self.entries.insert(0, event);
    }

    /// Mark one entry read; returns whether the id was found
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => {
                entry.is_read = true;
                true
            }
            None => false,
        }
    }

    /// Mark every entry read; idempotent
    pub fn mark_all_read(&mut self) {
        for entry in &mut self.entries {
            entry.is_read = true;
        }
    }

    /// Remove one entry; returns whether the id was found
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn unread_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_read).count()
    }

    /// Clone the current entries, newest first
    pub fn snapshot(&self) -> Vec<NotificationEvent> {
        self.entries.clone()
    }
}
