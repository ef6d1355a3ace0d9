use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Outcome of one sync attempt. Only the most recent one is retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub updated_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl SyncResult {
    pub fn ok(updated_count: usize, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: true,
            updated_count,
            error: None,
            timestamp,
        }
    }

    pub fn failed(error: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            success: false,
            updated_count: 0,
            error: Some(error.into()),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Idle,
    Syncing,
    Error,
    Offline,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Error => "error",
            SyncState::Offline => "offline",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot returned by `BackgroundSyncManager::get_sync_stats`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStats {
    pub state: SyncState,
    pub retry_count: u32,
    pub is_running: bool,
    pub last_result: Option<SyncResult>,
}
