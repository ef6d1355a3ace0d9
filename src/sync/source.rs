//! Collaborators of the sync layer: where records come from and where new
//! ones are saved. Transport is up to the implementor.

use crate::errors::AppResult;
use crate::models::DailyEntry;
use async_trait::async_trait;
use serde::Serialize;

#[async_trait]
pub trait RecordSource: Send + Sync {
    /// All records of a month. `force_refresh` asks the source to bypass any
    /// cache of its own.
    async fn fetch_monthly_records(
        &self,
        year: i32,
        month: u32,
        force_refresh: bool,
    ) -> AppResult<Vec<DailyEntry>>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn persist_record(&self, entry: &DailyEntry) -> AppResult<SaveOutcome>;
}
