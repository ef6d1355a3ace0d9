//! Messages exchanged between the worker and open pages. JSON, tagged on
//! `type`.

use crate::worker::version::VersionDescriptor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Worker -> page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerMessage {
    VersionUpdateStart,
    NewVersionAvailable { version: VersionDescriptor },
    BackgroundSyncRequest { timestamp: i64 },
    PerformSync { timestamp: i64 },
}

impl WorkerMessage {
    /// Whether the page should run a sync on receipt.
    pub fn requests_sync(&self) -> bool {
        matches!(
            self,
            WorkerMessage::BackgroundSyncRequest { .. } | WorkerMessage::PerformSync { .. }
        )
    }
}

/// Page -> worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PageMessage {
    RegisterSync,
    UnregisterSync,
    SyncStatusUpdate {
        #[serde(default)]
        data: Value,
    },
}

pub trait ClientNotifier: Send + Sync {
    /// Deliver to every open page. Best-effort.
    fn broadcast(&self, message: &WorkerMessage);

    /// Take control of pages opened under an older worker.
    fn claim(&self) {}
}

/// Notifier backed by an unbounded channel; the receiving end plays the
/// page.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<WorkerMessage>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<WorkerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ClientNotifier for ChannelNotifier {
    fn broadcast(&self, message: &WorkerMessage) {
        if self.tx.send(message.clone()).is_err() {
            debug!("no page listening; message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn worker_messages_use_the_type_tag() {
        let m = WorkerMessage::PerformSync { timestamp: 1737367200000 };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({"type": "PERFORM_SYNC", "timestamp": 1737367200000i64})
        );
        assert_eq!(
            serde_json::to_value(WorkerMessage::VersionUpdateStart).unwrap(),
            json!({"type": "VERSION_UPDATE_START"})
        );
    }

    #[test]
    fn new_version_carries_the_descriptor() {
        let m = WorkerMessage::NewVersionAvailable {
            version: VersionDescriptor::new("b42"),
        };
        assert_eq!(
            serde_json::to_value(&m).unwrap(),
            json!({"type": "NEW_VERSION_AVAILABLE", "version": {"buildId": "b42"}})
        );
    }

    #[test]
    fn page_messages_parse() {
        let reg: PageMessage = serde_json::from_str(r#"{"type":"REGISTER_SYNC"}"#).unwrap();
        assert_eq!(reg, PageMessage::RegisterSync);

        let status: PageMessage =
            serde_json::from_str(r#"{"type":"SYNC_STATUS_UPDATE","data":{"state":"idle"}}"#)
                .unwrap();
        assert_eq!(
            status,
            PageMessage::SyncStatusUpdate {
                data: json!({"state": "idle"})
            }
        );
    }

    #[test]
    fn closed_channel_is_not_an_error() {
        let (notifier, rx) = ChannelNotifier::new();
        drop(rx);
        notifier.broadcast(&WorkerMessage::VersionUpdateStart);
    }
}
