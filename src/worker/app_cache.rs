//! The installed-application cache: a versioned resource cache in front of
//! the network, a build-change check on every navigation, and the
//! background-sync broadcaster.
//!
//! This is a library surface with no transport of its own. The embedding
//! host supplies the [`Network`] that performs real fetches and the
//! [`ClientNotifier`] that reaches its open pages (the CLI daemon uses
//! [`ChannelNotifier`](crate::worker::ChannelNotifier) for the latter).

use crate::errors::{AppError, AppResult};
use crate::utils::clock::Clock;
use crate::worker::broadcaster::SyncBroadcaster;
use crate::worker::messages::{ClientNotifier, PageMessage, WorkerMessage};
use crate::worker::network::{Network, Request, RequestKind, Response};
use crate::worker::resource_cache::CacheStorage;
use crate::worker::version::VersionDescriptor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const ROOT_DOCUMENT: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Name of the current resource cache; other names are stale.
    pub cache_version: String,
    pub version_path: String,
    pub background_sync_period: Duration,
    pub core_assets: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            cache_version: "attendance-v1".to_string(),
            version_path: "/version.json".to_string(),
            background_sync_period: Duration::from_secs(5 * 60),
            core_assets: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "/manifest.json".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
    pub skip_waiting: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub claimed: bool,
}

pub struct AppCacheWorker {
    settings: WorkerSettings,
    network: Arc<dyn Network>,
    notifier: Arc<dyn ClientNotifier>,
    caches: Arc<CacheStorage>,
    clock: Arc<dyn Clock>,
    broadcaster: SyncBroadcaster,
}

impl AppCacheWorker {
    pub fn new(
        settings: WorkerSettings,
        network: Arc<dyn Network>,
        notifier: Arc<dyn ClientNotifier>,
        caches: Arc<CacheStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let broadcaster = SyncBroadcaster::new(
            Arc::clone(&notifier),
            Arc::clone(&clock),
            settings.background_sync_period,
        );
        Self {
            settings,
            network,
            notifier,
            caches,
            clock,
            broadcaster,
        }
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    pub fn broadcaster(&self) -> &SyncBroadcaster {
        &self.broadcaster
    }

    // ---------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------

    /// Pre-populate the current cache with the core assets. One failing
    /// asset never aborts the install.
    pub async fn install(&self) -> InstallReport {
        let name = &self.settings.cache_version;
        if let Err(e) = self.caches.open(name) {
            warn!(cache = %name, error = %e, "cannot open resource cache");
        }

        let mut report = InstallReport {
            cached: Vec::new(),
            failed: Vec::new(),
            skip_waiting: true,
        };

        for asset in &self.settings.core_assets {
            let stored = match self.network.fetch(&Request::asset(asset.as_str())).await {
                Ok(resp) if resp.is_success() => self.caches.put(name, asset, resp),
                Ok(resp) => Err(AppError::Network(format!(
                    "HTTP {}",
                    resp.status
                ))),
                Err(e) => Err(e),
            };
            match stored {
                Ok(()) => report.cached.push(asset.clone()),
                Err(e) => {
                    warn!(asset = %asset, error = %e, "core asset not cached");
                    report.failed.push(asset.clone());
                }
            }
        }

        info!(
            cached = report.cached.len(),
            failed = report.failed.len(),
            "worker installed"
        );
        report
    }

    /// Drop every cache not named after the current version and take over
    /// open pages.
    pub fn activate(&self) -> ActivateReport {
        let deleted: Vec<String> = self
            .caches
            .keys()
            .into_iter()
            .filter(|name| *name != self.settings.cache_version)
            .filter(|name| self.caches.delete(name))
            .collect();

        for name in &deleted {
            info!(cache = %name, "stale resource cache deleted");
        }
        self.notifier.claim();

        ActivateReport {
            deleted,
            claimed: true,
        }
    }

    // ---------------------------------------------------------------
    // Fetch strategy
    // ---------------------------------------------------------------

    pub async fn handle_fetch(&self, request: &Request) -> AppResult<Response> {
        match request.kind {
            RequestKind::Document => self.network_first(request).await,
            RequestKind::Asset => self.cache_first(request).await,
        }
    }

    async fn network_first(&self, request: &Request) -> AppResult<Response> {
        if let Err(e) = self.check_for_update().await {
            warn!(error = %e, "version check failed");
        }

        match self.network.fetch(request).await {
            Ok(resp) => {
                if resp.is_success() {
                    self.store_best_effort(&request.url, &resp);
                }
                Ok(resp)
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "network failed; trying cache");
                self.caches
                    .match_any(&request.url)
                    .or_else(|| self.caches.match_any(ROOT_DOCUMENT))
                    .ok_or(e)
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> AppResult<Response> {
        if let Some(hit) = self.caches.match_any(&request.url) {
            return Ok(hit);
        }

        let resp = self.network.fetch(request).await?;
        if resp.is_cacheable() {
            self.store_best_effort(&request.url, &resp);
        }
        Ok(resp)
    }

    fn store_best_effort(&self, url: &str, resp: &Response) {
        if let Err(e) = self
            .caches
            .put(&self.settings.cache_version, url, resp.clone())
        {
            debug!(url = %url, error = %e, "response not cached");
        }
    }

    // ---------------------------------------------------------------
    // Version protocol
    // ---------------------------------------------------------------

    /// Fetch the build descriptor bypassing every cache and compare it with
    /// the stored one. On first sight or a new build: announce, flush all
    /// caches, keep only the new descriptor, announce again. Returns whether
    /// a flush happened.
    pub async fn check_for_update(&self) -> AppResult<bool> {
        let path = &self.settings.version_path;
        let url = format!("{}?t={}", path, self.clock.now().timestamp_millis());
        let request = Request::asset(url)
            .with_header("Cache-Control", "no-cache")
            .with_header("Pragma", "no-cache");

        let fresh = VersionDescriptor::from_response(&self.network.fetch(&request).await?)?;

        let stored = self
            .caches
            .match_any(path)
            .and_then(|r| VersionDescriptor::from_response(&r).ok());

        if stored
            .as_ref()
            .is_some_and(|s| s.build_id == fresh.build_id)
        {
            return Ok(false);
        }

        info!(
            previous = stored.as_ref().map(|s| s.build_id.as_str()).unwrap_or("-"),
            current = %fresh.build_id,
            "new build detected"
        );
        self.notifier.broadcast(&WorkerMessage::VersionUpdateStart);

        for name in self.caches.keys() {
            self.caches.delete(&name);
        }
        self.caches
            .put(&self.settings.cache_version, path, fresh.to_response()?)?;

        self.notifier
            .broadcast(&WorkerMessage::NewVersionAvailable { version: fresh });
        Ok(true)
    }

    // ---------------------------------------------------------------
    // Messages and connectivity
    // ---------------------------------------------------------------

    pub fn handle_message(&self, message: PageMessage) {
        match message {
            PageMessage::RegisterSync => self.broadcaster.schedule(),
            PageMessage::UnregisterSync => self.broadcaster.cancel(),
            PageMessage::SyncStatusUpdate { data } => {
                info!(status = %data, "page reported sync status");
            }
        }
    }

    /// A platform sync event fired; ask the pages to run it.
    pub fn request_background_sync(&self) {
        self.notifier.broadcast(&WorkerMessage::BackgroundSyncRequest {
            timestamp: self.clock.now().timestamp_millis(),
        });
    }

    pub fn on_online(&self) {
        self.broadcaster.schedule();
    }

    pub fn on_offline(&self) {
        self.broadcaster.cancel();
    }
}
