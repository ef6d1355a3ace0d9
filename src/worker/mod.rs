pub mod app_cache;
pub mod broadcaster;
pub mod messages;
pub mod network;
pub mod resource_cache;
pub mod version;

pub use app_cache::{ActivateReport, AppCacheWorker, InstallReport, WorkerSettings};
pub use broadcaster::SyncBroadcaster;
pub use messages::{ChannelNotifier, ClientNotifier, PageMessage, WorkerMessage};
pub use network::{Network, Request, RequestKind, Response, ResponseType};
pub use resource_cache::CacheStorage;
pub use version::VersionDescriptor;
