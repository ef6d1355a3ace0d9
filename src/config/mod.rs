use crate::errors::{AppError, AppResult};
use crate::sync::SyncSettings;
use crate::worker::WorkerSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub interval_secs: u64,
    pub retry_delay_secs: u64,
    pub max_retries: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: 300,
            retry_delay_secs: 30,
            max_retries: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub expiry_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { expiry_minutes: 30 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub cache_version: String,
    pub version_path: String,
    pub background_sync_minutes: u64,
    pub core_assets: Vec<String>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        let defaults = WorkerSettings::default();
        Self {
            cache_version: defaults.cache_version,
            version_path: defaults.version_path,
            background_sync_minutes: defaults.background_sync_period.as_secs() / 60,
            core_assets: defaults.core_assets,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: String,
    pub debug: bool,
    pub sync: SyncConfig,
    pub cache: CacheConfig,
    pub worker: WorkerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            debug: false,
            sync: SyncConfig::default(),
            cache: CacheConfig::default(),
            worker: WorkerConfig::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("rtimesync")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".rtimesync")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("rtimesync.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("rtimesync.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        Self::load_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> AppResult<()> {
        if self.sync.interval_secs == 0 {
            return Err(AppError::Config("sync.interval_secs must be > 0".into()));
        }
        if self.sync.max_retries == 0 {
            return Err(AppError::Config("sync.max_retries must be > 0".into()));
        }
        if self.cache.expiry_minutes <= 0 {
            return Err(AppError::Config("cache.expiry_minutes must be > 0".into()));
        }
        if self.worker.background_sync_minutes == 0 {
            return Err(AppError::Config(
                "worker.background_sync_minutes must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            sync_interval: Duration::from_secs(self.sync.interval_secs),
            retry_delay: Duration::from_secs(self.sync.retry_delay_secs),
            max_retries: self.sync.max_retries,
        }
    }

    pub fn cache_expiry(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.cache.expiry_minutes)
    }

    pub fn worker_settings(&self) -> WorkerSettings {
        WorkerSettings {
            cache_version: self.worker.cache_version.clone(),
            version_path: self.worker.version_path.clone(),
            background_sync_period: Duration::from_secs(self.worker.background_sync_minutes * 60),
            core_assets: self.worker.core_assets.clone(),
        }
    }

    pub fn to_yaml(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Initialize configuration and database files. Returns the database
    /// path that was set up.
    pub fn init_all(custom_name: Option<String>, is_test: bool) -> AppResult<PathBuf> {
        let dir = Self::config_dir();

        // DB name: user provided or default
        let db_path = match custom_name {
            Some(name) => {
                let p = Path::new(&name);
                if p.is_absolute() {
                    p.to_path_buf()
                } else {
                    dir.join(p)
                }
            }
            None => Self::database_file(),
        };

        // Write config file
        if !is_test {
            fs::create_dir_all(&dir)?;
            let config = Config {
                database: db_path.to_string_lossy().to_string(),
                ..Config::default()
            };
            let mut file = fs::File::create(Self::config_file())?;
            file.write_all(config.to_yaml()?.as_bytes())?;
        }

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        Ok(db_path)
    }
}
