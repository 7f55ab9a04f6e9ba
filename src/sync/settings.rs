use crate::config;
use serde::Deserialize;
use std::{
    env,
    error::Error as StdError,
    fmt,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
    time::Duration,
};

pub const PROXY_LIST_ENV: &str = "CF_SYNC_PROXY_LIST";
pub const DATABASE_ENV: &str = "CF_SYNC_DATABASE";

#[derive(Debug)]
pub enum SettingsError {
    Io(PathBuf, io::Error),
    Yaml(serde_yaml::Error),
}
impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Error open {}: {}", path.display(), e),
            Self::Yaml(e) => write!(f, "Error parse settings: {}", e),
        }
    }
}
impl StdError for SettingsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            Self::Yaml(e) => Some(e),
        }
    }
}

/// Per-domain freshness windows, in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtlSettings {
    pub contest_list: u64,
    pub user_rating: u64,
    pub contest_rating: u64,
    pub standings: u64,
    pub problems: u64,
}
impl Default for TtlSettings {
    fn default() -> Self {
        Self {
            contest_list: config::ttl::CONTEST_LIST.as_secs(),
            user_rating: config::ttl::USER_RATING.as_secs(),
            contest_rating: config::ttl::CONTEST_RATING.as_secs(),
            standings: config::ttl::STANDINGS.as_secs(),
            problems: config::ttl::PROBLEMS.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub request_delay_ms: u64,
    pub timeout_ms: u64,
    pub extended_timeout_ms: u64,
    pub proxy_list_url: Option<String>,
    pub database: PathBuf,
    pub ttl: TtlSettings,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: config::api::BASE_URL.to_string(),
            request_delay_ms: config::pacing::REQUEST_DELAY.as_millis() as u64,
            timeout_ms: config::timeout::DEFAULT.as_millis() as u64,
            extended_timeout_ms: config::timeout::EXTENDED.as_millis() as u64,
            proxy_list_url: None,
            database: PathBuf::from(config::store::DATABASE),
            ttl: TtlSettings::default(),
        }
    }
}

impl Settings {
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, SettingsError> {
        serde_yaml::from_reader(rdr).map_err(SettingsError::Yaml)
    }
    /// Read settings from `path`, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| SettingsError::Io(path.to_path_buf(), e))?;
        Ok(Self::from_reader(file)?.with_env())
    }
    pub fn with_env(mut self) -> Self {
        if let Ok(v) = env::var(PROXY_LIST_ENV) {
            self.proxy_list_url = Some(v).filter(|v| !v.trim().is_empty());
        }
        if let Ok(v) = env::var(DATABASE_ENV) {
            self.database = PathBuf::from(v);
        }
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
    pub fn extended_timeout(&self) -> Duration {
        Duration::from_millis(self.extended_timeout_ms)
    }
}
