use crate::{
    client::ApiClient,
    clock::{SharedClock, SystemClock},
    contests::Contests,
    pool::Pool,
    problems::Problems,
    ratings::Ratings,
    resolver::Resolver,
    settings::Settings,
    standings::Standings,
    store::{CacheStore, SqliteStore, StoreError},
};
use log::warn;
use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

#[derive(Debug)]
pub enum SetupError {
    Client(reqwest::Error),
    BaseUrl(url::ParseError),
    Store(StoreError),
}
impl fmt::Display for SetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client(e) => write!(f, "Error building client: {}", e),
            Self::BaseUrl(e) => write!(f, "Invalid base url: {}", e),
            Self::Store(e) => write!(f, "Error opening cache: {}", e),
        }
    }
}
impl StdError for SetupError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Client(e) => Some(e),
            Self::BaseUrl(e) => Some(e),
            Self::Store(e) => Some(e),
        }
    }
}

/// Everything the command layer talks to, wired from one `Settings`.
pub struct Hub {
    pub api: Arc<ApiClient>,
    pub contests: Contests,
    pub ratings: Ratings,
    pub standings: Standings,
    pub problems: Problems,
}

impl Hub {
    /// Builds the live hub. A cache file that can't be opened is replaced by an
    /// in-memory one, so requests still go out.
    pub async fn open(settings: &Settings) -> Result<Self, SetupError> {
        let clock: SharedClock = Arc::new(SystemClock);
        let pool = Pool::connect(settings, clock.clone())
            .await
            .map_err(SetupError::Client)?;
        let store = SqliteStore::open(&settings.database)
            .or_else(|e| {
                warn!("Can't open cache {}: {}, caching in memory", settings.database.display(), e);
                SqliteStore::in_memory()
            })
            .map_err(SetupError::Store)?;
        let api = ApiClient::new(settings, pool, clock.clone()).map_err(SetupError::BaseUrl)?;
        Ok(Self::assemble(settings, Arc::new(api), Arc::new(store), clock))
    }

    pub fn assemble(settings: &Settings, api: Arc<ApiClient>, store: Arc<dyn CacheStore>, clock: SharedClock) -> Self {
        let resolver = Resolver::new(store, clock);
        let ttl = &settings.ttl;
        Self {
            contests: Contests::new(api.clone(), resolver.clone(), Duration::from_secs(ttl.contest_list)),
            ratings: Ratings::new(
                api.clone(),
                resolver.clone(),
                Duration::from_secs(ttl.user_rating),
                Duration::from_secs(ttl.contest_rating),
            ),
            standings: Standings::new(api.clone(), resolver.clone(), Duration::from_secs(ttl.standings)),
            problems: Problems::new(api.clone(), resolver, Duration::from_secs(ttl.problems)),
            api,
        }
    }
}
