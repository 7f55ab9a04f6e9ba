use crate::{
    client::ApiClient,
    model::{Contest, Phase},
    resolver::{Resolved, Resolver, Source},
    store::{CacheKey, ContestScope},
};
use std::{sync::Arc, time::Duration};

/// Which contest list to read. `All` merges the official and gym lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Official,
    Gym,
    All,
}
impl Scope {
    fn parts(self) -> &'static [ContestScope] {
        match self {
            Self::Official => &[ContestScope::Official],
            Self::Gym => &[ContestScope::Gym],
            Self::All => &[ContestScope::Official, ContestScope::Gym],
        }
    }
}

#[derive(Clone)]
pub struct Contests {
    api: Arc<ApiClient>,
    resolver: Resolver,
    ttl: Duration,
}

impl Contests {
    pub fn new(api: Arc<ApiClient>, resolver: Resolver, ttl: Duration) -> Self {
        Self { api, resolver, ttl }
    }

    async fn load_part(&self, scope: ContestScope, force: bool) -> Option<Resolved<Vec<Contest>>> {
        let key = CacheKey::ContestList(scope);
        let fetch = || self.api.contest_list(scope == ContestScope::Gym);
        if force {
            self.resolver.refresh(&key, fetch).await
        } else {
            self.resolver.resolve(&key, self.ttl, fetch).await
        }
    }

    async fn load_scope(&self, scope: Scope, force: bool) -> Option<Resolved<Vec<Contest>>> {
        match scope.parts() {
            [part] => self.load_part(*part, force).await,
            _ => {
                let (official, gym) = futures::join!(
                    self.load_part(ContestScope::Official, force),
                    self.load_part(ContestScope::Gym, force)
                );
                merge(official, gym)
            }
        }
    }

    /// Contest list for `scope`, from cache while it is fresh.
    pub async fn load(&self, scope: Scope) -> Option<Resolved<Vec<Contest>>> {
        self.load_scope(scope, false).await
    }
    /// Contest list for `scope`, fetched live unless upstream is failing.
    pub async fn refresh(&self, scope: Scope) -> Option<Resolved<Vec<Contest>>> {
        self.load_scope(scope, true).await
    }

    async fn select<F>(&self, scope: Scope, filter: F) -> Option<Resolved<Vec<Contest>>>
    where
        F: Fn(&Contest) -> bool,
    {
        Some(
            self.load(scope)
                .await?
                .map(|v| v.into_iter().filter(|c| filter(c)).collect()),
        )
    }

    /// Not yet started, soonest first.
    pub async fn upcoming(&self, scope: Scope) -> Option<Resolved<Vec<Contest>>> {
        Some(self.select(scope, |c| c.phase == Phase::Before).await?.map(|mut v| {
            v.sort_by_key(|c| c.start_time_seconds.unwrap_or(i64::MAX));
            v
        }))
    }
    pub async fn ongoing(&self, scope: Scope) -> Option<Resolved<Vec<Contest>>> {
        self.select(scope, |c| c.phase.is_running()).await
    }
    /// Finished contests, most recently ended first.
    pub async fn finished(&self, scope: Scope) -> Option<Resolved<Vec<Contest>>> {
        Some(
            self.select(scope, |c| c.phase == Phase::Finished)
                .await?
                .map(|mut v| {
                    v.sort_by_key(|c| std::cmp::Reverse(c.end_time_seconds()));
                    v
                }),
        )
    }
    pub async fn latest_finished(&self, scope: Scope) -> Option<Resolved<Option<Contest>>> {
        Some(
            self.finished(scope)
                .await?
                .map(|v| v.into_iter().next()),
        )
    }
    pub async fn by_id(&self, id: u64) -> Option<Resolved<Option<Contest>>> {
        Some(
            self.load(Scope::All)
                .await?
                .map(|v| v.into_iter().find(|c| c.id == id)),
        )
    }
    /// Contests whose name contains every word of `text`, ignoring case.
    pub async fn search(&self, scope: Scope, text: &str) -> Option<Resolved<Vec<Contest>>> {
        let words: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        self.select(scope, |c| {
            let name = c.name.to_lowercase();
            words.iter().all(|w| name.contains(w.as_str()))
        })
        .await
    }
}

/// Usable when either part has data; stale when either part did not come
/// back clean.
fn merge(
    official: Option<Resolved<Vec<Contest>>>,
    gym: Option<Resolved<Vec<Contest>>>,
) -> Option<Resolved<Vec<Contest>>> {
    let stale = official.as_ref().map_or(true, |v| v.stale) || gym.as_ref().map_or(true, |v| v.stale);
    let parts: Vec<Resolved<Vec<Contest>>> = official.into_iter().chain(gym).collect();
    if parts.is_empty() {
        return None;
    }
    let source = if parts.iter().any(|v| v.source == Source::Api) {
        Source::Api
    } else {
        Source::Cache
    };
    Some(Resolved {
        data: parts.into_iter().flat_map(|v| v.data).collect(),
        source,
        stale,
    })
}
