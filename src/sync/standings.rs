use crate::{
    client::ApiClient,
    model::Standings as Table,
    resolver::{Resolved, Resolver},
    store::{canonical_handles, CacheKey, StandingsKey},
};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct Standings {
    api: Arc<ApiClient>,
    resolver: Resolver,
    ttl: Duration,
}

impl Standings {
    pub fn new(api: Arc<ApiClient>, resolver: Resolver, ttl: Duration) -> Self {
        Self { api, resolver, ttl }
    }

    /// Standings of `contest_id` restricted to `handles`. Equivalent handle sets
    /// share one cache row whatever their order or case.
    pub async fn get<S: AsRef<str>>(&self, contest_id: u64, handles: &[S], unofficial: bool) -> Option<Resolved<Table>> {
        let handles = canonical_handles(handles);
        let key = CacheKey::Standings(StandingsKey::new(contest_id, handles.as_slice(), unofficial));
        self.resolver
            .resolve(&key, self.ttl, || {
                self.api.contest_standings(contest_id, &handles, unofficial)
            })
            .await
    }
}
