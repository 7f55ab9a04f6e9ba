use crate::{
    client::ApiClient,
    model::{Problem, ProblemSet},
    resolver::{Resolved, Resolver},
    store::CacheKey,
};
use std::{collections::BTreeSet, sync::Arc, time::Duration};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProblemFilter {
    /// Every tag must be present.
    pub tags: Vec<String>,
    pub min_rating: Option<u32>,
    pub max_rating: Option<u32>,
    pub contest_id: Option<u64>,
    pub name: Option<String>,
}
impl ProblemFilter {
    pub fn matches(&self, problem: &Problem) -> bool {
        let rated_in = |bound: Option<u32>, ok: fn(u32, u32) -> bool| match bound {
            None => true,
            Some(b) => problem.rating.map_or(false, |r| ok(r, b)),
        };
        self.tags
            .iter()
            .all(|t| problem.tags.iter().any(|p| p.eq_ignore_ascii_case(t)))
            && rated_in(self.min_rating, |r, b| r >= b)
            && rated_in(self.max_rating, |r, b| r <= b)
            && self.contest_id.map_or(true, |id| problem.contest_id == Some(id))
            && self.name.as_ref().map_or(true, |n| {
                problem.name.to_lowercase().contains(&n.to_lowercase())
            })
    }
}

#[derive(Clone)]
pub struct Problems {
    api: Arc<ApiClient>,
    resolver: Resolver,
    ttl: Duration,
}

impl Problems {
    pub fn new(api: Arc<ApiClient>, resolver: Resolver, ttl: Duration) -> Self {
        Self { api, resolver, ttl }
    }

    pub async fn catalog(&self) -> Option<Resolved<ProblemSet>> {
        self.resolver
            .resolve(&CacheKey::ProblemCatalog, self.ttl, || {
                self.api.problemset_problems()
            })
            .await
    }
    pub async fn by_id(&self, contest_id: u64, index: &str) -> Option<Resolved<Option<Problem>>> {
        Some(self.catalog().await?.map(|set| {
            set.problems
                .into_iter()
                .find(|p| p.contest_id == Some(contest_id) && p.index.eq_ignore_ascii_case(index))
        }))
    }
    pub async fn filter(&self, filter: &ProblemFilter) -> Option<Resolved<Vec<Problem>>> {
        Some(self.catalog().await?.map(|set| {
            set.problems
                .into_iter()
                .filter(|p| filter.matches(p))
                .collect()
        }))
    }
    /// Every tag used in the catalog, sorted.
    pub async fn tags(&self) -> Option<Resolved<Vec<String>>> {
        Some(self.catalog().await?.map(|set| {
            set.problems
                .into_iter()
                .flat_map(|p| p.tags)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect()
        }))
    }
}
