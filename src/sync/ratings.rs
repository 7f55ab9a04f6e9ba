use crate::{
    client::ApiClient,
    model::RatingChange,
    resolver::{Resolved, Resolver},
    store::{normalize_handle, CacheKey},
};
use std::{sync::Arc, time::Duration};

#[derive(Clone)]
pub struct Ratings {
    api: Arc<ApiClient>,
    resolver: Resolver,
    user_ttl: Duration,
    contest_ttl: Duration,
}

impl Ratings {
    pub fn new(api: Arc<ApiClient>, resolver: Resolver, user_ttl: Duration, contest_ttl: Duration) -> Self {
        Self {
            api,
            resolver,
            user_ttl,
            contest_ttl,
        }
    }

    /// Rating history of one handle, oldest contest first.
    pub async fn by_handle(&self, handle: &str) -> Option<Resolved<Vec<RatingChange>>> {
        let handle = normalize_handle(handle);
        self.resolver
            .resolve(&CacheKey::UserRating(handle.clone()), self.user_ttl, || {
                self.api.user_rating(&handle)
            })
            .await
    }
    /// Rating changes published for one contest.
    pub async fn by_contest(&self, contest_id: u64) -> Option<Resolved<Vec<RatingChange>>> {
        self.resolver
            .resolve(&CacheKey::ContestRating(contest_id), self.contest_ttl, || {
                self.api.contest_rating_changes(contest_id)
            })
            .await
    }

    /// `None` inside means the handle has never been rated.
    pub async fn current_rating(&self, handle: &str) -> Option<Resolved<Option<i32>>> {
        Some(
            self.by_handle(handle)
                .await?
                .map(|v| v.last().map(|c| c.new_rating)),
        )
    }
    pub async fn max_rating(&self, handle: &str) -> Option<Resolved<Option<i32>>> {
        Some(
            self.by_handle(handle)
                .await?
                .map(|v| v.iter().map(|c| c.new_rating).max()),
        )
    }
}
