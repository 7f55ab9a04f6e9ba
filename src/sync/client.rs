mod envelope;
pub mod error;
pub mod retry;
pub mod transport;

pub use error::{Error, Kind};
pub use retry::{RetryPolicy, State};
pub use transport::{HttpTransport, RawResponse, Transport};

use crate::{
    clock::SharedClock,
    config,
    model::{Contest, ProblemSet, RatingChange, Standings, User},
    pool::{Egress, Pool},
    settings::Settings,
};
use chrono::{DateTime, Utc};
use envelope::{comment_of, Envelope, Status};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub message: String,
    pub endpoint: String,
    pub at: DateTime<Utc>,
}

/// Snapshot of the client's most recent outcomes.
#[derive(Debug, Clone, Default)]
pub struct Health {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<LastError>,
}

#[derive(Default)]
struct Tracker {
    last_success: Option<DateTime<Utc>>,
    last_error: Option<LastError>,
}

pub struct ApiClient {
    base: Url,
    pool: Pool,
    transport: Arc<dyn Transport>,
    clock: SharedClock,
    policy: RetryPolicy,
    timeout: Duration,
    extended_timeout: Duration,
    tracker: Mutex<Tracker>,
}

impl ApiClient {
    pub fn new(settings: &Settings, pool: Pool, clock: SharedClock) -> std::result::Result<Self, url::ParseError> {
        let mut base = settings.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Self {
            base: Url::parse(&base)?,
            pool,
            transport: Arc::new(HttpTransport),
            clock,
            policy: RetryPolicy::default(),
            timeout: settings.timeout(),
            extended_timeout: settings.extended_timeout(),
            tracker: Mutex::new(Tracker::default()),
        })
    }
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
    pub fn health(&self) -> Health {
        let tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        Health {
            last_success: tracker.last_success,
            last_error: tracker.last_error.clone(),
        }
    }
    pub fn last_error(&self) -> Option<LastError> {
        self.health().last_error
    }

    pub fn timeout_for(&self, endpoint: &str) -> Duration {
        if config::timeout::EXTENDED_ENDPOINTS
            .iter()
            .any(|v| *v == endpoint)
        {
            self.extended_timeout
        } else {
            self.timeout
        }
    }
    fn url(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base
            .join(endpoint)
            .map_err(|e| Error::new(endpoint, Kind::Url(e)))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Calls `endpoint` and decodes the envelope's `result`.
    ///
    /// Every attempt, retries included, runs on the same pool slot, so a call
    /// that keeps failing holds back the calls queued behind it.
    pub async fn request<T: DeserializeOwned>(&self, endpoint: &str, params: &[(&str, String)]) -> Result<T> {
        let ret = match self.url(endpoint, params) {
            Ok(url) => {
                let timeout = self.timeout_for(endpoint);
                self.pool
                    .schedule(|egress| self.run(egress, endpoint, &url, timeout))
                    .await
            }
            Err(e) => Err(e),
        };
        let mut tracker = self.tracker.lock().unwrap_or_else(|e| e.into_inner());
        match &ret {
            Ok(_) => tracker.last_success = Some(self.clock.now()),
            Err(e) => {
                error!("{}", e);
                tracker.last_error = Some(LastError {
                    message: e.message(),
                    endpoint: e.endpoint().to_string(),
                    at: self.clock.now(),
                })
            }
        }
        ret
    }

    async fn run<T: DeserializeOwned>(&self, egress: &Egress, endpoint: &str, url: &Url, timeout: Duration) -> Result<T> {
        let abandoned = || Error::new(endpoint, Kind::Upstream("request abandoned".to_string()));
        let mut state = self.policy.start();
        let mut value = None;
        let mut last = None;
        loop {
            match state {
                State::Attempting(n) => match self.attempt(egress, endpoint, url, timeout).await {
                    Ok(v) => {
                        debug!("{} succeeded via {} on attempt {}", endpoint, egress.label, n);
                        value = Some(v);
                        state = self.policy.after_success(n);
                    }
                    Err(e) => {
                        state = self.policy.after_failure(n, e.retryable());
                        last = Some(e);
                    }
                },
                State::Retrying { next, delay } => {
                    if let Some(e) = &last {
                        warn!(
                            "Retrying {} (attempt {}) in {}s via {}: {}",
                            endpoint,
                            next,
                            delay.as_secs_f32(),
                            egress.label,
                            e
                        );
                    }
                    self.clock.sleep(delay).await;
                    state = State::Attempting(next);
                }
                State::Succeeded => return value.ok_or_else(abandoned),
                State::Failed => return Err(last.unwrap_or_else(abandoned)),
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(&self, egress: &Egress, endpoint: &str, url: &Url, timeout: Duration) -> Result<T> {
        let response = tokio::time::timeout(timeout, self.transport.get(egress, url))
            .await
            .map_err(|_| Error::new(endpoint, Kind::Timeout(timeout)))?
            .map_err(|e| Error::new(endpoint, Kind::Network(e)))?;
        if !(200..300).contains(&response.status) {
            return Err(Error::from_status(
                endpoint,
                response.status,
                comment_of(&response.body),
            ));
        }
        let envelope: Envelope<T> =
            serde_json::from_str(&response.body).map_err(|e| Error::new(endpoint, Kind::Decode(e)))?;
        match (envelope.status, envelope.result) {
            (Status::Ok, Some(v)) => Ok(v),
            (Status::Ok, None) => Err(Error::new(
                endpoint,
                Kind::Upstream("response has no result".to_string()),
            )),
            (Status::Failed, _) => Err(Error::new(
                endpoint,
                Kind::Upstream(
                    envelope
                        .comment
                        .unwrap_or_else(|| "request failed".to_string()),
                ),
            )),
        }
    }

    pub async fn contest_list(&self, gym: bool) -> Result<Vec<Contest>> {
        self.request("contest.list", &[("gym", gym.to_string())]).await
    }
    pub async fn contest_standings(&self, contest_id: u64, handles: &[String], unofficial: bool) -> Result<Standings> {
        let mut params = vec![
            ("contestId", contest_id.to_string()),
            ("showUnofficial", unofficial.to_string()),
        ];
        if !handles.is_empty() {
            params.push(("handles", handles.join(";")));
        }
        self.request("contest.standings", &params).await
    }
    pub async fn contest_rating_changes(&self, contest_id: u64) -> Result<Vec<RatingChange>> {
        self.request("contest.ratingChanges", &[("contestId", contest_id.to_string())])
            .await
    }
    pub async fn user_rating(&self, handle: &str) -> Result<Vec<RatingChange>> {
        self.request("user.rating", &[("handle", handle.to_string())])
            .await
    }
    pub async fn user_info(&self, handles: &[String]) -> Result<Vec<User>> {
        self.request("user.info", &[("handles", handles.join(";"))])
            .await
    }
    pub async fn problemset_problems(&self) -> Result<ProblemSet> {
        self.request("problemset.problems", &[]).await
    }
    /// Startup connectivity check; unlike the cached paths, its failure is returned as is.
    pub async fn check_connectivity(&self) -> Result<()> {
        self.request::<serde_json::Value>("problemset.recentStatus", &[("count", "1".to_string())])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, error::BoxedError};
    use futures::future::{BoxFuture, FutureExt};
    use std::collections::VecDeque;

    struct Scripted {
        replies: Mutex<VecDeque<std::result::Result<RawResponse, String>>>,
        urls: Mutex<Vec<String>>,
    }
    impl Scripted {
        fn new(replies: Vec<std::result::Result<(u16, &str), &str>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(
                    replies
                        .into_iter()
                        .map(|v| {
                            v.map(|(status, body)| RawResponse {
                                status,
                                body: body.to_string(),
                            })
                            .map_err(str::to_string)
                        })
                        .collect(),
                ),
                urls: Mutex::new(Vec::new()),
            })
        }
        fn calls(&self) -> usize {
            self.urls.lock().unwrap().len()
        }
    }
    impl Transport for Scripted {
        fn get<'a>(&'a self, _egress: &'a Egress, url: &'a Url) -> BoxFuture<'a, std::result::Result<RawResponse, BoxedError>> {
            self.urls.lock().unwrap().push(url.to_string());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err("script exhausted".to_string()));
            async move { reply.map_err(BoxedError::from) }.boxed()
        }
    }

    fn client(transport: Arc<Scripted>) -> (ApiClient, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::default());
        let settings = Settings {
            base_url: "https://cf.test/api".to_string(),
            ..Settings::default()
        };
        let pool = Pool::direct(Duration::ZERO, clock.clone()).unwrap();
        let client = ApiClient::new(&settings, pool, clock.clone())
            .unwrap()
            .with_transport(transport)
            .with_retry(RetryPolicy {
                retries: 2,
                base_delay: Duration::from_secs(1),
            });
        (client, clock)
    }

    const OK_EMPTY: &str = r#"{"status":"OK","result":[]}"#;

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let t = Scripted::new(vec![Ok((404, "not here")), Ok((200, OK_EMPTY))]);
        let (c, clock) = client(t.clone());
        let e = c.user_rating("nobody").await.unwrap_err();
        assert_eq!(e.status(), Some(404));
        assert!(!e.retryable());
        assert_eq!(t.calls(), 1);
        assert!(clock.sleeps().is_empty());
        assert_eq!(c.last_error().unwrap().endpoint, "user.rating");
    }

    #[tokio::test]
    async fn throttled_and_server_errors_back_off() {
        let t = Scripted::new(vec![Ok((429, "")), Ok((503, "")), Ok((500, ""))]);
        let (c, clock) = client(t.clone());
        let e = c.contest_list(false).await.unwrap_err();
        assert_eq!(e.status(), Some(500));
        assert_eq!(t.calls(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
        assert!(c.health().last_success.is_none());
    }

    #[tokio::test]
    async fn recovers_within_retry_budget() {
        let t = Scripted::new(vec![
            Err("connection reset"),
            Ok((200, r#"{"status":"FAILED","comment":"Call limit exceeded"}"#)),
            Ok((200, OK_EMPTY)),
        ]);
        let (c, _) = client(t.clone());
        let v = c.user_rating("tourist").await.unwrap();
        assert!(v.is_empty());
        assert_eq!(t.calls(), 3);
        let health = c.health();
        assert!(health.last_success.is_some());
        assert!(health.last_error.is_none());
    }

    #[tokio::test]
    async fn bad_request_reports_upstream_comment() {
        let t = Scripted::new(vec![Ok((
            400,
            r#"{"status":"FAILED","comment":"handle: User with handle x not found"}"#,
        ))]);
        let (c, _) = client(t.clone());
        let e = c.user_rating("x").await.unwrap_err();
        assert_eq!(e.message(), "handle: User with handle x not found");
        assert_eq!(
            c.last_error().unwrap().message,
            "handle: User with handle x not found"
        );
    }

    #[tokio::test]
    async fn url_and_timeout_selection() {
        let t = Scripted::new(vec![Ok((200, OK_EMPTY))]);
        let (c, _) = client(t.clone());
        c.contest_rating_changes(1950).await.unwrap();
        assert_eq!(
            t.urls.lock().unwrap()[0],
            "https://cf.test/api/contest.ratingChanges?contestId=1950"
        );
        assert_eq!(c.timeout_for("contest.standings"), config::timeout::EXTENDED);
        assert_eq!(c.timeout_for("user.rating"), config::timeout::DEFAULT);
    }

    struct Hung {
        calls: Mutex<usize>,
    }
    impl Transport for Hung {
        fn get<'a>(&'a self, _egress: &'a Egress, _url: &'a Url) -> BoxFuture<'a, std::result::Result<RawResponse, BoxedError>> {
            *self.calls.lock().unwrap() += 1;
            futures::future::pending().boxed()
        }
    }

    #[tokio::test]
    async fn hung_call_times_out_and_is_retried() {
        let clock = Arc::new(ManualClock::default());
        let settings = Settings {
            base_url: "https://cf.test/api".to_string(),
            timeout_ms: 20,
            ..Settings::default()
        };
        let hung = Arc::new(Hung { calls: Mutex::new(0) });
        let c = ApiClient::new(&settings, Pool::direct(Duration::ZERO, clock.clone()).unwrap(), clock.clone())
            .unwrap()
            .with_transport(hung.clone())
            .with_retry(RetryPolicy {
                retries: 2,
                base_delay: Duration::from_secs(1),
            });
        let e = c.user_rating("tourist").await.unwrap_err();
        assert!(matches!(e.kind(), Kind::Timeout(t) if *t == Duration::from_millis(20)));
        assert!(e.retryable());
        assert_eq!(*hung.calls.lock().unwrap(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn garbage_body_is_retried() {
        let t = Scripted::new(vec![Ok((200, "<html>")), Ok((200, "<html>")), Ok((200, "<html>"))]);
        let (c, _) = client(t.clone());
        let e = c.problemset_problems().await.unwrap_err();
        assert!(matches!(e.kind(), Kind::Decode(_)));
        assert_eq!(t.calls(), 3);
    }
}
