pub mod proxy;

use crate::{clock::SharedClock, config, pacer::Pacer, settings::Settings};
use log::{info, warn};
use proxy::{parse_list, ProxyEndpoint};
use reqwest::{Client, Proxy};
use std::{
    future::Future,
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

/// The way out of one slot: a client bound (or not) to a proxy.
pub struct Egress {
    pub label: String,
    pub proxy: Option<ProxyEndpoint>,
    pub client: Client,
}
impl Egress {
    fn direct() -> reqwest::Result<Self> {
        Ok(Self {
            label: "direct".to_string(),
            proxy: None,
            client: Client::builder().user_agent(config::api::USER_AGENT).build()?,
        })
    }
    fn via(endpoint: ProxyEndpoint) -> reqwest::Result<Self> {
        let mut proxy = Proxy::all(endpoint.url())?;
        if let Some(c) = &endpoint.credentials {
            proxy = proxy.basic_auth(&c.user, &c.password);
        }
        Ok(Self {
            label: format!("proxy {}", endpoint),
            client: Client::builder()
                .user_agent(config::api::USER_AGENT)
                .proxy(proxy)
                .build()?,
            proxy: Some(endpoint),
        })
    }
}

struct Slot {
    egress: Egress,
    pacer: Pacer,
}

/// Fixed set of paced egress slots, used round-robin. Slot 0 is always direct.
pub struct Pool {
    slots: Vec<Slot>,
    next: AtomicUsize,
}

impl Pool {
    fn with_egress(egress: Vec<Egress>, delay: Duration, clock: &SharedClock) -> Self {
        Self {
            slots: egress
                .into_iter()
                .map(|egress| Slot {
                    egress,
                    pacer: Pacer::new(delay, clock.clone()),
                })
                .collect(),
            next: AtomicUsize::new(0),
        }
    }

    pub fn direct(delay: Duration, clock: SharedClock) -> reqwest::Result<Self> {
        Ok(Self::with_egress(vec![Egress::direct()?], delay, &clock))
    }

    /// Builds the direct slot plus one slot per valid line of `list`.
    pub fn from_proxy_list(list: &str, delay: Duration, clock: SharedClock) -> reqwest::Result<Self> {
        let mut egress = vec![Egress::direct()?];
        for line in parse_list(list) {
            match line.map(Egress::via) {
                Ok(Ok(v)) => egress.push(v),
                Ok(Err(e)) => warn!("Skipping proxy: {}", e),
                Err(e) => warn!("{}", e),
            }
        }
        Ok(Self::with_egress(egress, delay, &clock))
    }

    /// Fetches the configured proxy list once and builds the pool from it.
    /// Any failure leaves a direct-only pool.
    pub async fn connect(settings: &Settings, clock: SharedClock) -> reqwest::Result<Self> {
        let delay = settings.request_delay();
        let pool = match &settings.proxy_list_url {
            None => Self::direct(delay, clock)?,
            Some(url) => match fetch_list(url).await {
                Ok(list) => Self::from_proxy_list(&list, delay, clock)?,
                Err(e) => {
                    warn!("Can't load proxy list from {}: {}", url, e);
                    Self::direct(delay, clock)?
                }
            },
        };
        info!("Connection pool ready with {} slot(s)", pool.size());
        Ok(pool)
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|v| v.egress.label.as_str())
    }
    pub fn proxies(&self) -> impl Iterator<Item = &ProxyEndpoint> {
        self.slots.iter().filter_map(|v| v.egress.proxy.as_ref())
    }

    /// Runs `task` on the next slot in circular order, behind that slot's pacer.
    pub async fn schedule<'a, F, Fut, T>(&'a self, task: F) -> T
    where
        F: FnOnce(&'a Egress) -> Fut,
        Fut: Future<Output = T>,
    {
        let slot = &self.slots[self.next.fetch_add(1, Ordering::Relaxed) % self.slots.len()];
        slot.pacer.schedule(|| task(&slot.egress)).await
    }
}

async fn fetch_list(url: &str) -> reqwest::Result<String> {
    Client::builder()
        .user_agent(config::api::USER_AGENT)
        .timeout(config::proxy::LIST_TIMEOUT)
        .build()?
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use futures::future::join_all;
    use std::{collections::HashMap, sync::Arc};

    fn clock() -> SharedClock {
        Arc::new(ManualClock::default())
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let pool = Pool::from_proxy_list(
            "10.0.0.1:8080\n10.0.0.2:8080:user:pass\nnot a proxy\n10.0.0.3:3128\n",
            Duration::ZERO,
            clock(),
        )
        .unwrap();
        assert_eq!(pool.size(), 4);
        assert_eq!(
            pool.labels().collect::<Vec<_>>(),
            vec![
                "direct",
                "proxy 10.0.0.1:8080",
                "proxy 10.0.0.2:8080",
                "proxy 10.0.0.3:3128"
            ]
        );
        let with_auth: Vec<bool> = pool.proxies().map(|p| p.credentials.is_some()).collect();
        assert_eq!(with_auth, vec![false, true, false]);
    }

    #[test]
    fn empty_list_keeps_direct_slot() {
        let pool = Pool::from_proxy_list("", Duration::ZERO, clock()).unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.labels().next(), Some("direct"));
    }

    #[tokio::test]
    async fn unreachable_list_degrades_to_direct() {
        let settings = Settings {
            proxy_list_url: Some("http://127.0.0.1:9/proxies.txt".to_string()),
            ..Settings::default()
        };
        let pool = Pool::connect(&settings, clock()).await.unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[tokio::test]
    async fn calls_are_spread_round_robin() {
        let pool = Pool::from_proxy_list(
            "10.0.0.1:1\n10.0.0.2:2\n",
            Duration::from_millis(10),
            clock(),
        )
        .unwrap();
        let labels = join_all((0..10).map(|_| pool.schedule(|e| async move { e.label.clone() }))).await;
        let mut counts: HashMap<String, usize> = HashMap::new();
        for label in &labels {
            *counts.entry(label.clone()).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        let mut sizes = counts.values().copied().collect::<Vec<_>>();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 3, 4]);
        assert_eq!(labels[0], "direct");
        assert_eq!(labels[3], "direct");
    }
}
