use chrono::{DateTime, Utc};
use futures::future::{self, BoxFuture, FutureExt};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

/// Source of wall-clock time and delays.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

pub type SharedClock = Arc<dyn Clock>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

struct ManualState {
    now: DateTime<Utc>,
    sleeps: Vec<Duration>,
}

/// Virtual clock: `sleep` completes immediately and moves time forward.
pub struct ManualClock {
    state: Mutex<ManualState>,
}
impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new(ManualState {
                now: start,
                sleeps: Vec::new(),
            }),
        }
    }
    pub fn advance(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.now = state.now + to_signed(duration);
    }
    pub fn rewind(&self, duration: Duration) {
        let mut state = self.state.lock().unwrap();
        state.now = state.now - to_signed(duration);
    }
    /// Every duration passed to `sleep` so far, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.state.lock().unwrap().sleeps.clone()
    }
}
impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap().now
    }
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        {
            let mut state = self.state.lock().unwrap();
            state.sleeps.push(duration);
            state.now = state.now + to_signed(duration);
        }
        future::ready(()).boxed()
    }
}

pub(crate) fn to_signed(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::max_value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_sleep_moves_time() {
        let clock = ManualClock::default();
        let start = clock.now();
        clock.sleep(Duration::from_secs(3)).await;
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now() - start, chrono::Duration::seconds(5));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(3)]);
    }
}
