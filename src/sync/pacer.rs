use crate::clock::{to_signed, SharedClock};
use chrono::{DateTime, Utc};
use std::{future::Future, time::Duration};
use tokio::sync::Mutex;

/// Runs tasks one at a time, keeping at least `delay` between the end of one
/// task and the start of the next.
///
/// The queue is the lock itself: tokio's mutex hands out the guard in request
/// order, so tasks start in the order they were scheduled.
pub struct Pacer {
    delay: Duration,
    clock: SharedClock,
    last_completed: Mutex<Option<DateTime<Utc>>>,
}

impl Pacer {
    pub fn new(delay: Duration, clock: SharedClock) -> Self {
        Self {
            delay,
            clock,
            last_completed: Mutex::new(None),
        }
    }

    fn wait_time(&self, last: DateTime<Utc>) -> Option<Duration> {
        let ready = last.checked_add_signed(to_signed(self.delay))?;
        (ready - self.clock.now())
            .to_std()
            .ok()
            .filter(|v| !v.is_zero())
    }

    pub async fn schedule<F, Fut, T>(&self, task: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let mut last = self.last_completed.lock().await;
        if let Some(wait) = last.and_then(|v| self.wait_time(v)) {
            self.clock.sleep(wait).await;
        }
        let ret = task().await;
        *last = Some(self.clock.now());
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use futures::future::join_all;
    use std::sync::{Arc, Mutex as StdMutex};

    const DELAY: Duration = Duration::from_millis(500);

    #[tokio::test]
    async fn back_to_back_tasks_are_spaced() {
        let clock = Arc::new(ManualClock::default());
        let pacer = Pacer::new(DELAY, clock.clone());
        let starts = StdMutex::new(Vec::new());
        join_all((0..5).map(|i| {
            let clock = clock.clone();
            let starts = &starts;
            pacer.schedule(move || async move {
                starts.lock().unwrap().push((i, clock.now()));
            })
        }))
        .await;
        let starts = starts.into_inner().unwrap();
        assert_eq!(
            starts.iter().map(|v| v.0).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
        for pair in starts.windows(2) {
            assert!(pair[1].1 - pair[0].1 >= to_signed(DELAY));
        }
        assert_eq!(clock.sleeps(), vec![DELAY; 4]);
    }

    #[tokio::test]
    async fn delay_counts_from_completion() {
        let clock = Arc::new(ManualClock::default());
        let pacer = Pacer::new(DELAY, clock.clone());
        pacer
            .schedule(|| {
                clock.advance(Duration::from_millis(300));
                async {}
            })
            .await;
        clock.advance(Duration::from_millis(200));
        pacer.schedule(|| async {}).await;
        clock.advance(Duration::from_millis(100));
        pacer.schedule(|| async {}).await;
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(300), Duration::from_millis(400)]);
    }

    #[tokio::test]
    async fn failed_task_keeps_queue_usable() {
        let clock = Arc::new(ManualClock::default());
        let pacer = Pacer::new(DELAY, clock.clone());
        let first: Result<(), &str> = pacer.schedule(|| async { Err("boom") }).await;
        assert!(first.is_err());
        let second: Result<u32, &str> = pacer.schedule(|| async { Ok(7) }).await;
        assert_eq!(second, Ok(7));
        assert_eq!(clock.sleeps(), vec![DELAY]);
    }
}
