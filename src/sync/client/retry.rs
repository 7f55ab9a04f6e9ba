use crate::config::retry::{BASE_DELAY, RETRY_COUNT};
use std::time::Duration;

/// Where a request stands between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Attempting(u32),
    Retrying { next: u32, delay: Duration },
    Failed,
    Succeeded,
}

/// Linear backoff: the wait after attempt `n` is `base_delay * n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}
impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: RETRY_COUNT,
            base_delay: BASE_DELAY,
        }
    }
}
impl RetryPolicy {
    pub fn start(&self) -> State {
        State::Attempting(1)
    }
    pub fn after_success(&self, _attempt: u32) -> State {
        State::Succeeded
    }
    pub fn after_failure(&self, attempt: u32, retryable: bool) -> State {
        if retryable && attempt <= self.retries {
            State::Retrying {
                next: attempt + 1,
                delay: self.base_delay * attempt,
            }
        } else {
            State::Failed
        }
    }
}
