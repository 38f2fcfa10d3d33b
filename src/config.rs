use crate::{DEFAULT_LOCK_POLL_MS, DEFAULT_LOCK_TIMEOUT_MS, DEFAULT_POOL_PAGES, PAGE_SIZE};
use std::time::Duration;

/// How a blocked lock request decides that it can never be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlockPolicy {
    /// Give up once `lock_timeout` has elapsed.
    Timeout,
    /// Give up as soon as the requester sits on a cycle of the waits-for
    /// graph, falling back to `lock_timeout` otherwise.
    WaitsForGraph,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub page_size: usize,
    pub buffer_pool_pages: usize,
    pub lock_timeout: Duration,
    pub lock_poll_interval: Duration,
    pub deadlock_policy: DeadlockPolicy,
}

impl Config {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_buffer_pool_pages(mut self, pages: usize) -> Self {
        self.buffer_pool_pages = pages;
        self
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn with_lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval = interval;
        self
    }

    pub fn with_deadlock_policy(mut self, policy: DeadlockPolicy) -> Self {
        self.deadlock_policy = policy;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            buffer_pool_pages: DEFAULT_POOL_PAGES,
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
            lock_poll_interval: Duration::from_millis(DEFAULT_LOCK_POLL_MS),
            deadlock_policy: DeadlockPolicy::Timeout,
        }
    }
}
