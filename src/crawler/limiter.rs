//! Global and per-host concurrency limits
//!
//! Two layers of counting semaphores bound in-flight fetches: one shared by
//! every host, and one per host created the first time that host is seen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

/// Permits held for the duration of one URL's fetch (including its retries)
pub struct HostPermit {
    _global: OwnedSemaphorePermit,
    _host: OwnedSemaphorePermit,
}

/// Concurrency limiter keyed by host
pub struct HostLimiter {
    /// Bounds in-flight fetches across all hosts
    global: Arc<Semaphore>,

    /// Lazily populated per-host semaphores
    hosts: Mutex<HashMap<String, Arc<Semaphore>>>,

    per_host_limit: usize,
}

impl HostLimiter {
    /// Creates a limiter
    ///
    /// # Arguments
    ///
    /// * `global_limit` - Maximum in-flight fetches overall
    /// * `per_host_limit` - Maximum in-flight fetches to any single host
    pub fn new(global_limit: usize, per_host_limit: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_limit.max(1))),
            hosts: Mutex::new(HashMap::new()),
            per_host_limit: per_host_limit.max(1),
        }
    }

    /// Returns the semaphore for a host, creating it on first use
    ///
    /// Creation happens under the map lock, so two tasks racing on a new host
    /// always end up sharing one semaphore.
    fn host_semaphore(&self, host: &str) -> Arc<Semaphore> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        hosts
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }

    /// Waits for a global slot, then for a slot on `host`
    pub async fn acquire(&self, host: &str) -> Result<HostPermit, AcquireError> {
        let global = self.global.clone().acquire_owned().await?;
        let host = self.host_semaphore(host).acquire_owned().await?;
        Ok(HostPermit {
            _global: global,
            _host: host,
        })
    }

    /// Number of hosts seen so far
    pub fn tracked_hosts(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Free global slots right now
    pub fn available_global(&self) -> usize {
        self.global.available_permits()
    }

    /// Free slots for `host` right now
    pub fn available_for(&self, host: &str) -> usize {
        self.host_semaphore(host).available_permits()
    }
}
