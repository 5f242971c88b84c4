use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSnapshot {
    pub limit: usize,
    pub in_flight: usize,
    pub waiters: usize,
    pub peak_in_flight: usize,
}

#[derive(Debug, Default)]
struct Gauges {
    in_flight: AtomicUsize,
    waiters: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

/// Bounds how many classifier calls run at once.
#[derive(Debug, Clone)]
pub struct CallLimiter {
    semaphore: Arc<Semaphore>,
    limit: usize,
    gauges: Arc<Gauges>,
}

impl CallLimiter {
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
            gauges: Arc::new(Gauges::default()),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn snapshot(&self) -> LimiterSnapshot {
        LimiterSnapshot {
            limit: self.limit,
            in_flight: self.gauges.in_flight.load(Ordering::Relaxed),
            waiters: self.gauges.waiters.load(Ordering::Relaxed),
            peak_in_flight: self.gauges.peak_in_flight.load(Ordering::Relaxed),
        }
    }

    pub(crate) async fn acquire(&self) -> Result<CallPermit, AcquireError> {
        let waiter = WaiterGuard::new(Arc::clone(&self.gauges));
        let permit = Arc::clone(&self.semaphore).acquire_owned().await?;
        drop(waiter);
        let now = self.gauges.in_flight.fetch_add(1, Ordering::Relaxed) + 1;
        self.gauges.peak_in_flight.fetch_max(now, Ordering::Relaxed);
        Ok(CallPermit {
            _permit: permit,
            gauges: Arc::clone(&self.gauges),
        })
    }
}

pub(crate) struct CallPermit {
    _permit: OwnedSemaphorePermit,
    gauges: Arc<Gauges>,
}

impl Drop for CallPermit {
    fn drop(&mut self) {
        self.gauges.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

struct WaiterGuard {
    gauges: Arc<Gauges>,
}

impl WaiterGuard {
    fn new(gauges: Arc<Gauges>) -> Self {
        gauges.waiters.fetch_add(1, Ordering::Relaxed);
        Self { gauges }
    }
}

impl Drop for WaiterGuard {
    fn drop(&mut self) {
        self.gauges.waiters.fetch_sub(1, Ordering::Relaxed);
    }
}
