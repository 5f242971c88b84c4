use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;

use crate::classifier::Classifier;
use crate::context::RunGuard;
use crate::error::{ClassifierError, EngineError, Halt, SearchResult};
use crate::limits::CallLimiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Label requests served, hits and misses alike
    pub lookups: usize,
    /// Calls that actually reached the classifier
    pub classifier_calls: usize,
    /// Keys with a resolved label
    pub resolved: usize,
}

/// Memoizes classifier results by item key.
///
/// Each key owns one `OnceCell`: the first caller runs the classifier,
/// concurrent callers for the same key wait on that cell instead of issuing
/// their own request. Entries live as long as the cache.
pub struct ClassifierCache<C: Classifier> {
    classifier: C,
    entries: Mutex<HashMap<C::Key, Arc<OnceCell<C::Label>>>>,
    limiter: CallLimiter,
    lookups: AtomicUsize,
    calls: AtomicUsize,
}

impl<C: Classifier> ClassifierCache<C> {
    pub fn new(classifier: C, limiter: CallLimiter) -> Self {
        Self {
            classifier,
            entries: Mutex::new(HashMap::new()),
            limiter,
            lookups: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    pub fn limiter(&self) -> &CallLimiter {
        &self.limiter
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            lookups: self.lookups.load(Ordering::Relaxed),
            classifier_calls: self.calls.load(Ordering::Relaxed),
            resolved: self.snapshot().len(),
        }
    }

    /// Resolved (key, label) pairs; pending lookups are skipped.
    pub fn snapshot(&self) -> Vec<(C::Key, C::Label)> {
        let guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        guard
            .iter()
            .filter_map(|(key, cell)| cell.get().map(|label| (key.clone(), label.clone())))
            .collect()
    }

    /// Seed resolved labels, e.g. from a persisted cache. Keys that already
    /// have an entry are left alone. Returns how many entries were added.
    pub fn preload<T>(&self, entries: T) -> usize
    where
        T: IntoIterator<Item = (C::Key, C::Label)>,
    {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut added = 0;
        for (key, label) in entries {
            if guard.contains_key(&key) {
                continue;
            }
            guard.insert(key, Arc::new(OnceCell::new_with(Some(label))));
            added += 1;
        }
        added
    }

    /// Label for `item`, calling the classifier at most once per key.
    pub async fn lookup(&self, item: &C::Item) -> Result<C::Label, ClassifierError> {
        let guard = RunGuard::new(&CancellationToken::new());
        match self.resolve(item, &guard).await {
            Ok(label) => Ok(label),
            Err(Halt::Failed(EngineError::Classifier(err))) => Err(err),
            Err(Halt::Failed(other)) => Err(ClassifierError::Other(other.to_string())),
            Err(Halt::Cancelled) => Err(ClassifierError::Other("lookup cancelled".to_string())),
        }
    }

    pub(crate) async fn resolve(
        &self,
        item: &C::Item,
        guard: &RunGuard,
    ) -> SearchResult<C::Label> {
        if guard.is_halted() {
            return Err(Halt::Cancelled);
        }
        self.lookups.fetch_add(1, Ordering::Relaxed);

        let key = self.classifier.key(item);
        let cell = self.slot(&key);
        if let Some(label) = cell.get() {
            return Ok(label.clone());
        }

        match cell.get_or_try_init(|| self.fetch(item, guard)).await {
            Ok(label) => Ok(label.clone()),
            Err(halt) => {
                if matches!(halt, Halt::Failed(_)) {
                    self.forget_unresolved(&key, &cell);
                }
                Err(halt)
            }
        }
    }

    /// A failure halts the guard before the cell is released, so a waiter of
    /// the same run takes over initialization only to find the run stopped.
    async fn fetch(&self, item: &C::Item, guard: &RunGuard) -> SearchResult<C::Label> {
        let cancel = guard.halt();
        let _permit = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Halt::Cancelled),
            permit = self.limiter.acquire() => permit.map_err(|err| {
                Halt::Failed(EngineError::Task(format!("call limiter closed: {err}")))
            })?,
        };
        if cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        self.calls.fetch_add(1, Ordering::Relaxed);
        let label = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Halt::Cancelled),
            label = self.classifier.classify(item) => label,
        };
        label.map_err(|err| {
            guard.fail(&err);
            Halt::from(err)
        })
    }

    fn slot(&self, key: &C::Key) -> Arc<OnceCell<C::Label>> {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            guard
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new())),
        )
    }

    fn forget_unresolved(&self, key: &C::Key, cell: &Arc<OnceCell<C::Label>>) {
        let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = guard
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, cell) && !current.initialized());
        if stale {
            guard.remove(key);
        }
    }
}
