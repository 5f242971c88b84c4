use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::cache::ClassifierCache;
use crate::classifier::Classifier;
use crate::error::{ClassifierError, EngineError, Halt, SearchResult};

/// Everything a task in one run needs: the items, the shared cache and the
/// run's cancellation token.
pub(crate) struct SearchContext<C: Classifier> {
    pub(crate) items: Arc<[C::Item]>,
    pub(crate) cache: Arc<ClassifierCache<C>>,
    pub(crate) cancel: CancellationToken,
    pub(crate) guard: RunGuard,
    pub(crate) stride: usize,
}

impl<C: Classifier> SearchContext<C> {
    pub(crate) fn item(&self, index: usize) -> SearchResult<&C::Item> {
        self.items.get(index).ok_or_else(|| {
            Halt::Failed(EngineError::Task(format!(
                "index {index} out of range for {} items",
                self.items.len()
            )))
        })
    }

    /// Suspension point: every label the search needs goes through here.
    pub(crate) async fn label_at(&self, index: usize) -> SearchResult<C::Label> {
        let item = self.item(index)?;
        self.cache.resolve(item, &self.guard).await
    }
}

/// Stop signal shared by the tasks of one run.
///
/// Fires when the run is cancelled or when any classifier call fails. The
/// first failure is stored before the signal fires, so the driver can still
/// report it when a sibling task unwinds first.
pub(crate) struct RunGuard {
    halt: CancellationToken,
    failure: Mutex<Option<ClassifierError>>,
}

impl RunGuard {
    pub(crate) fn new(cancel: &CancellationToken) -> Self {
        Self {
            halt: cancel.child_token(),
            failure: Mutex::new(None),
        }
    }

    pub(crate) fn halt(&self) -> &CancellationToken {
        &self.halt
    }

    pub(crate) fn is_halted(&self) -> bool {
        self.halt.is_cancelled()
    }

    pub(crate) fn fail(&self, err: &ClassifierError) {
        {
            let mut slot = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.is_none() {
                *slot = Some(err.clone());
            }
        }
        self.halt.cancel();
    }

    pub(crate) fn take_failure(&self) -> Option<ClassifierError> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// A spawned child task that is aborted when its handle is dropped, so a
/// failing or cancelled parent never leaves orphans behind.
pub(crate) struct ScopedTask<T> {
    handle: JoinHandle<T>,
}

impl<T: Send + 'static> ScopedTask<T> {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl<T> Future for ScopedTask<T> {
    type Output = Result<T, JoinError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx)
    }
}

impl<T> Drop for ScopedTask<T> {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
