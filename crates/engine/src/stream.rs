use futures::stream::{FusedStream, Stream};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::types::{RunState, Segment};

pub(crate) type Driver = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Shared, monotonic view of a run's lifecycle. Terminal states stick.
#[derive(Clone)]
pub(crate) struct RunStateCell {
    tx: Arc<watch::Sender<RunState>>,
}

impl RunStateCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::Idle);
        Self { tx: Arc::new(tx) }
    }

    pub(crate) fn advance(&self, next: RunState) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_terminal() || *current == next {
                return false;
            }
            *current = next;
            true
        })
    }

    pub(crate) fn current(&self) -> RunState {
        *self.tx.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }
}

/// Lazy, one-shot stream of segments in strictly increasing index order.
///
/// Nothing runs until the first poll, which spawns the run onto the current
/// tokio runtime. The stream ends with `None` when the run completes or is
/// cancelled, and with a single `Err` when a classifier call fails.
/// Dropping the stream cancels the run and aborts all of its tasks.
pub struct SegmentStream<I, L> {
    driver: Option<Driver>,
    running: Option<JoinHandle<()>>,
    rx: mpsc::Receiver<Result<Segment<I, L>, EngineError>>,
    cancel: CancellationToken,
    state: RunStateCell,
    finished: bool,
}

// Nothing inside is structurally pinned.
impl<I, L> Unpin for SegmentStream<I, L> {}

impl<I, L> SegmentStream<I, L> {
    pub(crate) fn new(
        driver: Driver,
        rx: mpsc::Receiver<Result<Segment<I, L>, EngineError>>,
        cancel: CancellationToken,
        state: RunStateCell,
    ) -> Self {
        Self {
            driver: Some(driver),
            running: None,
            rx,
            cancel,
            state,
            finished: false,
        }
    }

    pub fn state(&self) -> RunState {
        self.state.current()
    }

    /// Receiver that observes every state transition of this run.
    pub fn watch_state(&self) -> watch::Receiver<RunState> {
        self.state.subscribe()
    }

    /// Token scoped to this run; cancelling it stops only this run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn finish_cancelled(&mut self) {
        self.finished = true;
        self.cancel.cancel();
        self.state.advance(RunState::Cancelled);
        if let Some(handle) = self.running.take() {
            handle.abort();
        }
    }
}

impl<I, L> Stream for SegmentStream<I, L> {
    type Item = Result<Segment<I, L>, EngineError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }
        if let Some(driver) = this.driver.take() {
            this.running = Some(tokio::spawn(driver));
        }
        if this.cancel.is_cancelled() {
            this.finish_cancelled();
            return Poll::Ready(None);
        }

        match this.rx.poll_recv(cx) {
            Poll::Ready(Some(Ok(segment))) => {
                if this.cancel.is_cancelled() {
                    this.finish_cancelled();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Ok(segment)))
            }
            Poll::Ready(Some(Err(err))) => {
                this.finished = true;
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finished = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<I, L> FusedStream for SegmentStream<I, L> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<I, L> Drop for SegmentStream<I, L> {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.running.take() {
            handle.abort();
        }
        self.state.advance(RunState::Cancelled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_is_sticky() {
        let state = RunStateCell::new();
        assert_eq!(state.current(), RunState::Idle);
        assert!(state.advance(RunState::Sampling));
        assert!(state.advance(RunState::Done));
        assert!(!state.advance(RunState::Cancelled));
        assert!(!state.advance(RunState::Draining));
        assert_eq!(state.current(), RunState::Done);
    }

    #[test]
    fn repeated_state_is_not_a_transition() {
        let state = RunStateCell::new();
        assert!(state.advance(RunState::Sampling));
        assert!(!state.advance(RunState::Sampling));
    }
}
