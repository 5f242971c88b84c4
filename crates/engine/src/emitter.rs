use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Halt, SearchResult};
use crate::types::Segment;

pub(crate) type SegmentSender<I, L> = mpsc::Sender<Result<Segment<I, L>, EngineError>>;

/// Holds window results that finished early until every window to their
/// left has been drained.
#[derive(Debug)]
pub(crate) struct WindowReorder<T> {
    next: usize,
    total: usize,
    parked: BTreeMap<usize, T>,
}

impl<T> WindowReorder<T> {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            next: 0,
            total,
            parked: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, position: usize, value: T) {
        if position >= self.next {
            self.parked.insert(position, value);
        }
    }

    /// Values that are now contiguous with everything already drained.
    pub(crate) fn drain_ready(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while let Some(value) = self.parked.remove(&self.next) {
            ready.push(value);
            self.next += 1;
        }
        ready
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.next >= self.total
    }
}

/// Sends segments downstream in the order offered, once per label.
pub(crate) struct OrderedEmitter<I, L> {
    tx: SegmentSender<I, L>,
    cancel: CancellationToken,
    emitted: HashSet<L>,
    dropped: usize,
}

impl<I, L> OrderedEmitter<I, L>
where
    L: Clone + Eq + Hash + std::fmt::Debug,
{
    pub(crate) fn new(tx: SegmentSender<I, L>, cancel: CancellationToken) -> Self {
        Self {
            tx,
            cancel,
            emitted: HashSet::new(),
            dropped: 0,
        }
    }

    /// Emit unless the label was already emitted this run. Returns whether
    /// the segment went out.
    pub(crate) async fn offer(&mut self, index: usize, label: L, item: I) -> SearchResult<bool> {
        if self.emitted.contains(&label) {
            log::trace!("dropping repeat of {label:?} at index {index}");
            self.dropped += 1;
            return Ok(false);
        }
        if self.cancel.is_cancelled() {
            return Err(Halt::Cancelled);
        }

        self.emitted.insert(label.clone());
        let segment = Segment { index, label, item };
        // A closed receiver means the consumer walked away.
        self.tx
            .send(Ok(segment))
            .await
            .map_err(|_| Halt::Cancelled)?;
        Ok(true)
    }

    pub(crate) fn emitted(&self) -> usize {
        self.emitted.len()
    }

    pub(crate) fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reorder_releases_in_position_order() {
        let mut reorder = WindowReorder::new(4);
        reorder.insert(2, "c");
        assert!(reorder.drain_ready().is_empty());
        reorder.insert(0, "a");
        assert_eq!(reorder.drain_ready(), vec!["a"]);
        reorder.insert(3, "d");
        reorder.insert(1, "b");
        assert_eq!(reorder.drain_ready(), vec!["b", "c", "d"]);
        assert!(reorder.is_complete());
    }

    #[test]
    fn reorder_with_no_windows_is_complete() {
        let reorder: WindowReorder<()> = WindowReorder::new(0);
        assert!(reorder.is_complete());
    }

    #[tokio::test]
    async fn repeated_labels_are_dropped() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut emitter = OrderedEmitter::new(tx, CancellationToken::new());

        assert!(emitter.offer(0, "A", 'x').await.expect("offer"));
        assert!(emitter.offer(2, "B", 'y').await.expect("offer"));
        assert!(!emitter.offer(4, "A", 'z').await.expect("offer"));
        assert_eq!(emitter.emitted(), 2);
        assert_eq!(emitter.dropped(), 1);
        drop(emitter);

        let mut seen = Vec::new();
        while let Some(segment) = rx.recv().await {
            let segment = segment.expect("segment");
            seen.push((segment.index, segment.label));
        }
        assert_eq!(seen, vec![(0, "A"), (2, "B")]);
    }

    #[tokio::test]
    async fn nothing_is_sent_after_cancellation() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let mut emitter = OrderedEmitter::new(tx, cancel.clone());

        cancel.cancel();
        let result = emitter.offer(0, "A", ()).await;
        assert!(matches!(result, Err(Halt::Cancelled)));
        drop(emitter);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn closed_receiver_counts_as_cancellation() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut emitter = OrderedEmitter::new(tx, CancellationToken::new());
        let result = emitter.offer(0, "A", ()).await;
        assert!(matches!(result, Err(Halt::Cancelled)));
    }
}
