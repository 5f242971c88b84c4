use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::bisect;
use crate::cache::ClassifierCache;
use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::context::{RunGuard, SearchContext};
use crate::emitter::{OrderedEmitter, SegmentSender, WindowReorder};
use crate::error::{EngineError, Halt, Result, SearchResult};
use crate::limits::CallLimiter;
use crate::sampler;
use crate::stream::{RunStateCell, SegmentStream};
use crate::types::{RunState, Window};

/// How many finished segments may wait for the consumer before the run
/// pauses on emission.
const SEGMENT_BUFFER: usize = 16;

/// Boundary discovery over one classifier.
///
/// The classifier cache lives as long as the engine, so repeated runs over
/// overlapping items reuse earlier labels.
pub struct Engine<C: Classifier> {
    cache: Arc<ClassifierCache<C>>,
    config: EngineConfig,
}

impl<C: Classifier> Engine<C> {
    pub fn new(classifier: C, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(classifier, config))
    }

    pub fn with_defaults(classifier: C) -> Self {
        Self::build(classifier, EngineConfig::default())
    }

    fn build(classifier: C, config: EngineConfig) -> Self {
        let limiter = CallLimiter::new(config.max_in_flight);
        Self {
            cache: Arc::new(ClassifierCache::new(classifier, limiter)),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<ClassifierCache<C>> {
        &self.cache
    }

    /// Discover every label change across `items`.
    ///
    /// The run gets a child of `cancel`: cancelling `cancel` stops it, and
    /// dropping the returned stream stops it without touching `cancel`.
    pub fn discover_all<T>(
        &self,
        items: T,
        cancel: &CancellationToken,
    ) -> SegmentStream<C::Item, C::Label>
    where
        T: Into<Arc<[C::Item]>>,
    {
        let run_cancel = cancel.child_token();
        let ctx = Arc::new(SearchContext {
            items: items.into(),
            cache: Arc::clone(&self.cache),
            guard: RunGuard::new(&run_cancel),
            cancel: run_cancel.clone(),
            stride: self.config.stride,
        });
        let (tx, rx) = mpsc::channel(SEGMENT_BUFFER);
        let state = RunStateCell::new();
        let driver = Box::pin(drive(ctx, tx, state.clone()));
        SegmentStream::new(driver, rx, run_cancel, state)
    }
}

/// One-off run with the default configuration.
pub fn discover_all<C, T>(
    items: T,
    classifier: C,
    cancel: &CancellationToken,
) -> SegmentStream<C::Item, C::Label>
where
    C: Classifier,
    T: Into<Arc<[C::Item]>>,
{
    Engine::with_defaults(classifier).discover_all(items, cancel)
}

async fn drive<C: Classifier>(
    ctx: Arc<SearchContext<C>>,
    tx: SegmentSender<C::Item, C::Label>,
    state: RunStateCell,
) {
    let calls_before = ctx.cache.stats().classifier_calls;
    let outcome = match run(&ctx, &tx, &state).await {
        // A sibling of the failing task may unwind first.
        Err(Halt::Cancelled) if !ctx.cancel.is_cancelled() => match ctx.guard.take_failure() {
            Some(err) => Err(Halt::from(err)),
            None => Err(Halt::Cancelled),
        },
        outcome => outcome,
    };
    let calls = ctx
        .cache
        .stats()
        .classifier_calls
        .saturating_sub(calls_before);

    match outcome {
        Ok(emitted) => {
            state.advance(RunState::Done);
            log::info!(
                "discovered {emitted} segments across {} items with {calls} classifier calls",
                ctx.items.len()
            );
        }
        Err(Halt::Cancelled) => {
            state.advance(RunState::Cancelled);
            log::debug!("run cancelled after {calls} classifier calls");
        }
        Err(Halt::Failed(_)) if ctx.cancel.is_cancelled() => {
            state.advance(RunState::Cancelled);
        }
        Err(Halt::Failed(err)) => {
            log::debug!("run failed after {calls} classifier calls: {err}");
            state.advance(RunState::Failed);
            let _ = tx.send(Err(err)).await;
        }
    }
}

async fn run<C: Classifier>(
    ctx: &Arc<SearchContext<C>>,
    tx: &SegmentSender<C::Item, C::Label>,
    state: &RunStateCell,
) -> SearchResult<usize> {
    if ctx.items.is_empty() {
        return Ok(0);
    }
    if ctx.cancel.is_cancelled() {
        return Err(Halt::Cancelled);
    }

    state.advance(RunState::Sampling);
    let samples = sampler::sample(ctx).await?;
    let Some(first) = samples.first() else {
        return Ok(0);
    };

    let windows: Vec<Window<C::Label>> = samples
        .windows(2)
        .map(|pair| Window::between(&pair[0], &pair[1]))
        .filter(|window| window.needs_search())
        .collect();
    log::debug!(
        "{} of {} windows straddle a label change",
        windows.len(),
        samples.len().saturating_sub(1)
    );

    state.advance(RunState::Bisecting);
    let mut searches = JoinSet::new();
    for (position, window) in windows.into_iter().enumerate() {
        let ctx = Arc::clone(ctx);
        searches.spawn(async move {
            bisect::search_window(ctx, window)
                .await
                .map(|found| (position, found))
        });
    }
    // Draining starts with the first finished window.
    let mut reorder = WindowReorder::new(searches.len());
    if reorder.is_complete() {
        state.advance(RunState::Draining);
    }

    let mut emitter = OrderedEmitter::new(tx.clone(), ctx.cancel.clone());
    let first_item = ctx.item(first.index)?.clone();
    emitter
        .offer(first.index, first.label.clone(), first_item)
        .await?;

    while !reorder.is_complete() {
        let joined = tokio::select! {
            biased;
            () = ctx.guard.halt().cancelled() => return Err(Halt::Cancelled),
            joined = searches.join_next() => joined,
        };
        let Some(joined) = joined else {
            return Err(Halt::Failed(EngineError::Task(
                "window search ended without a result".to_string(),
            )));
        };
        let (position, found) = joined??;
        reorder.insert(position, found);
        state.advance(RunState::Draining);

        for boundaries in reorder.drain_ready() {
            for boundary in boundaries {
                let item = ctx.item(boundary.index)?.clone();
                emitter.offer(boundary.index, boundary.label, item).await?;
            }
        }
    }

    if emitter.dropped() > 0 {
        log::debug!("suppressed {} repeated labels", emitter.dropped());
    }
    Ok(emitter.emitted())
}
