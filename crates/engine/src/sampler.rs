use std::sync::Arc;
use tokio::task::JoinSet;

use crate::classifier::Classifier;
use crate::context::SearchContext;
use crate::error::{Halt, SearchResult};
use crate::types::SamplePoint;

/// Coarse grid `{0, stride, 2*stride, ...}` plus the final index.
pub fn sample_indices(len: usize, stride: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let last = len - 1;
    let mut indices: Vec<usize> = (0..len).step_by(stride.max(1)).collect();
    if indices.last() != Some(&last) {
        indices.push(last);
    }
    indices
}

/// Resolve every grid label concurrently, one task per sample.
pub(crate) async fn sample<C: Classifier>(
    ctx: &Arc<SearchContext<C>>,
) -> SearchResult<Vec<SamplePoint<C::Label>>> {
    let indices = sample_indices(ctx.items.len(), ctx.stride);
    log::debug!(
        "sampling {} of {} items (stride {})",
        indices.len(),
        ctx.items.len(),
        ctx.stride
    );

    let mut tasks = JoinSet::new();
    for (slot, index) in indices.iter().copied().enumerate() {
        let ctx = Arc::clone(ctx);
        tasks.spawn(async move { ctx.label_at(index).await.map(|label| (slot, label)) });
    }

    let mut labels: Vec<Option<C::Label>> = indices.iter().map(|_| None).collect();
    loop {
        let joined = tokio::select! {
            biased;
            () = ctx.guard.halt().cancelled() => return Err(Halt::Cancelled),
            joined = tasks.join_next() => joined,
        };
        let Some(joined) = joined else {
            break;
        };
        let (slot, label) = joined??;
        labels[slot] = Some(label);
    }

    indices
        .into_iter()
        .zip(labels)
        .map(|(index, label)| match label {
            Some(label) => Ok(SamplePoint { index, label }),
            None => Err(Halt::Cancelled),
        })
        .collect()
}
