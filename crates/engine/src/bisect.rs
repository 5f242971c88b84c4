//! Recursive narrowing of a window down to its exact label changes.
//!
//! Each step evaluates one midpoint. If the midpoint matches an endpoint the
//! change lies entirely in the other half; if it matches neither, both halves
//! hold changes and are searched concurrently (the right half as a spawned
//! child task). Results come back in index order because the left half is
//! always concatenated first.
//!
//! A window whose endpoints agree is assumed empty, so an island of another
//! label that starts and ends between the same two samples is never seen.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;

use crate::classifier::Classifier;
use crate::context::{ScopedTask, SearchContext};
use crate::error::SearchResult;
use crate::types::{Boundary, Window};

pub(crate) fn search_window<C: Classifier>(
    ctx: Arc<SearchContext<C>>,
    window: Window<C::Label>,
) -> BoxFuture<'static, SearchResult<Vec<Boundary<C::Label>>>> {
    find_boundaries(
        ctx,
        window.start,
        window.end,
        window.start_label,
        window.end_label,
    )
}

pub(crate) fn find_boundaries<C: Classifier>(
    ctx: Arc<SearchContext<C>>,
    start: usize,
    end: usize,
    start_label: C::Label,
    end_label: C::Label,
) -> BoxFuture<'static, SearchResult<Vec<Boundary<C::Label>>>> {
    async move {
        if start_label == end_label || end <= start {
            return Ok(Vec::new());
        }
        if end - start == 1 {
            return Ok(vec![Boundary {
                index: end,
                label: end_label,
            }]);
        }

        let mid = start + (end - start) / 2;
        let mid_label = ctx.label_at(mid).await?;

        if mid_label == start_label {
            find_boundaries(ctx, mid, end, mid_label, end_label).await
        } else if mid_label == end_label {
            find_boundaries(ctx, start, mid, start_label, mid_label).await
        } else {
            let right = ScopedTask::spawn(find_boundaries(
                Arc::clone(&ctx),
                mid,
                end,
                mid_label.clone(),
                end_label,
            ));
            let left = find_boundaries(ctx, start, mid, start_label, mid_label);
            let right = async move {
                let found: SearchResult<Vec<Boundary<C::Label>>> = right.await?;
                found
            };
            let (mut left, right) = futures::try_join!(left, right)?;
            left.extend(right);
            Ok(left)
        }
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ClassifierCache;
    use crate::context::RunGuard;
    use crate::error::{ClassifierError, Halt};
    use crate::limits::CallLimiter;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    struct Table {
        labels: Vec<char>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for Table {
        type Item = usize;
        type Key = usize;
        type Label = char;

        fn key(&self, item: &usize) -> usize {
            *item
        }

        async fn classify(&self, item: &usize) -> Result<char, ClassifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.labels[*item])
        }
    }

    fn context(labels: &str) -> Arc<SearchContext<Table>> {
        let labels: Vec<char> = labels.chars().collect();
        let items: Arc<[usize]> = (0..labels.len()).collect();
        let cancel = CancellationToken::new();
        Arc::new(SearchContext {
            items,
            cache: Arc::new(ClassifierCache::new(
                Table {
                    labels,
                    calls: AtomicUsize::new(0),
                },
                CallLimiter::new(4),
            )),
            guard: RunGuard::new(&cancel),
            cancel,
            stride: 2,
        })
    }

    fn pairs(boundaries: Vec<Boundary<char>>) -> Vec<(usize, char)> {
        boundaries.into_iter().map(|b| (b.index, b.label)).collect()
    }

    #[tokio::test]
    async fn adjacent_indices_resolve_without_calls() {
        let ctx = context("ab");
        let found = find_boundaries(Arc::clone(&ctx), 0, 1, 'a', 'b')
            .await
            .expect("search");
        assert_eq!(pairs(found), vec![(1, 'b')]);
        assert_eq!(ctx.cache.classifier().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn agreeing_endpoints_yield_nothing() {
        let ctx = context("aaaaa");
        let found = find_boundaries(ctx, 0, 4, 'a', 'a').await.expect("search");
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn single_change_uses_logarithmic_calls() {
        let labels = format!("{}{}", "a".repeat(25), "b".repeat(7));
        let ctx = context(&labels);
        let last = 31;
        let found = find_boundaries(Arc::clone(&ctx), 0, last, 'a', 'b')
            .await
            .expect("search");
        assert_eq!(pairs(found), vec![(25, 'b')]);
        let calls = ctx.cache.classifier().calls.load(Ordering::SeqCst);
        assert!(calls <= 5, "expected at most log2(31) calls, got {calls}");
    }

    #[tokio::test]
    async fn nested_third_label_is_found_in_order() {
        let ctx = context("aaaaacbbbbb");
        let found = find_boundaries(ctx, 0, 10, 'a', 'b').await.expect("search");
        assert_eq!(pairs(found), vec![(5, 'c'), (6, 'b')]);
    }

    #[tokio::test]
    async fn several_labels_come_back_sorted() {
        let ctx = context("aabbccddeeff");
        let found = find_boundaries(ctx, 0, 11, 'a', 'f').await.expect("search");
        assert_eq!(
            pairs(found),
            vec![(2, 'b'), (4, 'c'), (6, 'd'), (8, 'e'), (10, 'f')]
        );
    }

    #[tokio::test]
    async fn cancelled_search_stops() {
        let ctx = context("aaaaaaaaab");
        ctx.cancel.cancel();
        let result = find_boundaries(Arc::clone(&ctx), 0, 9, 'a', 'b').await;
        assert!(matches!(result, Err(Halt::Cancelled)));
        assert_eq!(ctx.cache.classifier().calls.load(Ordering::SeqCst), 0);
    }
}
