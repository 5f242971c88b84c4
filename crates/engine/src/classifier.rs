use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::ClassifierError;

/// The expensive labelling function the engine searches over.
///
/// Implementations must tolerate concurrent calls for different items.
/// Items with equal keys are expected to classify to equal labels; the
/// engine relies on this to share one lookup per key.
#[async_trait]
pub trait Classifier: Send + Sync + 'static {
    type Item: Clone + Send + Sync + 'static;
    type Key: Clone + Eq + Hash + Send + Sync + 'static;
    type Label: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    /// Canonical cache key for an item (its value, not its position).
    fn key(&self, item: &Self::Item) -> Self::Key;

    async fn classify(&self, item: &Self::Item) -> Result<Self::Label, ClassifierError>;
}

#[async_trait]
impl<C: Classifier> Classifier for Arc<C> {
    type Item = C::Item;
    type Key = C::Key;
    type Label = C::Label;

    fn key(&self, item: &Self::Item) -> Self::Key {
        (**self).key(item)
    }

    async fn classify(&self, item: &Self::Item) -> Result<Self::Label, ClassifierError> {
        (**self).classify(item).await
    }
}
