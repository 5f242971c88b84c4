//! # huename engine
//!
//! Finds every index where an expensive classifier's label changes across an
//! ordered sequence, using far fewer classifier calls than there are items.
//!
//! ## Pipeline
//!
//! ```text
//! items[0..N]
//!     │
//!     ├──> Sampler: labels at 0, S, 2S, ..., N-1 (concurrent)
//!     │
//!     ├──> Windows: adjacent samples whose labels differ
//!     │      └─> Bisector per window (concurrent, recursive)
//!     │
//!     ├──> Reorder buffer: window results drained left to right
//!     │
//!     └──> Emitter: first occurrence of each label, in index order
//! ```
//!
//! Every label goes through [`ClassifierCache`], which keeps at most one
//! in-flight call per item key and bounds concurrent calls with a
//! [`CallLimiter`]. Cancellation is a `CancellationToken` checked before every
//! classifier call and every emission.
//!
//! ## Example
//!
//! ```no_run
//! use futures::StreamExt;
//! use huename_engine::{
//!     async_trait, CancellationToken, Classifier, ClassifierError, Engine, EngineConfig,
//! };
//!
//! struct Parity;
//!
//! #[async_trait]
//! impl Classifier for Parity {
//!     type Item = u32;
//!     type Key = u32;
//!     type Label = &'static str;
//!
//!     fn key(&self, item: &u32) -> u32 {
//!         *item
//!     }
//!
//!     async fn classify(&self, item: &u32) -> Result<&'static str, ClassifierError> {
//!         Ok(if *item < 100 { "low" } else { "high" })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let engine = Engine::new(Parity, EngineConfig::default())?;
//!     let items: Vec<u32> = (0..360).collect();
//!     let mut segments = engine.discover_all(items, &CancellationToken::new());
//!     while let Some(segment) = segments.next().await {
//!         let segment = segment?;
//!         println!("{} starts at {}", segment.label, segment.index);
//!     }
//!     Ok(())
//! }
//! ```

mod bisect;
mod cache;
mod classifier;
mod config;
mod context;
mod emitter;
mod error;
mod limits;
mod orchestrator;
mod sampler;
mod stream;
mod types;

pub use async_trait::async_trait;
pub use cache::{CacheStats, ClassifierCache};
pub use classifier::Classifier;
pub use config::{
    parse_bounded, EngineConfig, DEFAULT_MAX_IN_FLIGHT, DEFAULT_STRIDE, MAX_IN_FLIGHT_ENV,
    MAX_IN_FLIGHT_LIMIT, MAX_STRIDE, MIN_STRIDE, STRIDE_ENV,
};
pub use error::{ClassifierError, EngineError, Result};
pub use limits::{CallLimiter, LimiterSnapshot};
pub use orchestrator::{discover_all, Engine};
pub use sampler::sample_indices;
pub use stream::SegmentStream;
pub use types::{Boundary, RunState, SamplePoint, Segment, Window};

pub use tokio_util::sync::CancellationToken;
