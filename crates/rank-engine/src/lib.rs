//! # rank-engine
//!
//! Weighted-reputation engine for novel ratings.
//!
//! This crate provides:
//!
//! - [`ReputationEngine`] — rating and vote submission, score and trust reads
//! - [`TokioDispatcher`] — crash-isolated fire-and-forget background tasks
//! - [`RatingWeigher`], [`TrustUpdater`], [`ItemAggregator`] — derived-state components
//! - [`TrustReconciler`] — periodic recomputation of trust from history
//! - [`EngineConfig`] — tunables with defaults, builder and JSON loading
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use rank_engine::{EngineConfig, ReputationEngine, TokioDispatcher};
//! use rank_store::MemoryStore;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), rank_engine::EngineError> {
//! let dispatcher = TokioDispatcher::try_current()?;
//! let engine = ReputationEngine::new(
//!     EngineConfig::default(),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(dispatcher.clone()),
//! )?;
//!
//! let author = engine.register_user("ursula")?;
//! let novel = engine.create_item("The Dispossessed")?;
//! engine.submit_rating(author.id, novel.id, 9, Some("Ambitious".to_string()))?;
//!
//! dispatcher.wait_idle().await;
//! assert_eq!(engine.get_item_score(novel.id)?.ratings_count, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregator;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod reconcile;
pub mod trust;
pub mod weigher;

pub use aggregator::ItemAggregator;
pub use config::{
    DuplicateRatingPolicy, EngineConfig, EngineConfigBuilder, RatingsConfig, ReconciliationConfig,
};
pub use dispatch::{DispatchStats, Task, TaskSpawner, TokioDispatcher};
pub use engine::{ReputationEngine, VoteReceipt};
pub use error::{EngineError, EngineResult};
pub use reconcile::{ReconcileReport, TrustReconciler};
pub use trust::TrustUpdater;
pub use weigher::RatingWeigher;
