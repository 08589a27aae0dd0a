//! Test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rank_core::QualityScorer;
use rank_engine::{EngineConfig, ReputationEngine, TokioDispatcher};
use rank_store::{MemoryStore, RecordStore};

/// Absolute tolerance for floating point comparisons.
pub const EPS: f64 = 1e-9;

/// Engine wired to a dispatcher on the current runtime.
pub struct Harness {
    pub engine: ReputationEngine,
    pub dispatcher: TokioDispatcher,
}

impl Harness {
    /// Default configuration over a fresh in-memory store.
    pub fn new() -> Self {
        Self::over(Arc::new(MemoryStore::new()), EngineConfig::default(), None)
    }

    /// Custom configuration over a fresh in-memory store.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::over(Arc::new(MemoryStore::new()), config, None)
    }

    /// Any store, configuration and optional quality scorer.
    pub fn over(
        store: Arc<dyn RecordStore>,
        config: EngineConfig,
        quality: Option<Arc<dyn QualityScorer>>,
    ) -> Self {
        let dispatcher = TokioDispatcher::try_current().expect("tokio runtime");
        let spawner = Arc::new(dispatcher.clone());
        let engine = match quality {
            Some(quality) => ReputationEngine::with_quality_scorer(config, store, spawner, quality),
            None => ReputationEngine::new(config, store, spawner),
        }
        .expect("engine");
        Self { engine, dispatcher }
    }

    /// Wait for background recomputation to finish.
    pub async fn settle(&self) {
        self.dispatcher.wait_idle().await;
    }
}

/// Install a test subscriber once so `RUST_LOG` works under `cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Assert two floats agree within [`EPS`].
#[track_caller]
pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPS,
        "expected {expected}, got {actual}"
    );
}
