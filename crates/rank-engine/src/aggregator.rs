//! Item score aggregation.

use std::sync::Arc;

use rank_core::{BayesianPrior, ItemId, ItemScore, ScoreAggregate};
use rank_store::RecordStore;
use tracing::info;

use crate::error::EngineResult;

/// Re-derives an item's Bayesian score from all of its ratings.
///
/// Each run is a full re-scan, so concurrent or repeated runs for the same
/// item converge on the same stored value.
#[derive(Clone)]
pub struct ItemAggregator {
    store: Arc<dyn RecordStore>,
    prior: BayesianPrior,
}

impl std::fmt::Debug for ItemAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemAggregator")
            .field("prior", &self.prior)
            .finish_non_exhaustive()
    }
}

impl ItemAggregator {
    /// Create an aggregator over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, prior: BayesianPrior) -> Self {
        Self { store, prior }
    }

    /// Recompute and persist the score of `item_id`.
    pub fn recompute(&self, item_id: ItemId) -> EngineResult<ItemScore> {
        let ratings = self.store.ratings_for_item(item_id)?;
        let aggregate = ScoreAggregate::from_ratings(&ratings);
        let score = ItemScore::compute(&self.prior, &aggregate);
        self.store.update_item_score(item_id, score)?;

        info!(
            item_id = %item_id,
            ratings = score.ratings_count,
            total_weight = aggregate.total_weight,
            weighted_avg = aggregate.weighted_average(),
            weighted_score = score.weighted_score,
            "Item score recomputed"
        );
        Ok(score)
    }
}
