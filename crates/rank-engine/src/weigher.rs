//! Persists rating weights.

use std::sync::Arc;

use rank_core::{RatingId, TrustScore, WeightCalculator};
use rank_store::RecordStore;
use tracing::{debug, warn};

use crate::error::EngineResult;

/// Recomputes and stores the weight of a rating.
#[derive(Clone)]
pub struct RatingWeigher {
    store: Arc<dyn RecordStore>,
    calculator: WeightCalculator,
}

impl std::fmt::Debug for RatingWeigher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RatingWeigher")
            .field("calculator", &self.calculator)
            .finish_non_exhaustive()
    }
}

impl RatingWeigher {
    /// Create a weigher over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, calculator: WeightCalculator) -> Self {
        Self { store, calculator }
    }

    /// The weight formula in use.
    #[must_use]
    pub const fn calculator(&self) -> &WeightCalculator {
        &self.calculator
    }

    /// Re-read the rating and its author's live trust, then store the new
    /// weight and trust snapshot. Returns the weight.
    ///
    /// An unreadable author degrades to neutral trust rather than failing.
    pub fn recompute(&self, rating_id: RatingId) -> EngineResult<f64> {
        let rating = self.store.get_rating(rating_id)?;

        let trust = match self.store.get_user(rating.author_id) {
            Ok(author) => author.trust,
            Err(err) => {
                warn!(
                    rating_id = %rating_id,
                    author_id = %rating.author_id,
                    error = %err,
                    "Author trust unavailable, weighing with neutral trust"
                );
                TrustScore::NEUTRAL
            }
        };

        let factors = self.calculator.factors(&rating, trust);
        let weight = self.calculator.weight(&rating, trust);
        self.store
            .update_rating_weight(rating_id, weight, trust.value())?;

        debug!(
            rating_id = %rating_id,
            action = factors.action,
            quality = factors.quality,
            trust = factors.trust,
            community = factors.community,
            weight,
            "Rating weighed"
        );
        Ok(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rank_core::{Item, Rating, ScoreRange, User, VoteCounters};
    use rank_store::{with_transaction, FaultKind, FaultyStore, MemoryStore};

    fn setup(store: &dyn RecordStore, comment: Option<&str>, trust: f64) -> Rating {
        let bounds = rank_core::TrustBounds::default();
        let user = User::new("reader", bounds.clamp(trust));
        let item = Item::new("Hyperion");
        let score = ScoreRange::default().check(7).expect("score");
        let rating = Rating::new(item.id, user.id, score, comment.map(str::to_string), user.trust);
        store.insert_user(user).expect("user");
        store.insert_item(item).expect("item");
        store.insert_rating(rating.clone()).expect("rating");
        rating
    }

    #[test]
    fn test_recompute_stores_weight_and_snapshot() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let rating = setup(store.as_ref(), Some("loved it"), 1.2);
        let weigher = RatingWeigher::new(Arc::clone(&store), WeightCalculator::default());

        let weight = weigher.recompute(rating.id).expect("recompute");
        assert!((weight - 1.2).abs() < 1e-12);

        let stored = store.get_rating(rating.id).expect("get");
        assert_eq!(stored.weight, weight);
        assert_eq!(stored.author_trust, 1.2);
    }

    #[test]
    fn test_recompute_reflects_votes() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let rating = setup(store.as_ref(), None, 1.0);
        with_transaction(store.as_ref(), |tx| {
            tx.set_vote_counters(rating.id, VoteCounters::new(9, 0))
        })
        .expect("counters");

        let weigher = RatingWeigher::new(Arc::clone(&store), WeightCalculator::default());
        let weight = weigher.recompute(rating.id).expect("recompute");
        assert!((weight - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_unreadable_author_degrades_to_neutral() {
        let faulty = Arc::new(FaultyStore::new(MemoryStore::new()));
        let rating = setup(faulty.as_ref(), Some("fine"), 1.4);
        faulty.fail(FaultKind::UserReads);

        let store: Arc<dyn RecordStore> = faulty.clone();
        let weigher = RatingWeigher::new(store, WeightCalculator::default());
        let weight = weigher.recompute(rating.id).expect("recompute");
        assert!((weight - 1.0).abs() < 1e-12);
        assert_eq!(faulty.inner().get_rating(rating.id).expect("get").author_trust, 1.0);
    }

    #[test]
    fn test_missing_rating_is_not_found() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let weigher = RatingWeigher::new(store, WeightCalculator::default());
        let err = weigher.recompute(RatingId::new()).unwrap_err();
        assert!(matches!(err, crate::EngineError::NotFound { kind: "rating", .. }));
    }
}
