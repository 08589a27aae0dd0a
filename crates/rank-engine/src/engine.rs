//! The reputation engine facade.
//!
//! Request-path operations perform only the primary write and return. The
//! derived updates then run as background tasks through the configured
//! [`TaskSpawner`]:
//!
//! - rating created: weigh rating, reward author, aggregate item;
//! - vote applied: re-weigh rating, update author and voter trust, aggregate item.
//!
//! A failed step ends its pipeline. The primary write is never rolled back.

use std::sync::Arc;

use rank_core::{
    Item, ItemId, ItemScore, QualityScorer, Rating, RatingId, User, UserId, Vote, VoteCounters,
    VoteDirection, VoteState, VoteTransition, WeightCalculator,
};
use rank_store::{with_transaction, RecordStore, StoreError};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::aggregator::ItemAggregator;
use crate::config::{DuplicateRatingPolicy, EngineConfig};
use crate::dispatch::TaskSpawner;
use crate::error::{EngineError, EngineResult};
use crate::reconcile::TrustReconciler;
use crate::trust::TrustUpdater;
use crate::weigher::RatingWeigher;

/// Result of a vote submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VoteReceipt {
    /// Rating voted on.
    pub rating_id: RatingId,
    /// Voter's state after the action.
    pub state: VoteState,
    /// Transition taken.
    pub transition: VoteTransition,
    /// Rating counters after the action.
    pub counters: VoteCounters,
    /// Change in net approval.
    pub net_delta: i32,
}

/// The derived-state components shared by every background task.
#[derive(Debug, Clone)]
struct Pipelines {
    weigher: RatingWeigher,
    trust: TrustUpdater,
    aggregator: ItemAggregator,
}

impl Pipelines {
    fn rating_created(&self, rating_id: RatingId, author: UserId, item: ItemId) -> EngineResult<()> {
        let weight = self.weigher.recompute(rating_id)?;
        self.trust.on_rating_created(author, weight)?;
        self.aggregator.recompute(item)?;
        Ok(())
    }

    fn vote_applied(
        &self,
        rating_id: RatingId,
        voter: UserId,
        author: UserId,
        item: ItemId,
        net_delta: i32,
    ) -> EngineResult<()> {
        self.weigher.recompute(rating_id)?;
        self.trust.on_vote(voter, author, net_delta)?;
        self.aggregator.recompute(item)?;
        Ok(())
    }
}

/// Weighted-reputation engine over a record store.
#[derive(Clone)]
pub struct ReputationEngine {
    config: EngineConfig,
    store: Arc<dyn RecordStore>,
    spawner: Arc<dyn TaskSpawner>,
    pipelines: Pipelines,
}

impl std::fmt::Debug for ReputationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReputationEngine {
    /// Create an engine with the neutral quality scorer.
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn RecordStore>,
        spawner: Arc<dyn TaskSpawner>,
    ) -> EngineResult<Self> {
        let calculator = WeightCalculator::new(config.weight);
        Self::with_calculator(config, store, spawner, calculator)
    }

    /// Create an engine with a custom quality scorer.
    pub fn with_quality_scorer(
        config: EngineConfig,
        store: Arc<dyn RecordStore>,
        spawner: Arc<dyn TaskSpawner>,
        quality: Arc<dyn QualityScorer>,
    ) -> EngineResult<Self> {
        let calculator = WeightCalculator::with_quality(config.weight, quality);
        Self::with_calculator(config, store, spawner, calculator)
    }

    fn with_calculator(
        config: EngineConfig,
        store: Arc<dyn RecordStore>,
        spawner: Arc<dyn TaskSpawner>,
        calculator: WeightCalculator,
    ) -> EngineResult<Self> {
        config.validate()?;
        let pipelines = Pipelines {
            weigher: RatingWeigher::new(Arc::clone(&store), calculator),
            trust: TrustUpdater::new(Arc::clone(&store), config.trust),
            aggregator: ItemAggregator::new(Arc::clone(&store), config.scoring),
        };
        Ok(Self {
            config,
            store,
            spawner,
            pipelines,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a user with the initial trust score.
    pub fn register_user(&self, username: &str) -> EngineResult<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::Validation("username must not be empty".to_string()));
        }
        let user = User::new(username, self.config.trust.bounds.initial_score());
        self.store.insert_user(user.clone())?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Create an item with an empty aggregate.
    pub fn create_item(&self, title: &str) -> EngineResult<Item> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::Validation("title must not be empty".to_string()));
        }
        let item = Item::new(title);
        self.store.insert_item(item.clone())?;
        info!(item_id = %item.id, title = %item.title, "Item created");
        Ok(item)
    }

    /// Persist a rating and schedule its derived updates.
    ///
    /// The returned rating carries weight 0.0; its weight, the author's trust
    /// and the item score are updated in the background.
    pub fn submit_rating(
        &self,
        author_id: UserId,
        item_id: ItemId,
        score: i64,
        comment: Option<String>,
    ) -> EngineResult<Rating> {
        let score = self.config.ratings.score_range().check(score)?;
        self.store.get_item(item_id)?;
        let author = self.store.get_user(author_id)?;

        if self.config.ratings.duplicate_policy == DuplicateRatingPolicy::Reject
            && self
                .store
                .ratings_by_author(author_id)?
                .iter()
                .any(|r| r.item_id == item_id)
        {
            return Err(EngineError::Conflict(format!(
                "user {author_id} already rated item {item_id}"
            )));
        }

        let rating = Rating::new(item_id, author_id, score, comment, author.trust);
        self.store.insert_rating(rating.clone())?;
        debug!(
            rating_id = %rating.id,
            item_id = %item_id,
            author_id = %author_id,
            score = score.value(),
            has_comment = rating.has_comment(),
            "Rating stored"
        );

        let pipelines = self.pipelines.clone();
        let rating_id = rating.id;
        self.spawner.spawn(
            "rating_created",
            Box::pin(async move { pipelines.rating_created(rating_id, author_id, item_id) }),
        );
        Ok(rating)
    }

    /// Apply a vote action and schedule its derived updates.
    ///
    /// `direction` must be `1` or `-1`. Voting the current direction again
    /// cancels the vote; voting the opposite direction flips it.
    pub fn submit_vote(
        &self,
        voter_id: UserId,
        rating_id: RatingId,
        direction: i8,
    ) -> EngineResult<VoteReceipt> {
        let action = VoteDirection::try_from(direction)?;
        self.store.get_user(voter_id)?;

        let (outcome, counters, author, item) = with_transaction(self.store.as_ref(), |tx| {
            let rating = tx.rating(rating_id)?;
            let current = tx.vote(voter_id, rating_id)?.map(|v| v.direction);
            let outcome = VoteState::from(current).resolve(action);
            let counters = rating
                .counters
                .apply(&outcome)
                .map_err(|e| StoreError::Conflict(format!("rating {rating_id}: {e}")))?;

            match outcome.next.direction() {
                Some(direction) => tx.put_vote(Vote::new(voter_id, rating_id, direction))?,
                None => tx.delete_vote(voter_id, rating_id)?,
            }
            tx.set_vote_counters(rating_id, counters)?;
            Ok((outcome, counters, rating.author_id, rating.item_id))
        })?;

        debug!(
            rating_id = %rating_id,
            voter_id = %voter_id,
            transition = ?outcome.transition,
            upvotes = counters.upvotes,
            downvotes = counters.downvotes,
            net_delta = outcome.net_delta,
            "Vote applied"
        );

        let pipelines = self.pipelines.clone();
        let net_delta = outcome.net_delta;
        self.spawner.spawn(
            "vote_applied",
            Box::pin(async move {
                pipelines.vote_applied(rating_id, voter_id, author, item, net_delta)
            }),
        );

        Ok(VoteReceipt {
            rating_id,
            state: outcome.next,
            transition: outcome.transition,
            counters,
            net_delta,
        })
    }

    /// Stored score of an item. May lag very recent events.
    pub fn get_item_score(&self, item_id: ItemId) -> EngineResult<ItemScore> {
        Ok(self.store.get_item(item_id)?.score())
    }

    /// Stored trust of a user.
    pub fn get_user_trust_score(&self, user_id: UserId) -> EngineResult<f64> {
        Ok(self.pipelines.trust.trust_of(user_id)?.value())
    }

    /// A rating as currently stored.
    pub fn get_rating(&self, rating_id: RatingId) -> EngineResult<Rating> {
        Ok(self.store.get_rating(rating_id)?)
    }

    /// Items by descending score, ties broken by rating count.
    pub fn list_ranked_items(&self, limit: usize) -> EngineResult<Vec<Item>> {
        let mut items = self.store.list_items()?;
        items.sort_by(|a, b| {
            b.weighted_score
                .total_cmp(&a.weighted_score)
                .then_with(|| b.ratings_count.cmp(&a.ratings_count))
                .then_with(|| a.title.cmp(&b.title))
        });
        items.truncate(limit);
        Ok(items)
    }

    /// Run the aggregator for an item synchronously.
    pub fn recompute_item(&self, item_id: ItemId) -> EngineResult<ItemScore> {
        self.pipelines.aggregator.recompute(item_id)
    }

    /// A reconciler sharing this engine's store and trust model.
    #[must_use]
    pub fn reconciler(&self) -> TrustReconciler {
        TrustReconciler::new(Arc::clone(&self.store), self.config.trust)
    }

    /// Start the periodic reconciler on the current runtime if enabled.
    #[must_use]
    pub fn start_reconciler(&self, cancel: CancellationToken) -> Option<JoinHandle<u64>> {
        let settings = self.config.reconciliation;
        if !settings.enabled {
            return None;
        }
        let reconciler = self.reconciler();
        info!(interval_secs = settings.interval_secs, "Starting trust reconciler");
        Some(tokio::spawn(async move {
            reconciler.run_periodic(settings.interval(), cancel).await
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::TokioDispatcher;
    use rank_store::{FaultKind, FaultyStore, MemoryStore};
    use test_case::test_case;

    const EPS: f64 = 1e-9;

    struct Harness {
        engine: ReputationEngine,
        dispatcher: TokioDispatcher,
    }

    fn harness_with(config: EngineConfig, store: Arc<dyn RecordStore>) -> Harness {
        let dispatcher = TokioDispatcher::try_current().expect("runtime");
        let engine = ReputationEngine::new(config, store, Arc::new(dispatcher.clone()))
            .expect("engine");
        Harness { engine, dispatcher }
    }

    fn harness() -> Harness {
        harness_with(EngineConfig::default(), Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_rating_pipeline_updates_weight_trust_and_score() {
        let h = harness();
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("The Left Hand of Darkness").expect("item");

        let rating = h
            .engine
            .submit_rating(author.id, item.id, 10, Some("a classic".into()))
            .expect("rate");
        assert_eq!(rating.weight, 0.0);
        assert_eq!(rating.author_trust, 1.0);

        h.dispatcher.wait_idle().await;

        let stored = h.engine.get_rating(rating.id).expect("rating");
        assert!((stored.weight - 1.0).abs() < EPS);
        let trust = h.engine.get_user_trust_score(author.id).expect("trust");
        assert!((trust - 1.1).abs() < EPS);
        let score = h.engine.get_item_score(item.id).expect("score");
        assert_eq!(score.ratings_count, 1);
        // (1/6) * 10 + (5/6) * 6
        assert!((score.weighted_score - 20.0 / 3.0).abs() < 1e-9);
    }

    #[test_case(0 ; "below range")]
    #[test_case(11 ; "above range")]
    #[tokio::test]
    async fn test_out_of_range_score_rejected(score: i64) {
        let h = harness();
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("Kindred").expect("item");
        let err = h.engine.submit_rating(author.id, item.id, score, None).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(h.dispatcher.stats().spawned, 0);
    }

    #[tokio::test]
    async fn test_rating_unknown_item_or_author() {
        let h = harness();
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("Ubik").expect("item");

        let err = h.engine.submit_rating(author.id, ItemId::new(), 5, None).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "item", .. }));
        let err = h.engine.submit_rating(UserId::new(), item.id, 5, None).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "user", .. }));
    }

    #[tokio::test]
    async fn test_duplicate_policy() {
        let h = harness();
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("Ubik").expect("item");
        h.engine.submit_rating(author.id, item.id, 5, None).expect("first");
        h.engine.submit_rating(author.id, item.id, 6, None).expect("allowed by default");

        let config = EngineConfig::builder()
            .duplicate_policy(DuplicateRatingPolicy::Reject)
            .build();
        let h = harness_with(config, Arc::new(MemoryStore::new()));
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("Ubik").expect("item");
        h.engine.submit_rating(author.id, item.id, 5, None).expect("first");
        let err = h.engine.submit_rating(author.id, item.id, 6, None).unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_vote_cast_cancel_flip() {
        let h = harness();
        let author = h.engine.register_user("author").expect("author");
        let voter = h.engine.register_user("voter").expect("voter");
        let item = h.engine.create_item("Blindsight").expect("item");
        let rating = h.engine.submit_rating(author.id, item.id, 8, None).expect("rate");

        let receipt = h.engine.submit_vote(voter.id, rating.id, 1).expect("up");
        assert_eq!(receipt.state, VoteState::UpVoted);
        assert_eq!(receipt.counters, VoteCounters::new(1, 0));
        assert_eq!(receipt.net_delta, 1);

        let receipt = h.engine.submit_vote(voter.id, rating.id, -1).expect("flip");
        assert_eq!(receipt.state, VoteState::DownVoted);
        assert_eq!(receipt.counters, VoteCounters::new(0, 1));
        assert_eq!(receipt.net_delta, -2);

        let receipt = h.engine.submit_vote(voter.id, rating.id, -1).expect("cancel");
        assert_eq!(receipt.state, VoteState::NoVote);
        assert_eq!(receipt.counters, VoteCounters::new(0, 0));
        assert_eq!(receipt.net_delta, 1);
    }

    #[test_case(0 ; "zero")]
    #[test_case(2 ; "two")]
    #[tokio::test]
    async fn test_invalid_direction_rejected(direction: i8) {
        let h = harness();
        let voter = h.engine.register_user("voter").expect("voter");
        let err = h.engine.submit_vote(voter.id, RatingId::new(), direction).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn test_vote_on_missing_rating() {
        let h = harness();
        let voter = h.engine.register_user("voter").expect("voter");
        let err = h.engine.submit_vote(voter.id, RatingId::new(), 1).unwrap_err();
        assert!(matches!(err, EngineError::NotFound { kind: "rating", .. }));
    }

    #[tokio::test]
    async fn test_failed_background_step_keeps_primary_write() {
        let faulty = Arc::new(FaultyStore::new(MemoryStore::new()));
        let store: Arc<dyn RecordStore> = faulty.clone();
        let h = harness_with(EngineConfig::default(), store);
        let author = h.engine.register_user("author").expect("user");
        let item = h.engine.create_item("Anathem").expect("item");

        let rating = h.engine.submit_rating(author.id, item.id, 9, None).expect("rate");
        // The background task has not run yet on this single-threaded runtime.
        faulty.fail(FaultKind::Writes);
        h.dispatcher.wait_idle().await;
        faulty.heal_all();

        let stored = h.engine.get_rating(rating.id).expect("rating survives");
        assert_eq!(stored.weight, 0.0);
        assert_eq!(h.engine.get_item_score(item.id).expect("score").ratings_count, 0);
        assert_eq!(h.dispatcher.stats().failed, 1);
    }

    #[tokio::test]
    async fn test_ranking_orders_by_score() {
        let h = harness();
        let author = h.engine.register_user("author").expect("user");
        let good = h.engine.create_item("Good").expect("item");
        let bad = h.engine.create_item("Bad").expect("item");
        let unrated = h.engine.create_item("Unrated").expect("item");
        h.engine.submit_rating(author.id, good.id, 10, Some("great".into())).expect("rate");
        h.engine.submit_rating(author.id, bad.id, 1, Some("awful".into())).expect("rate");
        h.dispatcher.wait_idle().await;
        h.engine.recompute_item(unrated.id).expect("recompute");

        let ranked = h.engine.list_ranked_items(10).expect("rank");
        let titles: Vec<&str> = ranked.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["Good", "Unrated", "Bad"]);
        assert_eq!(h.engine.list_ranked_items(1).expect("rank").len(), 1);
    }

    #[tokio::test]
    async fn test_blank_names_rejected() {
        let h = harness();
        assert!(matches!(h.engine.register_user("  "), Err(EngineError::Validation(_))));
        assert!(matches!(h.engine.create_item(""), Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let dispatcher = TokioDispatcher::try_current().expect("runtime");
        let config = EngineConfig::builder().prior(-2.0, 6.0).build();
        let result = ReputationEngine::new(config, Arc::new(MemoryStore::new()), Arc::new(dispatcher));
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn test_reconciler_disabled_by_default() {
        let h = harness();
        assert!(h.engine.start_reconciler(CancellationToken::new()).is_none());
    }
}
