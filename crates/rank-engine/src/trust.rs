//! Incremental trust updates.

use std::sync::Arc;

use rank_core::{TrustModel, TrustScore, UserId};
use rank_store::RecordStore;
use tracing::debug;

use crate::error::EngineResult;

/// Applies activity rewards to user trust.
///
/// Every change is a read-modify-write of one user record, clamped into the
/// configured bounds.
#[derive(Clone)]
pub struct TrustUpdater {
    store: Arc<dyn RecordStore>,
    model: TrustModel,
}

impl std::fmt::Debug for TrustUpdater {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustUpdater")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TrustUpdater {
    /// Create an updater over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, model: TrustModel) -> Self {
        Self { store, model }
    }

    /// Reward the author of a freshly weighted rating.
    pub fn on_rating_created(&self, author: UserId, weight: f64) -> EngineResult<TrustScore> {
        let model = self.model;
        let trust = self
            .store
            .update_user_trust(author, &mut |prev| model.after_rating(prev, weight))?;
        debug!(
            user_id = %author,
            weight,
            high_quality = model.policy.is_high_quality(weight),
            trust = trust.value(),
            "Author trust updated for rating"
        );
        Ok(trust)
    }

    /// Apply a vote transition: the author moves by `net_delta` units and a
    /// voter other than the author earns the curation reward.
    pub fn on_vote(&self, voter: UserId, author: UserId, net_delta: i32) -> EngineResult<()> {
        let model = self.model;
        let author_trust = self
            .store
            .update_user_trust(author, &mut |prev| model.after_vote_received(prev, net_delta))?;
        debug!(user_id = %author, net_delta, trust = author_trust.value(), "Author trust updated for vote");

        if voter != author {
            let voter_trust = self
                .store
                .update_user_trust(voter, &mut |prev| model.after_vote_cast(prev, false))?;
            debug!(user_id = %voter, trust = voter_trust.value(), "Voter trust updated");
        }
        Ok(())
    }

    /// Current trust of a user.
    pub fn trust_of(&self, user: UserId) -> EngineResult<TrustScore> {
        Ok(self.store.get_user(user)?.trust)
    }
}
