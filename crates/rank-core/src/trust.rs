//! Bounded per-user trust scores.
//!
//! Trust evolves incrementally from rating and voting activity, and can be
//! recomputed from a user's full history by the reconciliation formula. Both
//! paths share one clamp, so a [`TrustScore`] produced here always lies within
//! its [`TrustBounds`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Rating;
use crate::CoreError;

/// A user's trust multiplier.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustScore(f64);

impl TrustScore {
    /// Neutral trust held by every new user under default bounds.
    pub const NEUTRAL: Self = Self(1.0);

    /// Returns the raw value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Floor, ceiling and starting value for trust scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustBounds {
    /// Lowest reachable trust.
    pub floor: f64,
    /// Highest reachable trust.
    pub ceiling: f64,
    /// Trust assigned to newly registered users.
    pub initial: f64,
}

impl Default for TrustBounds {
    fn default() -> Self {
        Self {
            floor: 0.8,
            ceiling: 1.5,
            initial: 1.0,
        }
    }
}

impl TrustBounds {
    /// Check that the bounds are usable.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] unless
    /// `0 < floor <= initial <= ceiling` and all values are finite.
    pub fn validate(&self) -> Result<(), CoreError> {
        let finite = self.floor.is_finite() && self.ceiling.is_finite() && self.initial.is_finite();
        if !finite || self.floor <= 0.0 {
            return Err(CoreError::InvalidParameter {
                name: "trust.bounds",
                reason: "bounds must be finite and the floor positive".to_string(),
            });
        }
        if !(self.floor <= self.initial && self.initial <= self.ceiling) {
            return Err(CoreError::InvalidParameter {
                name: "trust.bounds",
                reason: format!(
                    "expected floor <= initial <= ceiling, got {} / {} / {}",
                    self.floor, self.initial, self.ceiling
                ),
            });
        }
        Ok(())
    }

    /// Clamp a raw value into the bounds. NaN collapses to the floor.
    #[must_use]
    pub fn clamp(&self, value: f64) -> TrustScore {
        TrustScore(self.ceiling.min(self.floor.max(value)))
    }

    /// Apply a signed change to a previous score.
    #[must_use]
    pub fn apply(&self, previous: TrustScore, delta: f64) -> TrustScore {
        self.clamp(previous.0 + delta)
    }

    /// Trust for a newly registered user.
    #[must_use]
    pub fn initial_score(&self) -> TrustScore {
        self.clamp(self.initial)
    }

    /// Whether a raw value lies within the bounds.
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        (self.floor..=self.ceiling).contains(&value)
    }
}

/// Reward constants for incremental updates and reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustPolicy {
    /// Weight above which a rating counts as high quality (strictly greater).
    pub high_quality_threshold: f64,
    /// Author reward for a high-quality rating.
    pub high_quality_reward: f64,
    /// Author reward for any other rating.
    pub participation_reward: f64,
    /// Author trust change per unit of vote net delta.
    pub vote_unit: f64,
    /// Voter reward for voting on someone else's rating.
    pub curation_reward: f64,
    /// Starting point of the reconciliation formula.
    pub reconcile_base: f64,
    /// Tenure period length in days.
    pub tenure_period_days: f64,
    /// Reward per tenure period.
    pub tenure_reward: f64,
    /// Reconciliation reward per high-quality rating.
    pub high_quality_bonus: f64,
    /// Reconciliation reward per upvote received.
    pub upvote_bonus: f64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            high_quality_threshold: 0.8,
            high_quality_reward: 0.1,
            participation_reward: 0.02,
            vote_unit: 0.01,
            curation_reward: 0.001,
            reconcile_base: 1.0,
            tenure_period_days: 30.0,
            tenure_reward: 0.05,
            high_quality_bonus: 0.1,
            upvote_bonus: 0.01,
        }
    }
}

impl TrustPolicy {
    /// Check that every constant is finite and the tenure period positive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] naming the first bad constant.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("trust.policy.high_quality_threshold", self.high_quality_threshold),
            ("trust.policy.high_quality_reward", self.high_quality_reward),
            ("trust.policy.participation_reward", self.participation_reward),
            ("trust.policy.vote_unit", self.vote_unit),
            ("trust.policy.curation_reward", self.curation_reward),
            ("trust.policy.reconcile_base", self.reconcile_base),
            ("trust.policy.tenure_reward", self.tenure_reward),
            ("trust.policy.high_quality_bonus", self.high_quality_bonus),
            ("trust.policy.upvote_bonus", self.upvote_bonus),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(CoreError::InvalidParameter {
                    name,
                    reason: format!("must be finite, got {value}"),
                });
            }
        }
        if !(self.tenure_period_days.is_finite() && self.tenure_period_days > 0.0) {
            return Err(CoreError::InvalidParameter {
                name: "trust.policy.tenure_period_days",
                reason: "must be a positive number of days".to_string(),
            });
        }
        Ok(())
    }

    /// Whether a rating weight qualifies as high quality.
    #[must_use]
    pub fn is_high_quality(&self, weight: f64) -> bool {
        weight > self.high_quality_threshold
    }

    /// Author trust change for a freshly weighted rating.
    #[must_use]
    pub fn rating_reward(&self, weight: f64) -> f64 {
        if self.is_high_quality(weight) {
            self.high_quality_reward
        } else {
            self.participation_reward
        }
    }

    /// Author trust change for a vote transition with the given net delta.
    #[must_use]
    pub fn author_vote_delta(&self, net_delta: i32) -> f64 {
        f64::from(net_delta) * self.vote_unit
    }

    /// Voter trust change, `None` for self-votes.
    #[must_use]
    pub fn voter_reward(&self, self_vote: bool) -> Option<f64> {
        (!self_vote).then_some(self.curation_reward)
    }
}

/// Activity summary consumed by the reconciliation formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationInput {
    /// Fractional days since registration, never negative.
    pub days_since_registration: f64,
    /// Ratings whose stored weight exceeds the high-quality threshold.
    pub high_quality_ratings: u64,
    /// Upvotes received across all of the user's ratings.
    pub total_upvotes: u64,
}

impl ReconciliationInput {
    /// Summarise a user's ratings as of `now`.
    #[must_use]
    pub fn from_history(
        registered_at: DateTime<Utc>,
        now: DateTime<Utc>,
        ratings: &[Rating],
        policy: &TrustPolicy,
    ) -> Self {
        let hours = (now - registered_at).num_seconds().max(0) as f64 / 3600.0;
        let high_quality_ratings = ratings
            .iter()
            .filter(|r| policy.is_high_quality(r.weight))
            .count() as u64;
        let total_upvotes = ratings.iter().map(|r| u64::from(r.counters.upvotes)).sum();
        Self {
            days_since_registration: hours / 24.0,
            high_quality_ratings,
            total_upvotes,
        }
    }
}

/// Trust bounds and policy applied together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustModel {
    /// Clamp bounds.
    pub bounds: TrustBounds,
    /// Reward constants.
    pub policy: TrustPolicy,
}

impl TrustModel {
    /// Validate bounds and policy.
    ///
    /// # Errors
    ///
    /// Returns the first [`CoreError::InvalidParameter`] found.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.bounds.validate()?;
        self.policy.validate()
    }

    /// Author trust after one of their ratings was weighted.
    #[must_use]
    pub fn after_rating(&self, previous: TrustScore, weight: f64) -> TrustScore {
        self.bounds.apply(previous, self.policy.rating_reward(weight))
    }

    /// Author trust after a vote transition on one of their ratings.
    #[must_use]
    pub fn after_vote_received(&self, previous: TrustScore, net_delta: i32) -> TrustScore {
        self.bounds
            .apply(previous, self.policy.author_vote_delta(net_delta))
    }

    /// Voter trust after voting; unchanged for self-votes.
    #[must_use]
    pub fn after_vote_cast(&self, previous: TrustScore, self_vote: bool) -> TrustScore {
        match self.policy.voter_reward(self_vote) {
            Some(delta) => self.bounds.apply(previous, delta),
            None => previous,
        }
    }

    /// Full recomputation from activity history.
    #[must_use]
    pub fn reconcile(&self, input: &ReconciliationInput) -> TrustScore {
        let p = &self.policy;
        let tenure = (input.days_since_registration.max(0.0) / p.tenure_period_days) * p.tenure_reward;
        let raw = p.reconcile_base
            + tenure
            + input.high_quality_ratings as f64 * p.high_quality_bonus
            + input.total_upvotes as f64 * p.upvote_bonus;
        self.bounds.clamp(raw)
    }
}
