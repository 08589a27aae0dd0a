//! Records managed by the reputation engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregate::ItemScore;
use crate::ids::{ItemId, RatingId, UserId};
use crate::trust::TrustScore;
use crate::vote::{VoteCounters, VoteDirection};
use crate::CoreError;

/// Inclusive range of accepted rating scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreRange {
    /// Lowest accepted score.
    pub min: u8,
    /// Highest accepted score.
    pub max: u8,
}

impl Default for ScoreRange {
    fn default() -> Self {
        Self { min: 1, max: 10 }
    }
}

impl ScoreRange {
    /// Validate a raw score against the range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidScore`] if the score is out of range.
    pub fn check(&self, score: i64) -> Result<RatingScore, CoreError> {
        if score < i64::from(self.min) || score > i64::from(self.max) {
            return Err(CoreError::InvalidScore {
                score,
                min: self.min,
                max: self.max,
            });
        }
        Ok(RatingScore(score as u8))
    }

    /// Ensure the range itself is well formed.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] if `min > max`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.min > self.max {
            return Err(CoreError::InvalidParameter {
                name: "ratings.score_range",
                reason: format!("min {} exceeds max {}", self.min, self.max),
            });
        }
        Ok(())
    }
}

/// A validated rating score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RatingScore(u8);

impl RatingScore {
    /// Returns the raw score.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

/// One user's rating of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    /// Rating identity.
    pub id: RatingId,
    /// Rated item.
    pub item_id: ItemId,
    /// Author of the rating.
    pub author_id: UserId,
    /// Validated score.
    pub score: RatingScore,
    /// Optional review text, stored as submitted.
    pub comment: Option<String>,
    /// Community vote counters.
    pub counters: VoteCounters,
    /// Confidence weight, 0.0 until first computed.
    pub weight: f64,
    /// Author trust observed when the weight was last computed. Informational.
    pub author_trust: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Rating {
    /// Create an unweighted rating.
    #[must_use]
    pub fn new(
        item_id: ItemId,
        author_id: UserId,
        score: RatingScore,
        comment: Option<String>,
        author_trust: TrustScore,
    ) -> Self {
        Self {
            id: RatingId::new(),
            item_id,
            author_id,
            score,
            comment,
            counters: VoteCounters::default(),
            weight: 0.0,
            author_trust: author_trust.value(),
            created_at: Utc::now(),
        }
    }

    /// Whether the rating carries review text.
    #[must_use]
    pub fn has_comment(&self) -> bool {
        self.comment.as_deref().is_some_and(|c| !c.is_empty())
    }
}

/// A recorded vote. Its existence encodes the voter's state for the rating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    /// Voting user.
    pub voter_id: UserId,
    /// Rating voted on.
    pub rating_id: RatingId,
    /// Vote direction.
    pub direction: VoteDirection,
    /// When this direction was cast.
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    /// Create a vote cast now.
    #[must_use]
    pub fn new(voter_id: UserId, rating_id: RatingId, direction: VoteDirection) -> Self {
        Self {
            voter_id,
            rating_id,
            direction,
            cast_at: Utc::now(),
        }
    }
}

/// A rated item (a novel) with its denormalized aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Item identity.
    pub id: ItemId,
    /// Display title.
    pub title: String,
    /// Bayesian-adjusted score, owned by the aggregator.
    pub weighted_score: f64,
    /// Number of ratings folded into `weighted_score`.
    pub ratings_count: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Create an item with an empty aggregate.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: ItemId::new(),
            title: title.into(),
            weighted_score: 0.0,
            ratings_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Current aggregate as stored.
    #[must_use]
    pub const fn score(&self) -> ItemScore {
        ItemScore {
            weighted_score: self.weighted_score,
            ratings_count: self.ratings_count,
        }
    }
}

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identity.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Bounded trust multiplier.
    pub trust: TrustScore,
    /// Registration time, input to trust reconciliation.
    pub registered_at: DateTime<Utc>,
}

impl User {
    /// Create a user with the given starting trust.
    #[must_use]
    pub fn new(username: impl Into<String>, trust: TrustScore) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            trust,
            registered_at: Utc::now(),
        }
    }
}
