//! Per-rating confidence weights.
//!
//! A weight is the product of four bounded factors:
//!
//! - **action**: 1.0 for a rating with a comment, 0.5 without;
//! - **quality**: pluggable [`QualityScorer`], neutral 1.0 by default,
//!   clamped into [`WeightConfig::quality_min`]..=[`WeightConfig::quality_max`];
//! - **trust**: the author's live trust score, bounded by the trust clamp;
//! - **community**: `1 + 0.5 * log10(net_upvotes + 1)`, never below 1.0.
//!
//! The product is capped at [`WeightConfig::max_weight`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::model::Rating;
use crate::trust::TrustScore;
use crate::vote::VoteCounters;
use crate::CoreError;

/// Content-quality factor. Implementations must be cheap and side-effect free.
pub trait QualityScorer: Send + Sync {
    /// Quality factor for a rating; 1.0 is neutral.
    fn quality_weight(&self, rating: &Rating) -> f64;
}

/// Quality scorer that treats every rating as average.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralQuality;

impl QualityScorer for NeutralQuality {
    fn quality_weight(&self, _rating: &Rating) -> f64 {
        1.0
    }
}

/// Tunables for the weight formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Action factor for ratings with a comment.
    pub commented_action: f64,
    /// Action factor for bare scores.
    pub bare_action: f64,
    /// Multiplier on the community log term.
    pub community_scale: f64,
    /// Lowest quality factor accepted from a scorer.
    pub quality_min: f64,
    /// Highest quality factor accepted from a scorer.
    pub quality_max: f64,
    /// Cap on the final weight.
    pub max_weight: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            commented_action: 1.0,
            bare_action: 0.5,
            community_scale: 0.5,
            quality_min: 0.5,
            quality_max: 1.5,
            max_weight: 10.0,
        }
    }
}

impl WeightConfig {
    /// Check that every factor stays positive and finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), CoreError> {
        let positive = [
            ("weight.commented_action", self.commented_action),
            ("weight.bare_action", self.bare_action),
            ("weight.quality_min", self.quality_min),
            ("weight.quality_max", self.quality_max),
            ("weight.max_weight", self.max_weight),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::InvalidParameter {
                    name,
                    reason: format!("must be positive and finite, got {value}"),
                });
            }
        }
        if !(self.community_scale.is_finite() && self.community_scale >= 0.0) {
            return Err(CoreError::InvalidParameter {
                name: "weight.community_scale",
                reason: format!("must be non-negative, got {}", self.community_scale),
            });
        }
        if self.quality_min > self.quality_max {
            return Err(CoreError::InvalidParameter {
                name: "weight.quality_min",
                reason: "exceeds quality_max".to_string(),
            });
        }
        Ok(())
    }
}

/// The four factors of a weight, kept for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightFactors {
    /// Effort factor.
    pub action: f64,
    /// Content-quality factor.
    pub quality: f64,
    /// Author trust factor.
    pub trust: f64,
    /// Community approval factor.
    pub community: f64,
}

impl WeightFactors {
    /// Uncapped product of the factors.
    #[must_use]
    pub fn product(&self) -> f64 {
        self.action * self.quality * self.trust * self.community
    }
}

/// Computes rating weights.
#[derive(Clone)]
pub struct WeightCalculator {
    config: WeightConfig,
    quality: Arc<dyn QualityScorer>,
}

impl fmt::Debug for WeightCalculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeightCalculator")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for WeightCalculator {
    fn default() -> Self {
        Self::new(WeightConfig::default())
    }
}

impl WeightCalculator {
    /// Calculator with the neutral quality scorer.
    #[must_use]
    pub fn new(config: WeightConfig) -> Self {
        Self::with_quality(config, Arc::new(NeutralQuality))
    }

    /// Calculator with a custom quality scorer.
    #[must_use]
    pub fn with_quality(config: WeightConfig, quality: Arc<dyn QualityScorer>) -> Self {
        Self { config, quality }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &WeightConfig {
        &self.config
    }

    /// Effort factor.
    #[must_use]
    pub fn action_weight(&self, rating: &Rating) -> f64 {
        if rating.has_comment() {
            self.config.commented_action
        } else {
            self.config.bare_action
        }
    }

    /// Quality factor from the scorer, clamped; non-finite output is neutral.
    #[must_use]
    pub fn quality_weight(&self, rating: &Rating) -> f64 {
        let raw = self.quality.quality_weight(rating);
        if raw.is_finite() {
            raw.clamp(self.config.quality_min, self.config.quality_max)
        } else {
            1.0
        }
    }

    /// Community factor from vote counters.
    #[must_use]
    pub fn community_weight(&self, counters: &VoteCounters) -> f64 {
        let net = f64::from(counters.net_approval());
        1.0 + self.config.community_scale * (net + 1.0).log10()
    }

    /// All four factors for a rating given its author's current trust.
    #[must_use]
    pub fn factors(&self, rating: &Rating, trust: TrustScore) -> WeightFactors {
        WeightFactors {
            action: self.action_weight(rating),
            quality: self.quality_weight(rating),
            trust: trust.value(),
            community: self.community_weight(&rating.counters),
        }
    }

    /// Final, capped weight.
    #[must_use]
    pub fn weight(&self, rating: &Rating, trust: TrustScore) -> f64 {
        self.factors(rating, trust).product().min(self.config.max_weight)
    }
}
