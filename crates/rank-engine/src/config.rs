//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs to name the
//! values it overrides:
//!
//! ```json
//! { "scoring": { "prior_strength": 10.0 }, "ratings": { "duplicate_policy": "reject" } }
//! ```

use std::path::Path;
use std::time::Duration;

use rank_core::{BayesianPrior, ScoreRange, TrustBounds, TrustModel, TrustPolicy, WeightConfig};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// What to do when a user rates an item they already rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateRatingPolicy {
    /// Accept every rating; each one counts in the aggregate.
    #[default]
    Allow,
    /// Refuse a second rating of the same item with a conflict.
    Reject,
}

/// Rating acceptance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingsConfig {
    /// Lowest accepted score.
    pub min_score: u8,
    /// Highest accepted score.
    pub max_score: u8,
    /// Handling of repeat ratings by the same author.
    pub duplicate_policy: DuplicateRatingPolicy,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        let range = ScoreRange::default();
        Self {
            min_score: range.min,
            max_score: range.max,
            duplicate_policy: DuplicateRatingPolicy::default(),
        }
    }
}

impl RatingsConfig {
    /// Accepted score range.
    #[must_use]
    pub const fn score_range(&self) -> ScoreRange {
        ScoreRange {
            min: self.min_score,
            max: self.max_score,
        }
    }
}

/// Periodic trust reconciliation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Seconds between reconciliation runs.
    pub interval_secs: u64,
    /// Whether the background reconciler runs at all.
    pub enabled: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            interval_secs: 86_400,
            enabled: false,
        }
    }
}

impl ReconciliationConfig {
    /// Interval between runs.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bayesian prior `m` and `c`.
    pub scoring: BayesianPrior,
    /// Trust bounds and reward policy.
    pub trust: TrustModel,
    /// Weight formula tunables.
    pub weight: WeightConfig,
    /// Rating acceptance rules.
    pub ratings: RatingsConfig,
    /// Background reconciliation.
    pub reconciliation: ReconciliationConfig,
}

impl EngineConfig {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| EngineError::Validation(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn from_json_file(path: &Path) -> EngineResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Validation(format!("cannot read config {}: {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    /// Check every section.
    pub fn validate(&self) -> EngineResult<()> {
        self.scoring.validate()?;
        self.trust.validate()?;
        self.weight.validate()?;
        self.ratings.score_range().validate()?;
        if self.reconciliation.enabled && self.reconciliation.interval_secs == 0 {
            return Err(EngineError::Validation(
                "reconciliation.interval_secs must be positive when enabled".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the Bayesian prior.
    #[must_use]
    pub fn prior(mut self, prior_strength: f64, prior_mean: f64) -> Self {
        self.config.scoring = BayesianPrior {
            prior_strength,
            prior_mean,
        };
        self
    }

    /// Set trust bounds.
    #[must_use]
    pub fn trust_bounds(mut self, bounds: TrustBounds) -> Self {
        self.config.trust.bounds = bounds;
        self
    }

    /// Set trust reward policy.
    #[must_use]
    pub fn trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.config.trust.policy = policy;
        self
    }

    /// Set weight tunables.
    #[must_use]
    pub fn weight(mut self, weight: WeightConfig) -> Self {
        self.config.weight = weight;
        self
    }

    /// Set the accepted score range.
    #[must_use]
    pub fn score_range(mut self, min_score: u8, max_score: u8) -> Self {
        self.config.ratings.min_score = min_score;
        self.config.ratings.max_score = max_score;
        self
    }

    /// Set the duplicate rating policy.
    #[must_use]
    pub fn duplicate_policy(mut self, policy: DuplicateRatingPolicy) -> Self {
        self.config.ratings.duplicate_policy = policy;
        self
    }

    /// Enable periodic reconciliation at the given interval.
    #[must_use]
    pub fn reconcile_every(mut self, interval: Duration) -> Self {
        self.config.reconciliation = ReconciliationConfig {
            interval_secs: interval.as_secs(),
            enabled: true,
        };
        self
    }

    /// Build the configuration. Call [`EngineConfig::validate`] before use.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
