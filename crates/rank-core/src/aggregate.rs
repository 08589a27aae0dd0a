//! Bayesian-adjusted item scores.
//!
//! The observed weighted average of an item's ratings is blended with a
//! prior mean `c`, in proportion to the total rating weight against the
//! prior strength `m`:
//!
//! ```text
//! final = W / (W + m) * avg + m / (W + m) * c
//! ```
//!
//! Items with little evidence sit near `c`; heavily rated items converge on
//! their own average.

use serde::{Deserialize, Serialize};

use crate::model::Rating;
use crate::CoreError;

/// Prior used to damp items with little evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianPrior {
    /// Prior strength `m`, in units of rating weight.
    pub prior_strength: f64,
    /// Prior mean `c`, on the rating score scale.
    pub prior_mean: f64,
}

impl Default for BayesianPrior {
    fn default() -> Self {
        Self {
            prior_strength: 5.0,
            prior_mean: 6.0,
        }
    }
}

impl BayesianPrior {
    /// Check that `m` is finite and non-negative and `c` is finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidParameter`] otherwise.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.prior_strength.is_finite() && self.prior_strength >= 0.0) {
            return Err(CoreError::InvalidParameter {
                name: "scoring.prior_strength",
                reason: format!("must be finite and >= 0, got {}", self.prior_strength),
            });
        }
        if !self.prior_mean.is_finite() {
            return Err(CoreError::InvalidParameter {
                name: "scoring.prior_mean",
                reason: format!("must be finite, got {}", self.prior_mean),
            });
        }
        Ok(())
    }

    /// Blend an aggregate with the prior.
    #[must_use]
    pub fn score(&self, aggregate: &ScoreAggregate) -> f64 {
        let m = self.prior_strength;
        let w = aggregate.total_weight;
        let denominator = w + m;
        if denominator == 0.0 {
            return self.prior_mean;
        }
        (w / denominator) * aggregate.weighted_average() + (m / denominator) * self.prior_mean
    }
}

/// Running sums over an item's ratings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreAggregate {
    /// Sum of `score * weight`.
    pub total_weighted: f64,
    /// Sum of weights.
    pub total_weight: f64,
    /// Number of ratings folded in.
    pub count: u64,
}

impl ScoreAggregate {
    /// Fold one `(score, weight)` pair.
    #[must_use]
    pub fn push(self, score: f64, weight: f64) -> Self {
        Self {
            total_weighted: self.total_weighted + score * weight,
            total_weight: self.total_weight + weight,
            count: self.count + 1,
        }
    }

    /// Aggregate over stored ratings.
    #[must_use]
    pub fn from_ratings<'a>(ratings: impl IntoIterator<Item = &'a Rating>) -> Self {
        ratings.into_iter().fold(Self::default(), |acc, r| {
            acc.push(f64::from(r.score.value()), r.weight)
        })
    }

    /// Weighted mean, 0.0 when no weight has been accumulated.
    #[must_use]
    pub fn weighted_average(&self) -> f64 {
        if self.total_weight == 0.0 {
            0.0
        } else {
            self.total_weighted / self.total_weight
        }
    }
}

impl FromIterator<(f64, f64)> for ScoreAggregate {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::default(), |acc, (score, weight)| acc.push(score, weight))
    }
}

/// Denormalized score stored on an item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    /// Bayesian-adjusted score.
    pub weighted_score: f64,
    /// Number of ratings.
    pub ratings_count: u64,
}

impl ItemScore {
    /// Compute the stored score for an aggregate.
    #[must_use]
    pub fn compute(prior: &BayesianPrior, aggregate: &ScoreAggregate) -> Self {
        Self {
            weighted_score: prior.score(aggregate),
            ratings_count: aggregate.count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-3;

    #[test]
    fn two_ratings_against_default_prior() {
        let aggregate: ScoreAggregate = [(8.0, 1.0), (4.0, 0.5)].into_iter().collect();
        assert!((aggregate.total_weighted - 10.0).abs() < 1e-12);
        assert!((aggregate.total_weight - 1.5).abs() < 1e-12);
        assert!((aggregate.weighted_average() - 6.667).abs() < EPS);

        let score = ItemScore::compute(&BayesianPrior::default(), &aggregate);
        assert!((score.weighted_score - 6.154).abs() < EPS);
        assert_eq!(score.ratings_count, 2);
    }

    #[test]
    fn empty_item_gets_prior_mean() {
        let score = ItemScore::compute(&BayesianPrior::default(), &ScoreAggregate::default());
        assert_eq!(score.weighted_score, 6.0);
        assert_eq!(score.ratings_count, 0);
    }

    #[test]
    fn zero_prior_and_zero_weight_returns_mean() {
        let prior = BayesianPrior {
            prior_strength: 0.0,
            prior_mean: 7.0,
        };
        let aggregate: ScoreAggregate = [(9.0, 0.0)].into_iter().collect();
        assert_eq!(prior.score(&aggregate), 7.0);
    }

    #[test]
    fn zero_prior_is_plain_average() {
        let prior = BayesianPrior {
            prior_strength: 0.0,
            prior_mean: 6.0,
        };
        let aggregate: ScoreAggregate = [(10.0, 1.0), (2.0, 1.0)].into_iter().collect();
        assert!((prior.score(&aggregate) - 6.0).abs() < 1e-12);
    }

    #[test]
    fn prior_validation() {
        assert!(BayesianPrior::default().validate().is_ok());
        let negative = BayesianPrior {
            prior_strength: -1.0,
            prior_mean: 6.0,
        };
        assert!(negative.validate().is_err());
        let nan_mean = BayesianPrior {
            prior_strength: 5.0,
            prior_mean: f64::NAN,
        };
        assert!(nan_mean.validate().is_err());
    }

    proptest! {
        #[test]
        fn score_lies_between_average_and_prior(
            pairs in prop::collection::vec((1.0f64..=10.0, 0.1f64..5.0), 1..30)
        ) {
            let prior = BayesianPrior::default();
            let aggregate: ScoreAggregate = pairs.into_iter().collect();
            let avg = aggregate.weighted_average();
            let score = prior.score(&aggregate);
            let lo = avg.min(prior.prior_mean) - 1e-9;
            let hi = avg.max(prior.prior_mean) + 1e-9;
            prop_assert!(score >= lo && score <= hi);
        }

        #[test]
        fn aggregation_is_order_independent(
            pairs in prop::collection::vec((1.0f64..=10.0, 0.0f64..5.0), 0..30)
        ) {
            let prior = BayesianPrior::default();
            let forward: ScoreAggregate = pairs.iter().copied().collect();
            let backward: ScoreAggregate = pairs.iter().rev().copied().collect();
            prop_assert!((prior.score(&forward) - prior.score(&backward)).abs() < 1e-9);
            prop_assert_eq!(forward.count, backward.count);
        }
    }
}
