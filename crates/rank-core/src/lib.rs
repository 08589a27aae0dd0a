//! # rank-core
//!
//! Domain rules for the novelrank reputation engine.
//!
//! This crate provides:
//!
//! - [`VoteState`] — per (voter, rating) vote state machine
//! - [`WeightCalculator`] — confidence weight of a rating
//! - [`TrustModel`] — bounded trust updates and reconciliation
//! - [`BayesianPrior`] / [`ScoreAggregate`] — Bayesian-adjusted item scores
//! - [`Rating`], [`Vote`], [`Item`], [`User`] — the stored records
//!
//! Nothing here performs I/O; persistence and scheduling live in
//! `rank-store` and `rank-engine`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aggregate;
pub mod error;
pub mod ids;
pub mod model;
pub mod trust;
pub mod vote;
pub mod weight;

pub use aggregate::{BayesianPrior, ItemScore, ScoreAggregate};
pub use error::CoreError;
pub use ids::{ItemId, RatingId, UserId};
pub use model::{Item, Rating, RatingScore, ScoreRange, User, Vote};
pub use trust::{ReconciliationInput, TrustBounds, TrustModel, TrustPolicy, TrustScore};
pub use vote::{VoteCounters, VoteDirection, VoteOutcome, VoteState, VoteTransition};
pub use weight::{NeutralQuality, QualityScorer, WeightCalculator, WeightConfig, WeightFactors};
