//! Periodic trust reconciliation.
//!
//! Incremental updates can drift from what a user's history justifies. The
//! reconciler recomputes each user's trust from tenure, high-quality ratings
//! and upvotes received, and overwrites the stored value.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rank_core::{ReconciliationInput, TrustModel, UserId};
use rank_store::RecordStore;
use serde::Serialize;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::EngineResult;

/// Trust values closer than this are considered unchanged.
const TRUST_EPSILON: f64 = 1e-9;

/// Summary of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Users visited.
    pub users: usize,
    /// Users whose trust changed.
    pub adjusted: usize,
    /// Users that could not be reconciled.
    pub failed: usize,
}

/// Recomputes trust from activity history.
#[derive(Clone)]
pub struct TrustReconciler {
    store: Arc<dyn RecordStore>,
    model: TrustModel,
}

impl std::fmt::Debug for TrustReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustReconciler")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl TrustReconciler {
    /// Create a reconciler over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, model: TrustModel) -> Self {
        Self { store, model }
    }

    /// Recompute and store one user's trust as of `now`.
    pub fn reconcile_user(&self, user_id: UserId, now: DateTime<Utc>) -> EngineResult<f64> {
        self.reconcile_one(user_id, now).map(|(_, after)| after)
    }

    fn reconcile_one(&self, user_id: UserId, now: DateTime<Utc>) -> EngineResult<(f64, f64)> {
        let user = self.store.get_user(user_id)?;
        let ratings = self.store.ratings_by_author(user_id)?;
        let input =
            ReconciliationInput::from_history(user.registered_at, now, &ratings, &self.model.policy);
        let trust = self.model.reconcile(&input);
        self.store.set_user_trust(user_id, trust)?;

        debug!(
            user_id = %user_id,
            days = input.days_since_registration,
            high_quality = input.high_quality_ratings,
            upvotes = input.total_upvotes,
            before = user.trust.value(),
            after = trust.value(),
            "User trust reconciled"
        );
        Ok((user.trust.value(), trust.value()))
    }

    /// Reconcile every user. Per-user failures are logged and counted.
    pub fn reconcile_all(&self, now: DateTime<Utc>) -> EngineResult<ReconcileReport> {
        let users = self.store.list_users()?;
        let mut report = ReconcileReport {
            users: users.len(),
            ..ReconcileReport::default()
        };

        for user in users {
            match self.reconcile_one(user.id, now) {
                Ok((before, after)) => {
                    if (before - after).abs() > TRUST_EPSILON {
                        report.adjusted += 1;
                    }
                }
                Err(err) => {
                    report.failed += 1;
                    warn!(user_id = %user.id, error = %err, "Trust reconciliation failed for user");
                }
            }
        }

        info!(
            users = report.users,
            adjusted = report.adjusted,
            failed = report.failed,
            "Trust reconciliation finished"
        );
        Ok(report)
    }

    /// Reconcile every `period` until `cancel` fires. The first pass runs one
    /// period after the call. Returns the number of completed passes.
    pub async fn run_periodic(&self, period: Duration, cancel: CancellationToken) -> u64 {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut passes = 0;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!(passes, "Trust reconciler stopped");
                    return passes;
                }
                _ = ticker.tick() => {
                    match self.reconcile_all(Utc::now()) {
                        Ok(_) => passes += 1,
                        Err(err) => error!(error = %err, "Trust reconciliation pass failed"),
                    }
                }
            }
        }
    }
}
