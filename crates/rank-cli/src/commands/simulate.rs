//! Random voting traffic.

use std::io::Write;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rank_core::{VoteDirection, VoteTransition};
use rank_store::RecordStore;
use tracing::{debug, info};

use crate::cli::SimulateArgs;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, SimulationSummary};
use crate::session::Session;

/// Simulate command executor.
pub struct SimulateCommand<'a> {
    session: &'a Session,
}

impl<'a> SimulateCommand<'a> {
    /// Create a new simulate command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute the simulate command.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &SimulateArgs,
    ) -> CliResult<()> {
        let mut rng = match args.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let users = self.session.store().list_users()?;
        let ratings = self.session.all_ratings()?;
        if users.is_empty() || ratings.is_empty() {
            return Err(CliError::InvalidArgument(
                "nothing to vote on; run `novelrank seed` first".to_string(),
            ));
        }

        let mut summary = SimulationSummary {
            attempted: args.votes,
            casts: 0,
            cancels: 0,
            flips: 0,
            rejected: 0,
            background: Default::default(),
        };
        let engine = self.session.engine();

        for _ in 0..args.votes {
            let (Some(voter), Some(rating)) = (users.choose(&mut rng), ratings.choose(&mut rng))
            else {
                break;
            };
            let direction = if rng.gen_bool(0.7) {
                VoteDirection::Up
            } else {
                VoteDirection::Down
            };

            match engine.submit_vote(voter.id, rating.id, direction.into()) {
                Ok(receipt) => match receipt.transition {
                    VoteTransition::Cast(_) => summary.casts += 1,
                    VoteTransition::Cancel(_) => summary.cancels += 1,
                    VoteTransition::Flip { .. } => summary.flips += 1,
                },
                Err(err) => {
                    summary.rejected += 1;
                    debug!(voter_id = %voter.id, rating_id = %rating.id, error = %err, "Vote rejected");
                }
            }
        }

        summary.background = self.session.settle().await;
        info!(
            votes = summary.attempted,
            casts = summary.casts,
            cancels = summary.cancels,
            flips = summary.flips,
            "Simulation finished"
        );
        format.write(writer, &summary)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Format;
    use crate::commands::SeedCommand;

    #[tokio::test]
    async fn simulation_accounts_for_every_vote() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::open(&dir.path().join("s.json"), None).expect("open");
        SeedCommand::new(&session)
            .execute(&mut Vec::new(), &OutputFormat::default())
            .await
            .expect("seed");

        let mut out = Vec::new();
        let args = SimulateArgs { votes: 200, seed: Some(7) };
        SimulateCommand::new(&session)
            .execute(&mut out, &OutputFormat::new(Format::Json), &args)
            .await
            .expect("simulate");
        let parsed: serde_json::Value = serde_json::from_slice(&out).expect("json");
        let total = ["casts", "cancels", "flips", "rejected"]
            .iter()
            .map(|k| parsed[*k].as_u64().expect("count"))
            .sum::<u64>();
        assert_eq!(total, 200);
        assert_eq!(parsed["background"]["panicked"], 0);

        for user in session.store().list_users().expect("users") {
            assert!((0.8..=1.5).contains(&user.trust.value()));
        }
    }

    #[tokio::test]
    async fn empty_state_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::open(&dir.path().join("s.json"), None).expect("open");
        let args = SimulateArgs { votes: 5, seed: None };
        let err = SimulateCommand::new(&session)
            .execute(&mut Vec::new(), &OutputFormat::default(), &args)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
