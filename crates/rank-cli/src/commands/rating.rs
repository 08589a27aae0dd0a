//! Rating and vote submission.

use std::io::Write;

use rank_core::VoteDirection;

use crate::cli::{RateArgs, VoteArgs};
use crate::error::CliResult;
use crate::output::OutputFormat;
use crate::session::Session;

/// Rating command executor.
pub struct RatingCommand<'a> {
    session: &'a Session,
}

impl<'a> RatingCommand<'a> {
    /// Create a new rating command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Submit a rating and print it once its weight has been computed.
    pub async fn rate<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &RateArgs,
    ) -> CliResult<()> {
        let author = self.session.resolve_user(&args.user)?;
        let item = self.session.resolve_item(&args.item)?;
        let engine = self.session.engine();

        let rating = engine.submit_rating(author.id, item.id, args.score, args.comment.clone())?;
        self.session.settle().await;
        format.write(writer, &engine.get_rating(rating.id)?)?;
        Ok(())
    }

    /// Apply a vote action and print the receipt.
    pub async fn vote<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &VoteArgs,
    ) -> CliResult<()> {
        let voter = self.session.resolve_user(&args.user)?;
        let rating = self.session.resolve_rating(&args.rating)?;
        let direction = i8::from(VoteDirection::from(args.direction));

        let receipt = self.session.engine().submit_vote(voter.id, rating, direction)?;
        format.write(writer, &receipt)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::VoteArg;
    use crate::CliError;
    use rank_engine::EngineError;

    async fn fixture(dir: &tempfile::TempDir) -> (Session, String) {
        let session = Session::open(&dir.path().join("s.json"), None).expect("open");
        session.engine().register_user("ann").expect("ann");
        session.engine().register_user("ben").expect("ben");
        session.engine().create_item("Solaris").expect("item");
        let cmd = RatingCommand::new(&session);
        let args = RateArgs {
            user: "ann".into(),
            item: "Solaris".into(),
            score: 8,
            comment: Some("Strange and cold".into()),
        };
        cmd.rate(&mut Vec::new(), &OutputFormat::default(), &args)
            .await
            .expect("rate");
        let rating = session.all_ratings().expect("ratings").remove(0);
        (session, rating.id.to_string())
    }

    #[tokio::test]
    async fn rate_prints_computed_weight() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (session, rating_id) = fixture(&dir).await;
        let rating = session
            .engine()
            .get_rating(session.resolve_rating(&rating_id).expect("id"))
            .expect("rating");
        // commented, neutral trust, no votes
        assert!((rating.weight - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn vote_twice_withdraws() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (session, rating_id) = fixture(&dir).await;
        let cmd = RatingCommand::new(&session);
        let args = VoteArgs {
            user: "ben".into(),
            rating: rating_id,
            direction: VoteArg::Up,
        };
        let format = OutputFormat::default();

        let mut out = Vec::new();
        cmd.vote(&mut out, &format, &args).await.expect("cast");
        assert!(String::from_utf8(out).expect("utf8").contains("cast up"));

        let mut out = Vec::new();
        cmd.vote(&mut out, &format, &args).await.expect("cancel");
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.contains("withdrew up"));
        assert!(text.contains("+0 / -0"));
    }

    #[tokio::test]
    async fn out_of_range_score_is_a_validation_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (session, _) = fixture(&dir).await;
        let args = RateArgs {
            user: "ben".into(),
            item: "Solaris".into(),
            score: 11,
            comment: None,
        };
        let err = RatingCommand::new(&session)
            .rate(&mut Vec::new(), &OutputFormat::default(), &args)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Engine(EngineError::Validation(_))));
    }
}
