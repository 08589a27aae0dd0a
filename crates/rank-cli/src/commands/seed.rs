//! Demo catalogue.
//!
//! Seeds three novels, each rated 8, 9 and 10 by three readers, plus a few
//! votes from a fourth user. Re-running skips novels that already exist.

use std::io::Write;

use rank_core::{User, VoteDirection};
use tracing::info;

use crate::error::CliResult;
use crate::output::{OutputFormat, SeedSummary};
use crate::session::Session;

const NOVELS: [&str; 3] = ["The Three-Body Problem", "The Wandering Earth", "The Dark Forest"];

const READERS: [(&str, i64, Option<&str>); 3] = [
    ("lin", 8, None),
    ("wei", 9, Some("Hard science done with real imagination.")),
    ("mei", 10, Some("Could not put it down.")),
];

const VOTER: &str = "critic";

/// Seed command executor.
pub struct SeedCommand<'a> {
    session: &'a Session,
}

impl<'a> SeedCommand<'a> {
    /// Create a new seed command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute the seed command.
    pub async fn execute<W: Write>(&self, writer: &mut W, format: &OutputFormat) -> CliResult<()> {
        let summary = self.seed()?;
        self.session.settle().await;
        info!(
            items = summary.items_created,
            ratings = summary.ratings,
            votes = summary.votes,
            "Demo catalogue seeded"
        );
        format.write(writer, &summary)?;
        Ok(())
    }

    fn seed(&self) -> CliResult<SeedSummary> {
        let engine = self.session.engine();
        let mut summary = SeedSummary {
            users_created: 0,
            items_created: 0,
            items_skipped: Vec::new(),
            ratings: 0,
            votes: 0,
        };

        let mut readers = Vec::with_capacity(READERS.len());
        for (name, score, comment) in READERS {
            readers.push((self.user(name, &mut summary)?, score, comment));
        }
        let voter = self.user(VOTER, &mut summary)?;

        for title in NOVELS {
            if self.session.find_item_by_title(title)?.is_some() {
                summary.items_skipped.push(title.to_string());
                continue;
            }
            let item = engine.create_item(title)?;
            summary.items_created += 1;

            for (reader, score, comment) in &readers {
                let rating = engine.submit_rating(
                    reader.id,
                    item.id,
                    *score,
                    comment.map(str::to_string),
                )?;
                summary.ratings += 1;

                // The critic backs reviews and frowns on bare scores.
                let direction = if rating.has_comment() {
                    VoteDirection::Up
                } else {
                    VoteDirection::Down
                };
                engine.submit_vote(voter.id, rating.id, direction.into())?;
                summary.votes += 1;
            }
        }
        Ok(summary)
    }

    fn user(&self, name: &str, summary: &mut SeedSummary) -> CliResult<User> {
        if let Ok(user) = self.session.resolve_user(name) {
            return Ok(user);
        }
        summary.users_created += 1;
        Ok(self.session.engine().register_user(name)?)
    }
}
