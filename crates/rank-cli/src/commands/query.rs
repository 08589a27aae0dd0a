//! Read-only queries: scores, trust and ranking.

use std::io::Write;

use crate::error::CliResult;
use crate::output::{ItemTable, OutputFormat, ScoreView, TrustView};
use crate::session::Session;

/// Query command executor.
pub struct QueryCommand<'a> {
    session: &'a Session,
}

impl<'a> QueryCommand<'a> {
    /// Create a new query command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Print the stored score of a novel.
    pub async fn score<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        item: &str,
    ) -> CliResult<()> {
        let item = self.session.resolve_item(item)?;
        let score = self.session.engine().get_item_score(item.id)?;
        let view = ScoreView {
            item_id: item.id.to_string(),
            title: item.title,
            weighted_score: score.weighted_score,
            ratings_count: score.ratings_count,
        };
        format.write(writer, &view)?;
        Ok(())
    }

    /// Print the trust score of a user.
    pub async fn trust<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        user: &str,
    ) -> CliResult<()> {
        let user = self.session.resolve_user(user)?;
        let trust = self.session.engine().get_user_trust_score(user.id)?;
        let view = TrustView {
            user_id: user.id.to_string(),
            username: user.username,
            trust,
        };
        format.write(writer, &view)?;
        Ok(())
    }

    /// Print the top `limit` novels.
    pub async fn ranking<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        limit: usize,
    ) -> CliResult<()> {
        let items = self.session.engine().list_ranked_items(limit)?;
        format.write(writer, &ItemTable(items))?;
        Ok(())
    }
}
