//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use rank_core::{Item, Rating, User, VoteTransition};
use rank_engine::{DispatchStats, ReconcileReport, VoteReceipt};
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

fn rule<W: Write>(writer: &mut W, width: usize) -> Result<(), CliError> {
    writeln!(writer, "{}", "─".repeat(width))?;
    Ok(())
}

/// Registered users.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct UserTable(pub Vec<User>);

impl TableDisplay for UserTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No users registered.")?;
            return Ok(());
        }
        writeln!(writer, "{:<36}  {:<20}  {:>6}", "ID", "USERNAME", "TRUST")?;
        rule(writer, 66)?;
        for user in &self.0 {
            writeln!(
                writer,
                "{:<36}  {:<20}  {:>6.3}",
                user.id,
                user.username,
                user.trust.value()
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for User {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "User:      {}", self.username)?;
        writeln!(writer, "ID:        {}", self.id)?;
        writeln!(writer, "Trust:     {:.3}", self.trust.value())?;
        writeln!(writer, "Joined:    {}", self.registered_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        Ok(())
    }
}

/// Items in display order. Table output numbers them.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ItemTable(pub Vec<Item>);

impl TableDisplay for ItemTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.0.is_empty() {
            writeln!(writer, "No novels in the catalogue.")?;
            return Ok(());
        }
        writeln!(
            writer,
            "{:>3}  {:<36}  {:<32}  {:>6}  {:>7}",
            "#", "ID", "TITLE", "SCORE", "RATINGS"
        )?;
        rule(writer, 92)?;
        for (rank, item) in self.0.iter().enumerate() {
            writeln!(
                writer,
                "{:>3}  {:<36}  {:<32}  {:>6.2}  {:>7}",
                rank + 1,
                item.id,
                truncate(&item.title, 32),
                item.weighted_score,
                item.ratings_count
            )?;
        }
        Ok(())
    }
}

impl TableDisplay for Item {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Novel:     {}", self.title)?;
        writeln!(writer, "ID:        {}", self.id)?;
        writeln!(writer, "Score:     {:.2}", self.weighted_score)?;
        writeln!(writer, "Ratings:   {}", self.ratings_count)?;
        Ok(())
    }
}

impl TableDisplay for Rating {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Rating:    {}", self.id)?;
        writeln!(writer, "Novel:     {}", self.item_id)?;
        writeln!(writer, "Author:    {}", self.author_id)?;
        writeln!(writer, "Score:     {}", self.score.value())?;
        if let Some(comment) = &self.comment {
            writeln!(writer, "Comment:   {comment}")?;
        }
        writeln!(
            writer,
            "Votes:     +{} / -{}",
            self.counters.upvotes, self.counters.downvotes
        )?;
        writeln!(writer, "Weight:    {:.4}", self.weight)?;
        Ok(())
    }
}

impl TableDisplay for VoteReceipt {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let action = match self.transition {
            VoteTransition::Cast(direction) => format!("cast {direction}"),
            VoteTransition::Cancel(direction) => format!("withdrew {direction}"),
            VoteTransition::Flip { from, to } => format!("flipped {from} to {to}"),
        };
        writeln!(writer, "Rating:    {}", self.rating_id)?;
        writeln!(writer, "Action:    {action}")?;
        writeln!(
            writer,
            "Votes:     +{} / -{}",
            self.counters.upvotes, self.counters.downvotes
        )?;
        writeln!(writer, "Net delta: {:+}", self.net_delta)?;
        Ok(())
    }
}

/// Score of one item.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreView {
    /// Item id.
    pub item_id: String,
    /// Item title.
    pub title: String,
    /// Bayesian-adjusted score.
    pub weighted_score: f64,
    /// Ratings folded into the score.
    pub ratings_count: u64,
}

impl TableDisplay for ScoreView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}", self.title)?;
        writeln!(writer, "  Weighted score: {:.3}", self.weighted_score)?;
        writeln!(writer, "  Ratings:        {}", self.ratings_count)?;
        Ok(())
    }
}

/// Trust of one user.
#[derive(Debug, Clone, Serialize)]
pub struct TrustView {
    /// User id.
    pub user_id: String,
    /// Username.
    pub username: String,
    /// Trust multiplier.
    pub trust: f64,
}

impl TableDisplay for TrustView {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "{}: {:.3}", self.username, self.trust)?;
        Ok(())
    }
}

impl TableDisplay for ReconcileReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Trust Reconciliation")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Users visited:    {}", self.users)?;
        writeln!(writer, "Adjusted:         {}", self.adjusted)?;
        writeln!(writer, "Failed:           {}", self.failed)?;
        Ok(())
    }
}

/// Result of `reconcile --watch`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct WatchSummary {
    /// Completed reconciliation passes.
    pub passes: u64,
}

impl TableDisplay for WatchSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Reconciler stopped after {} pass(es).", self.passes)?;
        Ok(())
    }
}

/// What `seed` added.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    /// Users created.
    pub users_created: usize,
    /// Novels created.
    pub items_created: usize,
    /// Titles already present and left alone.
    pub items_skipped: Vec<String>,
    /// Ratings submitted.
    pub ratings: usize,
    /// Votes submitted.
    pub votes: usize,
}

impl TableDisplay for SeedSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Seed Summary")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Users created:    {}", self.users_created)?;
        writeln!(writer, "Novels created:   {}", self.items_created)?;
        writeln!(writer, "Ratings:          {}", self.ratings)?;
        writeln!(writer, "Votes:            {}", self.votes)?;
        for title in &self.items_skipped {
            writeln!(writer, "Skipped existing: {title}")?;
        }
        Ok(())
    }
}

/// What `simulate` did.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationSummary {
    /// Vote actions attempted.
    pub attempted: usize,
    /// First votes.
    pub casts: usize,
    /// Withdrawn votes.
    pub cancels: usize,
    /// Reversed votes.
    pub flips: usize,
    /// Actions rejected by the engine.
    pub rejected: usize,
    /// Background task outcomes.
    pub background: DispatchStats,
}

impl TableDisplay for SimulationSummary {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Simulation")?;
        writeln!(writer, "══════════════════════════════════")?;
        writeln!(writer, "Vote actions:     {}", self.attempted)?;
        writeln!(writer, "  Cast:           {}", self.casts)?;
        writeln!(writer, "  Withdrawn:      {}", self.cancels)?;
        writeln!(writer, "  Flipped:        {}", self.flips)?;
        writeln!(writer, "  Rejected:       {}", self.rejected)?;
        writeln!(writer)?;
        writeln!(writer, "Background tasks")?;
        writeln!(writer, "  Succeeded:      {}", self.background.succeeded)?;
        writeln!(writer, "  Failed:         {}", self.background.failed)?;
        writeln!(writer, "  Panicked:       {}", self.background.panicked)?;
        Ok(())
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
