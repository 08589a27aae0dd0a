//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rank_core::VoteDirection;

/// novelrank - weighted novel ratings with voter trust.
#[derive(Parser, Debug, Clone)]
#[command(name = "novelrank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON state file. Created on first write.
    #[arg(short, long, env = "NOVELRANK_STATE", default_value = "novelrank-state.json")]
    pub state: PathBuf,

    /// Engine configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, env = "NOVELRANK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Emit logs as JSON lines on stderr.
    #[arg(long)]
    pub log_json: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// User management.
    User {
        /// User subcommand to execute.
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Novel catalogue management.
    Item {
        /// Item subcommand to execute.
        #[command(subcommand)]
        command: ItemCommands,
    },

    /// Rate a novel.
    Rate(RateArgs),

    /// Vote on a rating. Repeating a vote withdraws it.
    Vote(VoteArgs),

    /// Show the weighted score of a novel.
    Score {
        /// Item id or exact title.
        item: String,
    },

    /// Show the trust score of a user.
    Trust {
        /// User id or username.
        user: String,
    },

    /// List novels by weighted score.
    Ranking {
        /// Maximum number of entries.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Recompute trust from each user's history.
    Reconcile(ReconcileArgs),

    /// Load a demo catalogue of three novels with ratings and votes.
    Seed,

    /// Generate random voting traffic against existing ratings.
    Simulate(SimulateArgs),
}

/// User subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum UserCommands {
    /// Register a user.
    Add {
        /// Unique display name.
        username: String,
    },
    /// List users with their trust.
    List,
}

/// Item subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum ItemCommands {
    /// Add a novel to the catalogue.
    Add {
        /// Novel title.
        title: String,
    },
    /// List the catalogue.
    List,
}

/// Arguments for `rate`.
#[derive(Args, Debug, Clone)]
pub struct RateArgs {
    /// Author: user id or username.
    pub user: String,

    /// Novel: item id or exact title.
    pub item: String,

    /// Score within the configured range.
    #[arg(allow_negative_numbers = true)]
    pub score: i64,

    /// Optional review text.
    #[arg(short, long)]
    pub comment: Option<String>,
}

/// Vote direction as typed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoteArg {
    /// Upvote.
    Up,
    /// Downvote.
    Down,
}

impl From<VoteArg> for VoteDirection {
    fn from(arg: VoteArg) -> Self {
        match arg {
            VoteArg::Up => Self::Up,
            VoteArg::Down => Self::Down,
        }
    }
}

/// Arguments for `vote`.
#[derive(Args, Debug, Clone)]
pub struct VoteArgs {
    /// Voter: user id or username.
    pub user: String,

    /// Rating id.
    pub rating: String,

    /// Vote direction.
    #[arg(value_enum)]
    pub direction: VoteArg,
}

/// Arguments for `reconcile`.
#[derive(Args, Debug, Clone)]
pub struct ReconcileArgs {
    /// Reconcile a single user (id or username) instead of everyone.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Keep running on the configured interval until interrupted.
    #[arg(long, conflicts_with = "user")]
    pub watch: bool,
}

/// Arguments for `simulate`.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of vote actions to generate.
    #[arg(short, long, default_value_t = 100)]
    pub votes: usize,

    /// RNG seed for reproducible runs.
    #[arg(long)]
    pub seed: Option<u64>,
}
