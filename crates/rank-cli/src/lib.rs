//! # rank-cli
//!
//! The `novelrank` command-line interface.
//!
//! Every invocation opens a [`Session`] over a JSON state file, runs one
//! command against the [`rank_engine::ReputationEngine`], waits for the
//! background recomputations it triggered, and writes the state back.
//!
//! ```text
//! novelrank seed
//! novelrank rate wei "The Dark Forest" 9 --comment "Chilling"
//! novelrank ranking --limit 5
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod session;

pub use cli::{Cli, Commands, Format, ItemCommands, UserCommands};
pub use error::{CliError, CliResult};
pub use output::OutputFormat;
pub use session::Session;
