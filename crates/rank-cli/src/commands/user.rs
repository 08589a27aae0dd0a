//! User management commands.

use std::io::Write;

use rank_store::RecordStore;

use crate::cli::UserCommands;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, UserTable};
use crate::session::Session;

/// User command executor.
pub struct UserCommand<'a> {
    session: &'a Session,
}

impl<'a> UserCommand<'a> {
    /// Create a new user command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute a user subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &UserCommands,
    ) -> CliResult<()> {
        match command {
            UserCommands::Add { username } => {
                if self.session.resolve_user(username).is_ok() {
                    return Err(CliError::InvalidArgument(format!(
                        "user {username:?} already exists"
                    )));
                }
                let user = self.session.engine().register_user(username)?;
                format.write(writer, &user)?;
            }
            UserCommands::List => {
                let mut users = self.session.store().list_users()?;
                users.sort_by(|a, b| a.username.cmp(&b.username));
                format.write(writer, &UserTable(users))?;
            }
        }
        Ok(())
    }
}
