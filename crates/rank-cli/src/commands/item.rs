//! Novel catalogue commands.

use std::io::Write;

use rank_store::RecordStore;

use crate::cli::ItemCommands;
use crate::error::{CliError, CliResult};
use crate::output::{ItemTable, OutputFormat};
use crate::session::Session;

/// Item command executor.
pub struct ItemCommand<'a> {
    session: &'a Session,
}

impl<'a> ItemCommand<'a> {
    /// Create a new item command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute an item subcommand.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        command: &ItemCommands,
    ) -> CliResult<()> {
        match command {
            ItemCommands::Add { title } => {
                if self.session.find_item_by_title(title)?.is_some() {
                    return Err(CliError::InvalidArgument(format!(
                        "novel {title:?} already exists"
                    )));
                }
                let item = self.session.engine().create_item(title)?;
                format.write(writer, &item)?;
            }
            ItemCommands::List => {
                let mut items = self.session.store().list_items()?;
                items.sort_by(|a, b| a.title.cmp(&b.title));
                format.write(writer, &ItemTable(items))?;
            }
        }
        Ok(())
    }
}
