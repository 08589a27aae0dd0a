//! Trust reconciliation from activity history.

use std::io::Write;

use chrono::Utc;
use rank_engine::EngineError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::ReconcileArgs;
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, TrustView, WatchSummary};
use crate::session::Session;

/// Reconcile command executor.
pub struct ReconcileCommand<'a> {
    session: &'a Session,
}

impl<'a> ReconcileCommand<'a> {
    /// Create a new reconcile command.
    #[must_use]
    pub const fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute the reconcile command.
    pub async fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &ReconcileArgs,
    ) -> CliResult<()> {
        if args.watch {
            let passes = self.watch().await?;
            format.write(writer, &WatchSummary { passes })?;
            return Ok(());
        }

        let reconciler = self.session.engine().reconciler();
        match &args.user {
            Some(reference) => {
                let user = self.session.resolve_user(reference)?;
                let trust = reconciler.reconcile_user(user.id, Utc::now())?;
                let view = TrustView {
                    user_id: user.id.to_string(),
                    username: user.username,
                    trust,
                };
                format.write(writer, &view)?;
            }
            None => {
                let report = reconciler.reconcile_all(Utc::now())?;
                format.write(writer, &report)?;
            }
        }
        Ok(())
    }

    /// Run the periodic reconciler until Ctrl-C.
    async fn watch(&self) -> CliResult<u64> {
        let cancel = CancellationToken::new();
        let Some(handle) = self.session.engine().start_reconciler(cancel.clone()) else {
            return Err(CliError::InvalidArgument(
                "reconciliation is disabled; set reconciliation.enabled in the config file"
                    .to_string(),
            ));
        };

        let trigger = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping reconciler");
            }
            trigger.cancel();
        });

        handle
            .await
            .map_err(|e| CliError::Engine(EngineError::InternalFault(format!("reconciler task: {e}"))))
    }
}
