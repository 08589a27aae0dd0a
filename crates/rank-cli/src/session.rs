//! One CLI invocation's view of the engine.
//!
//! A session loads the snapshot, wires a [`ReputationEngine`] over it with a
//! dispatcher on the current runtime, and on [`Session::close`] waits for
//! background recomputation before writing the snapshot back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rank_core::{Item, ItemId, Rating, RatingId, User, UserId};
use rank_engine::{DispatchStats, EngineConfig, ReputationEngine, TokioDispatcher};
use rank_store::{MemoryStore, RecordStore};
use tracing::{debug, warn};

use crate::error::{CliError, CliResult};

/// Engine, store and dispatcher for a single command.
pub struct Session {
    path: PathBuf,
    store: Arc<MemoryStore>,
    dispatcher: TokioDispatcher,
    engine: ReputationEngine,
}

impl Session {
    /// Load state from `state` and configuration from `config`, if given.
    ///
    /// Must be called from inside a tokio runtime.
    pub fn open(state: &Path, config: Option<&Path>) -> CliResult<Self> {
        let config = match config {
            Some(path) => EngineConfig::from_json_file(path)?,
            None => EngineConfig::default(),
        };
        let store = Arc::new(MemoryStore::load_snapshot(state)?);
        store.check_ranges(&config.trust.bounds, &config.ratings.score_range())?;
        let dispatcher = TokioDispatcher::try_current()?;
        let shared: Arc<dyn RecordStore> = store.clone();
        let engine = ReputationEngine::new(config, shared, Arc::new(dispatcher.clone()))?;
        debug!(state = %state.display(), "Session opened");

        Ok(Self {
            path: state.to_path_buf(),
            store,
            dispatcher,
            engine,
        })
    }

    /// The engine.
    #[must_use]
    pub const fn engine(&self) -> &ReputationEngine {
        &self.engine
    }

    /// Direct store access for listings.
    #[must_use]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Wait for every scheduled background task to finish.
    pub async fn settle(&self) -> DispatchStats {
        self.dispatcher.wait_idle().await;
        self.dispatcher.stats()
    }

    /// Resolve a user by id or exact username.
    pub fn resolve_user(&self, reference: &str) -> CliResult<User> {
        if let Ok(id) = UserId::parse(reference) {
            return Ok(self.store.get_user(id)?);
        }
        self.store
            .list_users()?
            .into_iter()
            .find(|u| u.username == reference)
            .ok_or_else(|| CliError::InvalidArgument(format!("no user named {reference:?}")))
    }

    /// Resolve an item by id or title, ignoring case.
    pub fn resolve_item(&self, reference: &str) -> CliResult<Item> {
        if let Ok(id) = ItemId::parse(reference) {
            return Ok(self.store.get_item(id)?);
        }
        self.find_item_by_title(reference)?
            .ok_or_else(|| CliError::InvalidArgument(format!("no novel titled {reference:?}")))
    }

    /// Look up an item by title, ignoring case.
    pub fn find_item_by_title(&self, title: &str) -> CliResult<Option<Item>> {
        let wanted = title.trim().to_lowercase();
        Ok(self
            .store
            .list_items()?
            .into_iter()
            .find(|i| i.title.to_lowercase() == wanted))
    }

    /// Parse a rating id.
    pub fn resolve_rating(&self, reference: &str) -> CliResult<RatingId> {
        Ok(RatingId::parse(reference)?)
    }

    /// Every stored rating, grouped by item.
    pub fn all_ratings(&self) -> CliResult<Vec<Rating>> {
        let mut ratings = Vec::new();
        for item in self.store.list_items()? {
            ratings.extend(self.store.ratings_for_item(item.id)?);
        }
        Ok(ratings)
    }

    /// Drain background work and write the snapshot.
    pub async fn close(self) -> CliResult<DispatchStats> {
        let stats = self.settle().await;
        if stats.failed > 0 || stats.panicked > 0 {
            warn!(
                failed = stats.failed,
                panicked = stats.panicked,
                "Some background recomputations did not complete; derived scores may be stale"
            );
        }
        self.store.save_snapshot(&self.path)?;
        Ok(stats)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn state_survives_close_and_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");

        let session = Session::open(&path, None).expect("open");
        let user = session.engine().register_user("ada").expect("user");
        let item = session.engine().create_item("Solaris").expect("item");
        session
            .engine()
            .submit_rating(user.id, item.id, 9, None)
            .expect("rate");
        session.close().await.expect("close");

        let session = Session::open(&path, None).expect("reopen");
        assert_eq!(session.resolve_user("ada").expect("by name").id, user.id);
        let stored = session.resolve_item("solaris").expect("by title");
        assert_eq!(stored.ratings_count, 1);
        assert!(stored.weighted_score > 0.0);
    }

    #[tokio::test]
    async fn unknown_references_are_invalid_arguments() {
        let dir = tempfile::tempdir().expect("tempdir");
        let session = Session::open(&dir.path().join("s.json"), None).expect("open");

        assert!(matches!(
            session.resolve_user("nobody"),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.resolve_item("Unwritten"),
            Err(CliError::InvalidArgument(_))
        ));
        assert!(matches!(
            session.resolve_rating("not-a-uuid"),
            Err(CliError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn bad_config_file_fails_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = dir.path().join("config.json");
        std::fs::write(&config, r#"{ "scoring": { "prior_strength": -2.0 } }"#).expect("write");
        let result = Session::open(&dir.path().join("s.json"), Some(&config));
        assert!(matches!(result, Err(CliError::Engine(_))));
    }

    #[tokio::test]
    async fn out_of_bounds_trust_in_state_file_fails_open() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state.json");
        let session = Session::open(&path, None).expect("open");
        session.engine().register_user("ada").expect("user");
        session.close().await.expect("close");

        let raw = std::fs::read_to_string(&path).expect("read");
        let mut json: serde_json::Value = serde_json::from_str(&raw).expect("parse");
        json["users"][0]["trust"] = serde_json::json!(7.5);
        std::fs::write(&path, json.to_string()).expect("write");

        let result = Session::open(&path, None);
        assert!(matches!(
            result,
            Err(CliError::State(rank_store::StoreError::Snapshot(_)))
        ));
    }
}
