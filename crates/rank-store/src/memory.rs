//! In-memory record store with JSON snapshots.
//!
//! All tables sit behind one [`RwLock`]. Single-record updates take the write
//! lock briefly; a transaction holds it for its whole body, so transactions
//! are serializable with respect to every other write.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use parking_lot::RwLock;
use rank_core::{
    Item, ItemId, ItemScore, Rating, RatingId, ScoreRange, TrustBounds, TrustScore, User, UserId,
    Vote, VoteCounters,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::{RecordStore, Transaction};

/// Snapshot format version written by [`MemoryStore::save_snapshot`].
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    items: HashMap<ItemId, Item>,
    ratings: HashMap<RatingId, Rating>,
    votes: HashMap<(UserId, RatingId), Vote>,
}

impl Tables {
    fn rating(&self, id: RatingId) -> StoreResult<&Rating> {
        self.ratings
            .get(&id)
            .ok_or_else(|| StoreError::not_found("rating", id))
    }
}

/// Serializable image of a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Format version.
    pub version: u32,
    /// Users.
    pub users: Vec<User>,
    /// Items.
    pub items: Vec<Item>,
    /// Ratings.
    pub ratings: Vec<Rating>,
    /// Votes.
    pub votes: Vec<Vote>,
}

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] for an unknown version and
    /// [`StoreError::Conflict`] if ratings or votes reference missing records.
    pub fn from_snapshot(snapshot: Snapshot) -> StoreResult<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {}",
                snapshot.version
            )));
        }

        let mut tables = Tables::default();
        for user in snapshot.users {
            tables.users.insert(user.id, user);
        }
        for item in snapshot.items {
            tables.items.insert(item.id, item);
        }
        for rating in snapshot.ratings {
            if !tables.items.contains_key(&rating.item_id) {
                return Err(StoreError::Conflict(format!(
                    "rating {} references unknown item {}",
                    rating.id, rating.item_id
                )));
            }
            tables.ratings.insert(rating.id, rating);
        }
        for vote in snapshot.votes {
            if !tables.ratings.contains_key(&vote.rating_id) {
                return Err(StoreError::Conflict(format!(
                    "vote references unknown rating {}",
                    vote.rating_id
                )));
            }
            tables.votes.insert((vote.voter_id, vote.rating_id), vote);
        }

        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Capture the current contents, sorted for stable output.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let tables = self.tables.read();

        let mut users: Vec<User> = tables.users.values().cloned().collect();
        users.sort_by_key(|u| (u.registered_at, u.id));
        let mut items: Vec<Item> = tables.items.values().cloned().collect();
        items.sort_by_key(|i| (i.created_at, i.id));
        let mut ratings: Vec<Rating> = tables.ratings.values().cloned().collect();
        ratings.sort_by_key(|r| (r.created_at, r.id));
        let mut votes: Vec<Vote> = tables.votes.values().cloned().collect();
        votes.sort_by_key(|v| (v.cast_at, v.rating_id, v.voter_id));

        Snapshot {
            version: SNAPSHOT_VERSION,
            users,
            items,
            ratings,
            votes,
        }
    }

    /// Load a store from a JSON snapshot file. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] if the file cannot be read or parsed.
    pub fn load_snapshot(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::new());
        }
        let raw = fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        debug!(
            path = %path.display(),
            users = snapshot.users.len(),
            ratings = snapshot.ratings.len(),
            "Loaded snapshot"
        );
        Self::from_snapshot(snapshot)
    }

    /// Check loaded records against the active trust bounds and score range.
    ///
    /// Snapshots are plain JSON, so a hand-edited file can carry values the
    /// engine would never have written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] for the first user whose trust lies
    /// outside `bounds`, or the first rating whose score lies outside
    /// `scores` or whose weight is negative or not finite.
    pub fn check_ranges(&self, bounds: &TrustBounds, scores: &ScoreRange) -> StoreResult<()> {
        let tables = self.tables.read();
        for user in tables.users.values() {
            let trust = user.trust.value();
            if !bounds.contains(trust) {
                return Err(StoreError::Snapshot(format!(
                    "user {} has trust {trust} outside [{}, {}]",
                    user.id, bounds.floor, bounds.ceiling
                )));
            }
        }
        for rating in tables.ratings.values() {
            if let Err(err) = scores.check(i64::from(rating.score.value())) {
                return Err(StoreError::Snapshot(format!("rating {}: {err}", rating.id)));
            }
            if !rating.weight.is_finite() || rating.weight < 0.0 {
                return Err(StoreError::Snapshot(format!(
                    "rating {} has invalid weight {}",
                    rating.id, rating.weight
                )));
            }
        }
        Ok(())
    }

    /// Write the store to a JSON snapshot file, replacing it atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Snapshot`] on I/O or serialization failure.
    pub fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let snapshot = self.snapshot();
        let json = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)?;

        info!(
            path = %path.display(),
            users = snapshot.users.len(),
            items = snapshot.items.len(),
            ratings = snapshot.ratings.len(),
            votes = snapshot.votes.len(),
            "Saved snapshot"
        );
        Ok(())
    }
}

fn sorted_ratings<'a>(ratings: impl Iterator<Item = &'a Rating>) -> Vec<Rating> {
    let mut out: Vec<Rating> = ratings.cloned().collect();
    out.sort_by_key(|r| (r.created_at, r.id));
    out
}

impl RecordStore for MemoryStore {
    fn insert_user(&self, user: User) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.users.contains_key(&user.id) {
            return Err(StoreError::already_exists("user", user.id));
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.tables
            .read()
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        let mut users: Vec<User> = self.tables.read().users.values().cloned().collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    fn update_user_trust(
        &self,
        id: UserId,
        update: &mut dyn FnMut(TrustScore) -> TrustScore,
    ) -> StoreResult<TrustScore> {
        let mut tables = self.tables.write();
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("user", id))?;
        user.trust = update(user.trust);
        Ok(user.trust)
    }

    fn set_user_trust(&self, id: UserId, trust: TrustScore) -> StoreResult<()> {
        self.update_user_trust(id, &mut |_| trust).map(|_| ())
    }

    fn insert_item(&self, item: Item) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if tables.items.contains_key(&item.id) {
            return Err(StoreError::already_exists("item", item.id));
        }
        tables.items.insert(item.id, item);
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> StoreResult<Item> {
        self.tables
            .read()
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("item", id))
    }

    fn list_items(&self) -> StoreResult<Vec<Item>> {
        let mut items: Vec<Item> = self.tables.read().items.values().cloned().collect();
        items.sort_by_key(|i| (i.created_at, i.id));
        Ok(items)
    }

    fn update_item_score(&self, id: ItemId, score: ItemScore) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let item = tables
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("item", id))?;
        item.weighted_score = score.weighted_score;
        item.ratings_count = score.ratings_count;
        Ok(())
    }

    fn insert_rating(&self, rating: Rating) -> StoreResult<()> {
        let mut tables = self.tables.write();
        if !tables.items.contains_key(&rating.item_id) {
            return Err(StoreError::not_found("item", rating.item_id));
        }
        if tables.ratings.contains_key(&rating.id) {
            return Err(StoreError::already_exists("rating", rating.id));
        }
        tables.ratings.insert(rating.id, rating);
        Ok(())
    }

    fn get_rating(&self, id: RatingId) -> StoreResult<Rating> {
        self.tables.read().rating(id).cloned()
    }

    fn ratings_for_item(&self, id: ItemId) -> StoreResult<Vec<Rating>> {
        let tables = self.tables.read();
        Ok(sorted_ratings(
            tables.ratings.values().filter(|r| r.item_id == id),
        ))
    }

    fn ratings_by_author(&self, id: UserId) -> StoreResult<Vec<Rating>> {
        let tables = self.tables.read();
        Ok(sorted_ratings(
            tables.ratings.values().filter(|r| r.author_id == id),
        ))
    }

    fn update_rating_weight(
        &self,
        id: RatingId,
        weight: f64,
        author_trust: f64,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let rating = tables
            .ratings
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("rating", id))?;
        rating.weight = weight;
        rating.author_trust = author_trust;
        Ok(())
    }

    fn get_vote(&self, voter: UserId, rating: RatingId) -> StoreResult<Option<Vote>> {
        Ok(self.tables.read().votes.get(&(voter, rating)).cloned())
    }

    fn transaction(
        &self,
        body: &mut dyn FnMut(&mut dyn Transaction) -> StoreResult<()>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let mut tx = MemoryTransaction {
            tables: &*tables,
            votes: HashMap::new(),
            counters: HashMap::new(),
        };
        body(&mut tx)?;

        let MemoryTransaction {
            votes, counters, ..
        } = tx;
        for (key, vote) in votes {
            match vote {
                Some(vote) => {
                    tables.votes.insert(key, vote);
                }
                None => {
                    tables.votes.remove(&key);
                }
            }
        }
        for (id, value) in counters {
            if let Some(rating) = tables.ratings.get_mut(&id) {
                rating.counters = value;
            }
        }
        Ok(())
    }
}

struct MemoryTransaction<'a> {
    tables: &'a Tables,
    votes: HashMap<(UserId, RatingId), Option<Vote>>,
    counters: HashMap<RatingId, VoteCounters>,
}

impl Transaction for MemoryTransaction<'_> {
    fn rating(&self, id: RatingId) -> StoreResult<Rating> {
        let mut rating = self.tables.rating(id)?.clone();
        if let Some(counters) = self.counters.get(&id) {
            rating.counters = *counters;
        }
        Ok(rating)
    }

    fn vote(&self, voter: UserId, rating: RatingId) -> StoreResult<Option<Vote>> {
        let key = (voter, rating);
        match self.votes.get(&key) {
            Some(staged) => Ok(staged.clone()),
            None => Ok(self.tables.votes.get(&key).cloned()),
        }
    }

    fn put_vote(&mut self, vote: Vote) -> StoreResult<()> {
        self.tables.rating(vote.rating_id)?;
        self.votes.insert((vote.voter_id, vote.rating_id), Some(vote));
        Ok(())
    }

    fn delete_vote(&mut self, voter: UserId, rating: RatingId) -> StoreResult<()> {
        self.votes.insert((voter, rating), None);
        Ok(())
    }

    fn set_vote_counters(&mut self, rating: RatingId, counters: VoteCounters) -> StoreResult<()> {
        self.tables.rating(rating)?;
        self.counters.insert(rating, counters);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::with_transaction;
    use rank_core::VoteDirection;

    fn seeded() -> (MemoryStore, User, Rating) {
        let store = MemoryStore::new();
        let user = User::new("ada", TrustScore::NEUTRAL);
        let item = Item::new("Dune");
        let score = ScoreRange::default().check(9).expect("score");
        let rating = Rating::new(item.id, user.id, score, None, user.trust);
        store.insert_user(user.clone()).expect("user");
        store.insert_item(item).expect("item");
        store.insert_rating(rating.clone()).expect("rating");
        (store, user, rating)
    }

    #[test]
    fn test_insert_and_get() {
        let (store, user, rating) = seeded();
        assert_eq!(store.get_user(user.id).expect("get").username, "ada");
        assert_eq!(store.get_rating(rating.id).expect("get"), rating);
        assert_eq!(store.ratings_by_author(user.id).expect("list").len(), 1);
        assert_eq!(store.ratings_for_item(rating.item_id).expect("list").len(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (store, user, _) = seeded();
        let err = store.insert_user(user).unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { kind: "user", .. }));
    }

    #[test]
    fn test_rating_requires_item() {
        let store = MemoryStore::new();
        let score = ScoreRange::default().check(5).expect("score");
        let rating = Rating::new(ItemId::new(), UserId::new(), score, None, TrustScore::NEUTRAL);
        let err = store.insert_rating(rating).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "item", .. }));
    }

    #[test]
    fn test_update_user_trust_is_read_modify_write() {
        let (store, user, _) = seeded();
        let after = store
            .update_user_trust(user.id, &mut |t| {
                rank_core::TrustBounds::default().apply(t, 0.25)
            })
            .expect("update");
        assert!((after.value() - 1.25).abs() < 1e-12);
        assert_eq!(store.get_user(user.id).expect("get").trust, after);
    }

    #[test]
    fn test_transaction_commits_on_ok() {
        let (store, user, rating) = seeded();
        with_transaction(&store, |tx| {
            tx.put_vote(Vote::new(user.id, rating.id, VoteDirection::Up))?;
            tx.set_vote_counters(rating.id, VoteCounters::new(1, 0))?;
            assert_eq!(tx.rating(rating.id)?.counters.upvotes, 1);
            assert!(tx.vote(user.id, rating.id)?.is_some());
            Ok(())
        })
        .expect("commit");

        assert_eq!(store.get_rating(rating.id).expect("get").counters.upvotes, 1);
        assert!(store.get_vote(user.id, rating.id).expect("vote").is_some());
    }

    #[test]
    fn test_transaction_discards_on_err() {
        let (store, user, rating) = seeded();
        let result: StoreResult<()> = with_transaction(&store, |tx| {
            tx.put_vote(Vote::new(user.id, rating.id, VoteDirection::Up))?;
            tx.set_vote_counters(rating.id, VoteCounters::new(1, 0))?;
            Err(StoreError::Conflict("abort".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.get_rating(rating.id).expect("get").counters, VoteCounters::default());
        assert!(store.get_vote(user.id, rating.id).expect("vote").is_none());
    }

    #[test]
    fn test_delete_vote_inside_transaction() {
        let (store, user, rating) = seeded();
        with_transaction(&store, |tx| tx.put_vote(Vote::new(user.id, rating.id, VoteDirection::Down)))
            .expect("put");
        with_transaction(&store, |tx| {
            tx.delete_vote(user.id, rating.id)?;
            assert!(tx.vote(user.id, rating.id)?.is_none());
            Ok(())
        })
        .expect("delete");
        assert!(store.get_vote(user.id, rating.id).expect("vote").is_none());
    }

    #[test]
    fn test_snapshot_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("state").join("novelrank.json");
        let (store, user, rating) = seeded();
        with_transaction(&store, |tx| {
            tx.put_vote(Vote::new(user.id, rating.id, VoteDirection::Up))?;
            tx.set_vote_counters(rating.id, VoteCounters::new(1, 0))
        })
        .expect("vote");

        store.save_snapshot(&path).expect("save");
        let loaded = MemoryStore::load_snapshot(&path).expect("load");
        assert_eq!(loaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_missing_snapshot_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = MemoryStore::load_snapshot(&dir.path().join("absent.json")).expect("load");
        assert!(store.list_users().expect("users").is_empty());
    }

    #[test]
    fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        fs::write(&path, "{ not json").expect("write");
        let err = MemoryStore::load_snapshot(&path).unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));
    }

    #[test]
    fn test_snapshot_rejects_dangling_rating() {
        let score = ScoreRange::default().check(5).expect("score");
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            ratings: vec![Rating::new(ItemId::new(), UserId::new(), score, None, TrustScore::NEUTRAL)],
            ..Snapshot::default()
        };
        assert!(matches!(
            MemoryStore::from_snapshot(snapshot),
            Err(StoreError::Conflict(_))
        ));
    }

    fn edited_snapshot(edit: impl FnOnce(&mut serde_json::Value)) -> MemoryStore {
        let (store, _, _) = seeded();
        let mut json = serde_json::to_value(store.snapshot()).expect("to json");
        edit(&mut json);
        let snapshot: Snapshot = serde_json::from_value(json).expect("from json");
        MemoryStore::from_snapshot(snapshot).expect("load")
    }

    #[test]
    fn test_check_ranges_accepts_engine_written_state() {
        let (store, _, _) = seeded();
        store
            .check_ranges(&TrustBounds::default(), &ScoreRange::default())
            .expect("in range");
    }

    #[test]
    fn test_check_ranges_rejects_out_of_bounds_trust() {
        let store = edited_snapshot(|json| json["users"][0]["trust"] = serde_json::json!(7.5));
        assert_eq!(store.snapshot().users[0].trust.value(), 7.5);

        let err = store
            .check_ranges(&TrustBounds::default(), &ScoreRange::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(ref msg) if msg.contains("7.5")));
    }

    #[test]
    fn test_check_ranges_rejects_out_of_range_score() {
        let store = edited_snapshot(|json| json["ratings"][0]["score"] = serde_json::json!(42));
        let err = store
            .check_ranges(&TrustBounds::default(), &ScoreRange::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::Snapshot(_)));

        let narrow = ScoreRange { min: 1, max: 5 };
        let (store, _, _) = seeded();
        assert!(store.check_ranges(&TrustBounds::default(), &narrow).is_err());
    }
}
