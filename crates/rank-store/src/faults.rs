//! Fault injection for exercising degraded paths.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rank_core::{
    Item, ItemId, ItemScore, Rating, RatingId, TrustScore, User, UserId, Vote,
};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{RecordStore, Transaction};

/// Class of store operation a fault applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    /// User reads (`get_user`, `list_users`), which is where trust is read.
    UserReads,
    /// Item, rating and vote reads.
    Reads,
    /// Single-record inserts and updates.
    Writes,
    /// Multi-record transactions.
    Transactions,
}

impl FaultKind {
    const fn index(self) -> usize {
        match self {
            Self::UserReads => 0,
            Self::Reads => 1,
            Self::Writes => 2,
            Self::Transactions => 3,
        }
    }
}

/// Wraps a store and fails selected operation classes with
/// [`StoreError::Unavailable`].
#[derive(Debug, Default)]
pub struct FaultyStore<S> {
    inner: S,
    armed: [AtomicBool; 4],
    injected: AtomicU64,
}

impl<S: RecordStore> FaultyStore<S> {
    /// Wrap a store with no faults armed.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            armed: Default::default(),
            injected: AtomicU64::new(0),
        }
    }

    /// Start failing operations of `kind`.
    pub fn fail(&self, kind: FaultKind) {
        self.armed[kind.index()].store(true, Ordering::SeqCst);
    }

    /// Stop failing operations of `kind`.
    pub fn heal(&self, kind: FaultKind) {
        self.armed[kind.index()].store(false, Ordering::SeqCst);
    }

    /// Stop failing everything.
    pub fn heal_all(&self) {
        for flag in &self.armed {
            flag.store(false, Ordering::SeqCst);
        }
    }

    /// Number of failures injected so far.
    pub fn injected(&self) -> u64 {
        self.injected.load(Ordering::SeqCst)
    }

    /// The wrapped store.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self, kind: FaultKind, op: &'static str) -> StoreResult<()> {
        if self.armed[kind.index()].load(Ordering::SeqCst) {
            self.injected.fetch_add(1, Ordering::SeqCst);
            debug!(op, ?kind, "Injecting store fault");
            return Err(StoreError::Unavailable(format!("injected fault in {op}")));
        }
        Ok(())
    }
}

impl<S: RecordStore> RecordStore for FaultyStore<S> {
    fn insert_user(&self, user: User) -> StoreResult<()> {
        self.check(FaultKind::Writes, "insert_user")?;
        self.inner.insert_user(user)
    }

    fn get_user(&self, id: UserId) -> StoreResult<User> {
        self.check(FaultKind::UserReads, "get_user")?;
        self.inner.get_user(id)
    }

    fn list_users(&self) -> StoreResult<Vec<User>> {
        self.check(FaultKind::UserReads, "list_users")?;
        self.inner.list_users()
    }

    fn update_user_trust(
        &self,
        id: UserId,
        update: &mut dyn FnMut(TrustScore) -> TrustScore,
    ) -> StoreResult<TrustScore> {
        self.check(FaultKind::Writes, "update_user_trust")?;
        self.inner.update_user_trust(id, update)
    }

    fn set_user_trust(&self, id: UserId, trust: TrustScore) -> StoreResult<()> {
        self.check(FaultKind::Writes, "set_user_trust")?;
        self.inner.set_user_trust(id, trust)
    }

    fn insert_item(&self, item: Item) -> StoreResult<()> {
        self.check(FaultKind::Writes, "insert_item")?;
        self.inner.insert_item(item)
    }

    fn get_item(&self, id: ItemId) -> StoreResult<Item> {
        self.check(FaultKind::Reads, "get_item")?;
        self.inner.get_item(id)
    }

    fn list_items(&self) -> StoreResult<Vec<Item>> {
        self.check(FaultKind::Reads, "list_items")?;
        self.inner.list_items()
    }

    fn update_item_score(&self, id: ItemId, score: ItemScore) -> StoreResult<()> {
        self.check(FaultKind::Writes, "update_item_score")?;
        self.inner.update_item_score(id, score)
    }

    fn insert_rating(&self, rating: Rating) -> StoreResult<()> {
        self.check(FaultKind::Writes, "insert_rating")?;
        self.inner.insert_rating(rating)
    }

    fn get_rating(&self, id: RatingId) -> StoreResult<Rating> {
        self.check(FaultKind::Reads, "get_rating")?;
        self.inner.get_rating(id)
    }

    fn ratings_for_item(&self, id: ItemId) -> StoreResult<Vec<Rating>> {
        self.check(FaultKind::Reads, "ratings_for_item")?;
        self.inner.ratings_for_item(id)
    }

    fn ratings_by_author(&self, id: UserId) -> StoreResult<Vec<Rating>> {
        self.check(FaultKind::Reads, "ratings_by_author")?;
        self.inner.ratings_by_author(id)
    }

    fn update_rating_weight(
        &self,
        id: RatingId,
        weight: f64,
        author_trust: f64,
    ) -> StoreResult<()> {
        self.check(FaultKind::Writes, "update_rating_weight")?;
        self.inner.update_rating_weight(id, weight, author_trust)
    }

    fn get_vote(&self, voter: UserId, rating: RatingId) -> StoreResult<Option<Vote>> {
        self.check(FaultKind::Reads, "get_vote")?;
        self.inner.get_vote(voter, rating)
    }

    fn transaction(
        &self,
        body: &mut dyn FnMut(&mut dyn Transaction) -> StoreResult<()>,
    ) -> StoreResult<()> {
        self.check(FaultKind::Transactions, "transaction")?;
        self.inner.transaction(body)
    }
}
