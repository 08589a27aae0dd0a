//! Store abstractions consumed by the engine.

use rank_core::{
    Item, ItemId, ItemScore, Rating, RatingId, TrustScore, User, UserId, Vote, VoteCounters,
};

use crate::error::{StoreError, StoreResult};

/// Operations available inside a multi-record transaction.
///
/// Reads observe writes staged earlier in the same transaction. Nothing is
/// visible to other callers until the transaction body returns `Ok`.
pub trait Transaction {
    /// Read a rating.
    fn rating(&self, id: RatingId) -> StoreResult<Rating>;

    /// Read the vote a user holds on a rating, if any.
    fn vote(&self, voter: UserId, rating: RatingId) -> StoreResult<Option<Vote>>;

    /// Insert or replace a vote.
    fn put_vote(&mut self, vote: Vote) -> StoreResult<()>;

    /// Remove a vote. Removing an absent vote is a no-op.
    fn delete_vote(&mut self, voter: UserId, rating: RatingId) -> StoreResult<()>;

    /// Overwrite a rating's vote counters.
    fn set_vote_counters(&mut self, rating: RatingId, counters: VoteCounters) -> StoreResult<()>;
}

/// Transactional record store for users, items, ratings and votes.
///
/// Single-record updates are atomic per record and last-write-wins.
pub trait RecordStore: Send + Sync {
    /// Insert a new user.
    fn insert_user(&self, user: User) -> StoreResult<()>;

    /// Read a user.
    fn get_user(&self, id: UserId) -> StoreResult<User>;

    /// All users.
    fn list_users(&self) -> StoreResult<Vec<User>>;

    /// Atomically read-modify-write a user's trust. Returns the stored value.
    fn update_user_trust(
        &self,
        id: UserId,
        update: &mut dyn FnMut(TrustScore) -> TrustScore,
    ) -> StoreResult<TrustScore>;

    /// Overwrite a user's trust.
    fn set_user_trust(&self, id: UserId, trust: TrustScore) -> StoreResult<()>;

    /// Insert a new item.
    fn insert_item(&self, item: Item) -> StoreResult<()>;

    /// Read an item.
    fn get_item(&self, id: ItemId) -> StoreResult<Item>;

    /// All items.
    fn list_items(&self) -> StoreResult<Vec<Item>>;

    /// Overwrite an item's denormalized score.
    fn update_item_score(&self, id: ItemId, score: ItemScore) -> StoreResult<()>;

    /// Insert a new rating. The referenced item must exist.
    fn insert_rating(&self, rating: Rating) -> StoreResult<()>;

    /// Read a rating.
    fn get_rating(&self, id: RatingId) -> StoreResult<Rating>;

    /// Ratings of an item, oldest first.
    fn ratings_for_item(&self, id: ItemId) -> StoreResult<Vec<Rating>>;

    /// Ratings written by a user, oldest first.
    fn ratings_by_author(&self, id: UserId) -> StoreResult<Vec<Rating>>;

    /// Store a freshly computed weight and the author trust it used.
    fn update_rating_weight(&self, id: RatingId, weight: f64, author_trust: f64)
    -> StoreResult<()>;

    /// Read the vote a user holds on a rating, if any.
    fn get_vote(&self, voter: UserId, rating: RatingId) -> StoreResult<Option<Vote>>;

    /// Run `body` as one serializable transaction.
    ///
    /// Staged writes are applied only if `body` returns `Ok`; an `Err` is
    /// returned unchanged and leaves the store untouched.
    fn transaction(
        &self,
        body: &mut dyn FnMut(&mut dyn Transaction) -> StoreResult<()>,
    ) -> StoreResult<()>;
}

/// Run a value-returning closure as a transaction on `store`.
pub fn with_transaction<S, T, F>(store: &S, body: F) -> StoreResult<T>
where
    S: RecordStore + ?Sized,
    F: FnOnce(&mut dyn Transaction) -> StoreResult<T>,
{
    let mut body = Some(body);
    let mut output = None;
    store.transaction(&mut |tx| {
        let run = body
            .take()
            .ok_or_else(|| StoreError::Conflict("transaction body ran twice".to_string()))?;
        output = Some(run(tx)?);
        Ok(())
    })?;
    output.ok_or_else(|| StoreError::Conflict("transaction produced no result".to_string()))
}
