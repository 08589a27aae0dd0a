//! # rank-store
//!
//! Record storage for the novelrank engine.
//!
//! - [`RecordStore`] / [`Transaction`] — the storage contract the engine relies on
//! - [`MemoryStore`] — in-memory implementation with JSON snapshots
//! - [`FaultyStore`] — wrapper that injects unavailability for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod faults;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use faults::{FaultKind, FaultyStore};
pub use memory::{MemoryStore, Snapshot, SNAPSHOT_VERSION};
pub use traits::{with_transaction, RecordStore, Transaction};
