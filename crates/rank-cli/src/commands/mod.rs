//! CLI command implementations.
//!
//! Each submodule implements one command against an open [`Session`](crate::session::Session):
//! - [`user`] - register and list users
//! - [`item`] - add and list novels
//! - [`rating`] - rate novels and vote on ratings
//! - [`query`] - scores, trust and ranking
//! - [`reconcile`] - trust reconciliation
//! - [`seed`] - demo catalogue
//! - [`simulate`] - random voting traffic

pub mod item;
pub mod query;
pub mod rating;
pub mod reconcile;
pub mod seed;
pub mod simulate;
pub mod user;

pub use item::ItemCommand;
pub use query::QueryCommand;
pub use rating::RatingCommand;
pub use reconcile::ReconcileCommand;
pub use seed::SeedCommand;
pub use simulate::SimulateCommand;
pub use user::UserCommand;
