//! Group board: encoded posts, nested comments and their mutation protocol.
//!
//! The store talks to persistence and identity only through the traits
//! below, so the SQLite repository can be swapped for a remote record store.

mod board;
mod codec;
mod store;

pub use board::*;
pub use codec::*;
pub use store::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::{Actor, GroupRecord, ThreadUpdate};

/// Whole-record access to groups.
#[async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_group(&self, id: &str) -> Result<Option<GroupRecord>, AppError>;

    /// Overwrite whichever of `posts` / `comments` is set, in one write.
    async fn update_threads(&self, id: &str, update: ThreadUpdate) -> Result<(), AppError>;
}

/// Resolves the acting user.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn resolve_actor(&self, id: &str) -> Result<Option<Actor>, AppError>;
}
