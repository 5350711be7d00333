//! Persistence boundary for [`Observation`]s.
//!
//! A store instance holds exactly one run. Workers append to it concurrently
//! while the engine runs; reporters and exporters read it only after the
//! engine has returned.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::observation::Observation;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("corrupt record {id}: {reason}")]
    Corrupt { id: i64, reason: String },
}

/// Append-only storage with a full-scan query.
///
/// `append` must be atomic per record under concurrent callers: no lost
/// writes and no partially visible records.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append(&self, observation: Observation) -> Result<(), StoreError>;

    /// Every observation of the run, in insertion order.
    async fn query_all(&self) -> Result<Vec<Observation>, StoreError>;
}
