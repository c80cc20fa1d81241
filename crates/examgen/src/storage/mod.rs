//! Durable key-value storage for the client profile.
//!
//! One JSON object file holds every persisted key: the bearer token, the
//! anonymous job-history snapshot, the selected job id, and the pending
//! payment marker used across the external-checkout round trip.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::StorageError;

/// Persisted key for the bearer token.
pub const KEY_ACCESS_TOKEN: &str = "access_token";
/// Persisted key for the anonymous job-history snapshot (JSON array).
pub const KEY_JOB_SNAPSHOT: &str = "exam_jobs";
/// Persisted key for the currently selected job id.
pub const KEY_SELECTED_JOB: &str = "selected_job_id";
/// Persisted key for the single pending-payment job id.
pub const KEY_PENDING_UNLOCK: &str = "pending_unlock_job_id";

/// Durable string-to-string storage. Writes are last-write-wins; cross-process
/// races on a shared profile are an accepted limitation of the client.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}
