//! Storage primitives for fork-yeah
//!
//! This crate provides:
//! - Fork id generation (BLAKE3 over parent + clock)
//! - ISO-8601 timestamps
//! - On-disk layout and atomic (temp file + rename) writes
//! - Per-fork advisory locks

pub mod hash;
pub mod lock;
pub mod store;
pub mod time;

// Re-exports
pub use hash::{fork_id_at, generate_fork_id, hash_bytes, Blake3Hash, FORK_ID_LEN};
pub use lock::{prune_locks, ForkLock};
pub use store::{atomic_write, validate_fork_id, InvalidForkId, Layout, StagedWrite};
pub use time::now_iso;
