//! Tasklane Storage Layer
//!
//! Key-value persistence for client state. Two backends share one trait:
//! a durable SQLite store and an in-memory store scoped to the process.

mod database;
mod error;
mod memory;
mod migrations;

pub use database::Database;
pub use error::StorageError;
pub use memory::MemoryStore;

pub type Result<T> = std::result::Result<T, StorageError>;

/// String-keyed storage with get/set/remove semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Write several keys. Backends that can apply them atomically do so.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}
