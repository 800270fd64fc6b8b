//! Key-value persistence collaborators
//!
//! The vocabulary core treats persistence as synchronous text storage
//! behind [`KeyValueStorage`]; anything that can hold a string under a
//! key can back the store. Transport failures surface as
//! [`StorageError`] and propagate untouched through the core.

mod file_storage;
mod memory;

pub use file_storage::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Synchronous text storage keyed by string.
pub trait KeyValueStorage {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}
