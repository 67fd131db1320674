//! Key-value engine contract
//!
//! The stores are written against an embedded ordered key-value engine
//! that they do not own. [`Database`] captures the three capabilities
//! the stores need: point reads, atomic multi-key batches, and ordered
//! prefix scans. Any engine with these properties can back a hub; the
//! crate ships [`MemoryDb`] as a reference implementation.
//!
//! Engine implementations report their own failures as
//! [`Error::Unavailable`](hubdb_core::Error::Unavailable); the stores
//! propagate those errors untouched.

use hubdb_core::Result;

pub mod memory;

pub use memory::MemoryDb;

/// A single write operation inside a [`Batch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or replace the value under `key`
    Put {
        /// The key to write
        key: Vec<u8>,
        /// The value to store
        value: Vec<u8>,
    },
    /// Remove `key` if present
    Delete {
        /// The key to remove
        key: Vec<u8>,
    },
}

/// An ordered list of write operations applied atomically
///
/// Operations are applied in insertion order, so a delete followed by a
/// put of the same key leaves the put in place.
#[derive(Debug, Default)]
pub struct Batch {
    ops: Vec<BatchOp>,
}

impl Batch {
    /// Creates an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a put operation
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.ops.push(BatchOp::Put { key, value });
    }

    /// Appends a delete operation
    pub fn delete(&mut self, key: Vec<u8>) {
        self.ops.push(BatchOp::Delete { key });
    }

    /// Returns the queued operations
    pub fn ops(&self) -> &[BatchOp] {
        &self.ops
    }

    /// Consumes the batch, yielding its operations
    pub fn into_ops(self) -> Vec<BatchOp> {
        self.ops
    }

    /// Returns the number of queued operations
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Returns true if no operations are queued
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// The ordered key-value engine consumed by the stores
pub trait Database: Send + Sync {
    /// Reads the value stored under `key`, or `None` if absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Applies all operations in `batch` atomically
    fn commit(&self, batch: Batch) -> Result<()>;

    /// Returns all entries whose key starts with `prefix`, in ascending
    /// key order
    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
