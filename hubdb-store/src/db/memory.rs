//! In-memory ordered key-value engine
//!
//! A [`Database`] implementation over a `BTreeMap` guarded by a
//! read-write lock. Batches take the write lock for their whole
//! duration, which gives the atomicity the stores assume of the
//! engine. Used by the test suites and by embedders that do not need
//! persistence.

use super::{Batch, BatchOp, Database};
use hubdb_core::Result;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;

/// An ordered in-memory key-value engine
#[derive(Default)]
pub struct MemoryDb {
    tree: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDb {
    /// Creates an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries
    pub fn len(&self) -> usize {
        self.tree.read().len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.tree.read().is_empty()
    }
}

impl Database for MemoryDb {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        Ok(self.tree.read().get(key).cloned())
    }

    fn commit(&self, batch: Batch) -> Result<()> {
        let mut tree = self.tree.write();
        for op in batch.into_ops() {
            match op {
                BatchOp::Put { key, value } => {
                    tree.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    tree.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn prefix_scan(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let tree = self.tree.read();
        let entries = tree
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        Ok(entries)
    }
}
