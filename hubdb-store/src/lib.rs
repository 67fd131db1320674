//! Store layer for HubDB
//!
//! This crate implements the hub's per-message-type stores over an
//! embedded ordered key-value engine, starting with the follow store:
//!
//! - **Key codec**: composite keys whose lexicographic order answers
//!   the stores' range queries without auxiliary structures
//! - **Blob store**: CRC-framed message bytes under content-derived keys
//! - **Resolver**: deterministic last-write-wins conflict resolution
//! - **FollowStore**: merge, pair lookups, inverse lookup, pruning
//! - **Event bus**: synchronous post-commit change notification
//!
//! # Architecture
//!
//! ```text
//! Merge Path:
//! Message -> validate -> pair-index lookups -> resolve -> atomic batch -> events
//!
//! Read Path:
//! pair index / by-target index -> ts_hash -> primary blob -> Message
//! ```
//!
//! # Example
//!
//! ```
//! use hubdb_core::{Fid, FollowBody, Message, MessageBody, MessageData, MessageType};
//! use hubdb_store::{db::MemoryDb, EventBus, FollowStore, StoreOptions};
//! use std::sync::Arc;
//!
//! let store = FollowStore::new(
//!     Arc::new(MemoryDb::new()),
//!     Arc::new(EventBus::new()),
//!     StoreOptions::default(),
//! );
//!
//! let alice = Fid::new(b"alice".to_vec()).unwrap();
//! let bob = Fid::new(b"bob".to_vec()).unwrap();
//! let add = Message {
//!     data: MessageData {
//!         fid: alice.clone(),
//!         timestamp: 100,
//!         message_type: MessageType::FollowAdd,
//!         body: MessageBody::Follow(FollowBody { user: bob.clone() }),
//!     },
//!     hash: [7; 20],
//! };
//!
//! store.merge(&add).unwrap();
//! assert_eq!(store.get_follows_by_user(&alice).unwrap(), vec![add]);
//! # assert!(store.get_follow_remove(&alice, &bob).is_err());
//! ```

pub mod blob;
pub mod config;
pub mod db;
pub mod events;
pub mod follow_store;
pub mod keys;
pub mod resolver;

pub use config::{StoreOptions, DEFAULT_PRUNE_SIZE_LIMIT};
pub use events::{EventBus, EventKind, StoreEvent};
pub use follow_store::FollowStore;
pub use resolver::MergeOutcome;
