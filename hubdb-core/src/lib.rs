//! Core types and traits for HubDB
//!
//! This crate contains the vocabulary shared by every per-message-type
//! store in a HubDB hub:
//!
//! - Common error types with [`Error`] and [`Result`]
//! - The message envelope: [`Message`], [`MessageData`], [`MessageBody`]
//! - Identity types like [`Fid`] and [`TsHash`]
//! - Farcaster-time helpers in [`time`]
//!
//! # Example
//!
//! ```
//! use hubdb_core::{Fid, TsHash, HASH_LENGTH};
//!
//! let fid = Fid::new(b"alice".to_vec()).unwrap();
//! let ts_hash = TsHash::new(100, &[7; HASH_LENGTH]);
//! assert_eq!(ts_hash.timestamp(), 100);
//! ```

pub mod error;
pub mod time;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
