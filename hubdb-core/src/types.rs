//! Core types shared by all HubDB message stores
//!
//! This module contains the message envelope and identifier types that
//! every per-message-type store operates on. Messages are immutable:
//! once constructed they are merged, superseded, or pruned, never
//! mutated.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds since the Farcaster epoch (2021-01-01T00:00:00Z)
pub type Timestamp = u32;

/// Fixed-width message hash, treated as an opaque byte string
pub type MessageHash = [u8; HASH_LENGTH];

/// Width of a message hash in bytes
pub const HASH_LENGTH: usize = 20;

/// Width of a timestamp-hash in bytes (4-byte timestamp plus hash)
pub const TS_HASH_LENGTH: usize = 4 + HASH_LENGTH;

/// A user identifier: an opaque, non-empty byte string of at most
/// [`Fid::MAX_LENGTH`] bytes
///
/// Fids order lexicographically by their raw bytes. Their encoded form
/// inside composite keys orders by `(length, bytes)` instead; see the
/// key codec in `hubdb-store` for the exact layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fid(Vec<u8>);

impl Fid {
    /// Maximum length of a fid in bytes
    pub const MAX_LENGTH: usize = 32;

    /// Creates a fid from raw bytes
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] if the bytes are empty or longer
    /// than [`Fid::MAX_LENGTH`].
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::BadRequest("fid must not be empty".to_string()));
        }
        if bytes.len() > Self::MAX_LENGTH {
            return Err(Error::BadRequest(format!(
                "fid exceeds {} bytes: {}",
                Self::MAX_LENGTH,
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    /// Creates a fid from a byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes.to_vec())
    }

    /// Returns the raw fid bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Returns the fid length in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: empty fids cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// A message identity key that sorts chronologically
///
/// Concatenation of the big-endian 4-byte timestamp and the fixed-width
/// message hash. Byte-lexicographic comparison therefore orders by
/// timestamp first, with the hash as tiebreak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TsHash([u8; TS_HASH_LENGTH]);

impl TsHash {
    /// Builds the timestamp-hash for the given timestamp and hash
    pub fn new(timestamp: Timestamp, hash: &MessageHash) -> Self {
        let mut bytes = [0u8; TS_HASH_LENGTH];
        bytes[..4].copy_from_slice(&timestamp.to_be_bytes());
        bytes[4..].copy_from_slice(hash);
        Self(bytes)
    }

    /// Reconstructs a timestamp-hash from its encoded form
    ///
    /// # Errors
    ///
    /// Returns [`Error::Corruption`] if the slice is not exactly
    /// [`TS_HASH_LENGTH`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != TS_HASH_LENGTH {
            return Err(Error::Corruption(format!(
                "ts_hash must be {} bytes, got {}",
                TS_HASH_LENGTH,
                bytes.len()
            )));
        }
        let mut buf = [0u8; TS_HASH_LENGTH];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Returns the timestamp component
    pub fn timestamp(&self) -> Timestamp {
        let mut buf = [0u8; 4];
        buf.copy_from_slice(&self.0[..4]);
        Timestamp::from_be_bytes(buf)
    }

    /// Returns the hash component
    pub fn hash(&self) -> MessageHash {
        let mut buf = [0u8; HASH_LENGTH];
        buf.copy_from_slice(&self.0[4..]);
        buf
    }

    /// Returns the encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// The type of a hub message
///
/// Each add/remove pair belongs to one per-type store; a store rejects
/// every type it does not own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    /// Publish or re-publish a cast
    CastAdd,
    /// Retract a previously published cast
    CastRemove,
    /// Follow a target user
    FollowAdd,
    /// Retract a follow of a target user
    FollowRemove,
}

impl MessageType {
    /// True for the remove half of an add/remove pair
    pub fn is_remove(&self) -> bool {
        matches!(self, MessageType::CastRemove | MessageType::FollowRemove)
    }
}

/// Body of a follow add or remove message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowBody {
    /// The target of the follow relationship
    pub user: Fid,
}

/// Body of a cast message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastBody {
    /// The cast text
    pub text: String,
}

/// Typed message payload, dispatched on by each store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageBody {
    /// Payload of follow add/remove messages
    Follow(FollowBody),
    /// Payload of cast add/remove messages
    Cast(CastBody),
}

/// The signed fields of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageData {
    /// The author of the message
    pub fid: Fid,
    /// Seconds since the Farcaster epoch
    pub timestamp: Timestamp,
    /// The message type tag
    pub message_type: MessageType,
    /// The typed payload
    pub body: MessageBody,
}

/// An immutable hub message
///
/// The envelope format and signature validation live outside the
/// stores; here the hash is an opaque, already-verified byte string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// The message fields
    pub data: MessageData,
    /// The message hash
    pub hash: MessageHash,
}

impl Message {
    /// Returns the author fid
    pub fn fid(&self) -> &Fid {
        &self.data.fid
    }

    /// Returns the message timestamp
    pub fn timestamp(&self) -> Timestamp {
        self.data.timestamp
    }

    /// Returns the message type tag
    pub fn message_type(&self) -> MessageType {
        self.data.message_type
    }

    /// Returns the chronologically sortable identity key
    pub fn ts_hash(&self) -> TsHash {
        TsHash::new(self.data.timestamp, &self.hash)
    }

    /// Returns the follow target, if this is a follow message
    pub fn follow_target(&self) -> Option<&Fid> {
        match &self.data.body {
            MessageBody::Follow(body) => Some(&body.user),
            _ => None,
        }
    }
}
