//! Conflict resolution between messages on the same follow pair
//!
//! The store keeps at most one message per `(fid, target)` pair, so an
//! incoming add or remove may conflict with one already stored. The
//! winner is decided by a total order on conflicting messages:
//!
//! 1. Timestamp (ascending) - later messages win
//! 2. Hash (byte order) - tiebreak for equal timestamps
//! 3. Type - a remove outranks an add on an exact timestamp-hash tie
//!
//! The result is last-write-wins per pair with a remove-wins tiebreak
//! on exact ts_hash equality. The resolver is pure and never errors;
//! the store turns its decision into a commit or a no-op.

use hubdb_core::{Message, MessageType};
use std::cmp::Ordering;

/// The resolver's decision for an incoming message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Nothing is stored for the pair; install the incoming message
    NoConflict,
    /// The incoming message outranks the stored one; supersede it
    IncomingWins,
    /// The stored message outranks the incoming one; drop the incoming
    /// message as an idempotent no-op
    ExistingWins,
    /// The incoming message is the stored message; no-op, no event
    Duplicate,
}

fn type_rank(message_type: MessageType) -> u8 {
    if message_type.is_remove() {
        2
    } else {
        1
    }
}

/// Compares two conflicting messages in the store's total order
pub fn compare(a: &Message, b: &Message) -> Ordering {
    a.timestamp()
        .cmp(&b.timestamp())
        .then_with(|| a.hash.cmp(&b.hash))
        .then_with(|| type_rank(a.message_type()).cmp(&type_rank(b.message_type())))
}

/// Decides the outcome of merging `incoming` against what is stored
pub fn resolve(incoming: &Message, existing: Option<&Message>) -> MergeOutcome {
    let existing = match existing {
        Some(existing) => existing,
        None => return MergeOutcome::NoConflict,
    };
    match compare(incoming, existing) {
        Ordering::Greater => MergeOutcome::IncomingWins,
        Ordering::Less => MergeOutcome::ExistingWins,
        Ordering::Equal => MergeOutcome::Duplicate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdb_core::{Fid, FollowBody, MessageBody, MessageData, MessageHash, HASH_LENGTH};

    fn follow(message_type: MessageType, timestamp: u32, hash: MessageHash) -> Message {
        Message {
            data: MessageData {
                fid: Fid::from_slice(b"alice").unwrap(),
                timestamp,
                message_type,
                body: MessageBody::Follow(FollowBody {
                    user: Fid::from_slice(b"bob").unwrap(),
                }),
            },
            hash,
        }
    }

    #[test]
    fn test_no_existing_message_accepts() {
        let add = follow(MessageType::FollowAdd, 100, [1; HASH_LENGTH]);
        assert_eq!(resolve(&add, None), MergeOutcome::NoConflict);
    }

    #[test]
    fn test_later_timestamp_wins() {
        let old = follow(MessageType::FollowAdd, 100, [0xff; HASH_LENGTH]);
        let new = follow(MessageType::FollowAdd, 101, [0x00; HASH_LENGTH]);

        assert_eq!(resolve(&new, Some(&old)), MergeOutcome::IncomingWins);
        assert_eq!(resolve(&old, Some(&new)), MergeOutcome::ExistingWins);
    }

    #[test]
    fn test_hash_breaks_timestamp_tie() {
        let small = follow(MessageType::FollowAdd, 100, [0x01; HASH_LENGTH]);
        let large = follow(MessageType::FollowAdd, 100, [0x02; HASH_LENGTH]);

        assert_eq!(resolve(&large, Some(&small)), MergeOutcome::IncomingWins);
        assert_eq!(resolve(&small, Some(&large)), MergeOutcome::ExistingWins);
    }

    #[test]
    fn test_cross_type_follows_timestamp_order() {
        // A remove has no categorical advantage: a later add beats an
        // earlier remove.
        let remove = follow(MessageType::FollowRemove, 100, [9; HASH_LENGTH]);
        let add = follow(MessageType::FollowAdd, 101, [1; HASH_LENGTH]);

        assert_eq!(resolve(&add, Some(&remove)), MergeOutcome::IncomingWins);
        assert_eq!(resolve(&remove, Some(&add)), MergeOutcome::ExistingWins);
    }

    #[test]
    fn test_remove_wins_exact_ts_hash_tie() {
        let add = follow(MessageType::FollowAdd, 100, [7; HASH_LENGTH]);
        let remove = follow(MessageType::FollowRemove, 100, [7; HASH_LENGTH]);

        assert_eq!(resolve(&remove, Some(&add)), MergeOutcome::IncomingWins);
        assert_eq!(resolve(&add, Some(&remove)), MergeOutcome::ExistingWins);
    }

    #[test]
    fn test_identical_message_is_duplicate() {
        let add = follow(MessageType::FollowAdd, 100, [7; HASH_LENGTH]);
        assert_eq!(resolve(&add, Some(&add.clone())), MergeOutcome::Duplicate);
    }
}
