//! The follow store
//!
//! A per-user, conflict-free replicated set of follow relationships.
//! Each `(follower, target)` pair holds at most one live message, a
//! `FollowAdd` or a `FollowRemove`; concurrent operations on the same
//! pair are resolved deterministically by the [`resolver`](crate::resolver).
//!
//! Every merge maintains three key families in one atomic batch: the
//! primary message blob, the add/remove pair index for the pair, and
//! the inverse by-target index (adds only). The invariants held after
//! every commit:
//!
//! 1. At most one pair-index entry exists per `(fid, target)`.
//! 2. Every index entry points at an existing blob.
//! 3. Every blob has exactly one pair-index entry.
//! 4. A by-target entry exists iff the matching `FollowAdd` blob does.
//! 5. Values are never mutated in place; supersession deletes then puts
//!    inside the same batch.
//!
//! # Concurrency
//!
//! Callers serialize `merge` and `prune_messages` per fid; reads may
//! run concurrently with the single writer and see the engine's latest
//! committed state.

use crate::blob;
use crate::config::StoreOptions;
use crate::db::{Batch, Database};
use crate::events::{EventBus, StoreEvent};
use crate::keys::{self, UserPostfix};
use crate::resolver::{self, MergeOutcome};
use hubdb_core::{time, Error, Fid, Message, MessageType, Result, TsHash};
use log::debug;
use std::sync::Arc;

/// Conflict-free store of follow add/remove messages
pub struct FollowStore<D: Database> {
    db: Arc<D>,
    events: Arc<EventBus>,
    options: StoreOptions,
}

impl<D: Database> FollowStore<D> {
    /// Creates a store over the given engine and event bus
    pub fn new(db: Arc<D>, events: Arc<EventBus>, options: StoreOptions) -> Self {
        Self {
            db,
            events,
            options,
        }
    }

    /// Returns the store's event bus for subscriber registration
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Merges a follow message into the store
    ///
    /// Conflicts with the pair's stored message are resolved by the
    /// [`resolver`](crate::resolver); a losing or duplicate incoming
    /// message is a successful no-op. A winning merge commits one
    /// atomic batch that deletes the displaced message (blob, pair
    /// index, by-target entry) and installs the new one, then publishes
    /// a revoke event per displaced message followed by the merge
    /// event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BadRequest`] for message types the store does
    /// not own or a missing follow body, and propagates engine errors.
    pub fn merge(&self, message: &Message) -> Result<()> {
        let target = validate_follow_message(message)?;
        let conflicts = self.merge_conflicts(message.fid(), target)?;

        for existing in &conflicts {
            match resolver::resolve(message, Some(existing)) {
                MergeOutcome::ExistingWins | MergeOutcome::Duplicate => return Ok(()),
                MergeOutcome::IncomingWins | MergeOutcome::NoConflict => {}
            }
        }

        let mut batch = Batch::new();
        for existing in &conflicts {
            self.delete_message_ops(&mut batch, existing)?;
        }
        self.put_message_ops(&mut batch, message, target)?;
        self.db.commit(batch)?;

        for existing in conflicts {
            self.events.publish(&StoreEvent::RevokeMessage(existing));
        }
        self.events.publish(&StoreEvent::MergeMessage(message.clone()));
        Ok(())
    }

    /// Returns the live `FollowAdd` for `(fid, target)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the pair has no stored add.
    pub fn get_follow_add(&self, fid: &Fid, target: &Fid) -> Result<Message> {
        self.get_by_pair(fid, target, UserPostfix::FollowAdds)
    }

    /// Returns the live `FollowRemove` for `(fid, target)`
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the pair has no stored remove.
    pub fn get_follow_remove(&self, fid: &Fid, target: &Fid) -> Result<Message> {
        self.get_by_pair(fid, target, UserPostfix::FollowRemoves)
    }

    /// Returns all live adds authored by `fid`, in target order
    pub fn get_follows_by_user(&self, fid: &Fid) -> Result<Vec<Message>> {
        self.collect_pair_index(fid, UserPostfix::FollowAdds)
    }

    /// Returns all live removes authored by `fid`, in target order
    pub fn get_follow_removes_by_user(&self, fid: &Fid) -> Result<Vec<Message>> {
        self.collect_pair_index(fid, UserPostfix::FollowRemoves)
    }

    /// Returns all live adds targeting `target`, in follower order
    pub fn get_follows_by_target_user(&self, target: &Fid) -> Result<Vec<Message>> {
        let entries = self.db.prefix_scan(&keys::by_target_prefix(target))?;
        let mut messages = Vec::with_capacity(entries.len());
        for (key, _value) in entries {
            let (_target, fid, ts_hash) = keys::decode_by_target_key(&key)?;
            messages.push(blob::get_message(
                self.db.as_ref(),
                &fid,
                UserPostfix::FollowMessage,
                &ts_hash,
            )?);
        }
        Ok(messages)
    }

    /// Returns every follow message stored for `fid`, adds and removes,
    /// in ascending ts_hash order
    pub fn get_all_follow_messages_by_fid(&self, fid: &Fid) -> Result<Vec<Message>> {
        let entries = self
            .db
            .prefix_scan(&keys::message_prefix(fid, UserPostfix::FollowMessage))?;
        entries
            .iter()
            .map(|(_key, value)| blob::decode_message(value))
            .collect()
    }

    /// Evicts `fid`'s oldest messages until the size and age caps hold
    ///
    /// Walks the primary index in ascending ts_hash order. A message is
    /// evicted while it is older than `prune_time_limit` or while the
    /// remaining count exceeds `prune_size_limit`; the walk stops at
    /// the first retained message. Each eviction commits its own batch
    /// and publishes its prune event immediately, so evictions
    /// completed before a failure stay committed and notified.
    ///
    /// Returns the evicted messages in eviction order.
    pub fn prune_messages(&self, fid: &Fid) -> Result<Vec<Message>> {
        let now = time::farcaster_time()?;
        let entries = self
            .db
            .prefix_scan(&keys::message_prefix(fid, UserPostfix::FollowMessage))?;

        let mut remaining = entries.len();
        let mut pruned = Vec::new();
        for (_key, value) in entries {
            let message = blob::decode_message(&value)?;

            // A timestamp ahead of the clock is never stale.
            let stale = self
                .options
                .prune_time_limit
                .is_some_and(|limit| now.saturating_sub(message.timestamp()) > limit);
            let over_cap = remaining > self.options.prune_size_limit;
            if !stale && !over_cap {
                break;
            }

            let mut batch = Batch::new();
            self.delete_message_ops(&mut batch, &message)?;
            self.db.commit(batch)?;
            remaining -= 1;

            self.events.publish(&StoreEvent::PruneMessage(message.clone()));
            pruned.push(message);
        }

        if !pruned.is_empty() {
            debug!("pruned {} follow messages for fid {}", pruned.len(), fid);
        }
        Ok(pruned)
    }

    fn get_by_pair(&self, fid: &Fid, target: &Fid, postfix: UserPostfix) -> Result<Message> {
        let value = self
            .db
            .get(&keys::pair_key(fid, postfix, target))?
            .ok_or(Error::NotFound)?;
        let ts_hash = TsHash::from_slice(&value)?;
        blob::get_message(self.db.as_ref(), fid, UserPostfix::FollowMessage, &ts_hash)
    }

    fn collect_pair_index(&self, fid: &Fid, postfix: UserPostfix) -> Result<Vec<Message>> {
        let entries = self.db.prefix_scan(&keys::pair_prefix(fid, postfix))?;
        let mut messages = Vec::with_capacity(entries.len());
        for (_key, value) in entries {
            let ts_hash = TsHash::from_slice(&value)?;
            messages.push(blob::get_message(
                self.db.as_ref(),
                fid,
                UserPostfix::FollowMessage,
                &ts_hash,
            )?);
        }
        Ok(messages)
    }

    /// Loads the pair's stored messages from both pair indexes
    ///
    /// Invariant 1 keeps this to at most one message; both are checked
    /// so a corrupt double entry still converges to a single winner.
    fn merge_conflicts(&self, fid: &Fid, target: &Fid) -> Result<Vec<Message>> {
        let mut conflicts = Vec::new();
        for postfix in [UserPostfix::FollowAdds, UserPostfix::FollowRemoves] {
            if let Some(value) = self.db.get(&keys::pair_key(fid, postfix, target))? {
                let ts_hash = TsHash::from_slice(&value)?;
                conflicts.push(blob::get_message(
                    self.db.as_ref(),
                    fid,
                    UserPostfix::FollowMessage,
                    &ts_hash,
                )?);
            }
        }
        Ok(conflicts)
    }

    fn put_message_ops(&self, batch: &mut Batch, message: &Message, target: &Fid) -> Result<()> {
        blob::put_message(batch, UserPostfix::FollowMessage, message)?;

        let ts_hash = message.ts_hash();
        batch.put(
            keys::pair_key(message.fid(), pair_postfix(message.message_type())?, target),
            ts_hash.as_bytes().to_vec(),
        );
        if message.message_type() == MessageType::FollowAdd {
            batch.put(keys::by_target_key(target, message.fid(), &ts_hash), Vec::new());
        }
        Ok(())
    }

    fn delete_message_ops(&self, batch: &mut Batch, message: &Message) -> Result<()> {
        let target = message.follow_target().ok_or_else(|| {
            Error::Corruption("stored follow message without follow body".to_string())
        })?;

        blob::delete_message(batch, UserPostfix::FollowMessage, message);
        batch.delete(keys::pair_key(
            message.fid(),
            pair_postfix(message.message_type())?,
            target,
        ));
        if message.message_type() == MessageType::FollowAdd {
            batch.delete(keys::by_target_key(target, message.fid(), &message.ts_hash()));
        }
        Ok(())
    }
}

fn validate_follow_message(message: &Message) -> Result<&Fid> {
    match message.message_type() {
        MessageType::FollowAdd | MessageType::FollowRemove => {}
        other => {
            return Err(Error::BadRequest(format!(
                "message type {:?} is not handled by the follow store",
                other
            )))
        }
    }
    message
        .follow_target()
        .ok_or_else(|| Error::BadRequest("follow message without a follow body".to_string()))
}

fn pair_postfix(message_type: MessageType) -> Result<UserPostfix> {
    match message_type {
        MessageType::FollowAdd => Ok(UserPostfix::FollowAdds),
        MessageType::FollowRemove => Ok(UserPostfix::FollowRemoves),
        other => Err(Error::BadRequest(format!(
            "message type {:?} has no follow pair index",
            other
        ))),
    }
}
