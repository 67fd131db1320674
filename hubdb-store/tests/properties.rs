//! Property tests: key codec bijection and merge order-independence.

use hubdb_core::{
    Fid, FollowBody, Message, MessageBody, MessageData, MessageType, TsHash, HASH_LENGTH,
};
use hubdb_store::db::{Database, MemoryDb};
use hubdb_store::keys::{self, UserPostfix};
use hubdb_store::{EventBus, FollowStore, StoreOptions};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_fid() -> impl Strategy<Value = Fid> {
    prop::collection::vec(any::<u8>(), 1..=Fid::MAX_LENGTH).prop_map(|bytes| {
        Fid::new(bytes).unwrap()
    })
}

fn arb_hash() -> impl Strategy<Value = [u8; HASH_LENGTH]> {
    prop::array::uniform20(any::<u8>())
}

/// Messages confined to one pair with few distinct timestamps and
/// hashes, so conflicts are common.
fn arb_conflict_message() -> impl Strategy<Value = Message> {
    (0u32..4, 0u8..4, any::<bool>()).prop_map(|(timestamp, hash_seed, is_remove)| {
        let message_type = if is_remove {
            MessageType::FollowRemove
        } else {
            MessageType::FollowAdd
        };
        Message {
            data: MessageData {
                fid: Fid::from_slice(b"alice").unwrap(),
                timestamp,
                message_type,
                body: MessageBody::Follow(FollowBody {
                    user: Fid::from_slice(b"bob").unwrap(),
                }),
            },
            hash: [hash_seed; HASH_LENGTH],
        }
    })
}

fn new_store() -> (FollowStore<MemoryDb>, Arc<MemoryDb>) {
    let db = Arc::new(MemoryDb::new());
    let store = FollowStore::new(
        Arc::clone(&db),
        Arc::new(EventBus::new()),
        StoreOptions::default(),
    );
    (store, db)
}

fn dump(db: &MemoryDb) -> Vec<(Vec<u8>, Vec<u8>)> {
    db.prefix_scan(&[]).unwrap()
}

proptest! {
    #[test]
    fn prop_message_key_round_trips(
        fid in arb_fid(),
        timestamp in any::<u32>(),
        hash in arb_hash(),
    ) {
        let ts_hash = TsHash::new(timestamp, &hash);
        let key = keys::message_key(&fid, UserPostfix::FollowMessage, &ts_hash);

        let (decoded_fid, postfix, decoded_ts_hash) = keys::decode_message_key(&key).unwrap();
        prop_assert_eq!(decoded_fid, fid);
        prop_assert_eq!(postfix, UserPostfix::FollowMessage);
        prop_assert_eq!(decoded_ts_hash, ts_hash);
    }

    #[test]
    fn prop_pair_key_round_trips(fid in arb_fid(), target in arb_fid()) {
        let key = keys::pair_key(&fid, UserPostfix::FollowAdds, &target);

        let (decoded_fid, postfix, decoded_target) = keys::decode_pair_key(&key).unwrap();
        prop_assert_eq!(decoded_fid, fid);
        prop_assert_eq!(postfix, UserPostfix::FollowAdds);
        prop_assert_eq!(decoded_target, target);
    }

    #[test]
    fn prop_by_target_key_round_trips(
        target in arb_fid(),
        fid in arb_fid(),
        timestamp in any::<u32>(),
        hash in arb_hash(),
    ) {
        let ts_hash = TsHash::new(timestamp, &hash);
        let key = keys::by_target_key(&target, &fid, &ts_hash);

        let (decoded_target, decoded_fid, decoded_ts_hash) =
            keys::decode_by_target_key(&key).unwrap();
        prop_assert_eq!(decoded_target, target);
        prop_assert_eq!(decoded_fid, fid);
        prop_assert_eq!(decoded_ts_hash, ts_hash);
    }

    #[test]
    fn prop_distinct_fids_encode_distinct_fields(a in arb_fid(), b in arb_fid()) {
        prop_assume!(a != b);
        prop_assert_ne!(keys::by_target_prefix(&a), keys::by_target_prefix(&b));
    }

    #[test]
    fn prop_merge_is_order_independent(
        messages in prop::collection::vec(arb_conflict_message(), 1..6),
    ) {
        let (forward, forward_db) = new_store();
        for message in &messages {
            forward.merge(message).unwrap();
        }

        let (backward, backward_db) = new_store();
        for message in messages.iter().rev() {
            backward.merge(message).unwrap();
        }

        prop_assert_eq!(dump(&forward_db), dump(&backward_db));
    }

    #[test]
    fn prop_replaying_merges_is_idempotent(
        messages in prop::collection::vec(arb_conflict_message(), 1..6),
    ) {
        let (store, db) = new_store();
        for message in &messages {
            store.merge(message).unwrap();
        }
        let settled = dump(&db);

        for message in &messages {
            store.merge(message).unwrap();
        }
        prop_assert_eq!(dump(&db), settled);
    }

    #[test]
    fn prop_pair_holds_at_most_one_message(
        messages in prop::collection::vec(arb_conflict_message(), 1..8),
    ) {
        let (store, _db) = new_store();
        for message in &messages {
            store.merge(message).unwrap();
        }

        let stored = store
            .get_all_follow_messages_by_fid(&Fid::from_slice(b"alice").unwrap())
            .unwrap();
        prop_assert_eq!(stored.len(), 1);
    }
}
