//! Composite key codec
//!
//! Every store key is a byte concatenation of fixed-width fields, laid
//! out so that the engine's lexicographic key order answers the stores'
//! query patterns directly:
//!
//! ```text
//! User ‖ fid ‖ FollowMessage ‖ ts_hash      -> framed message blob
//! User ‖ fid ‖ FollowAdds    ‖ target_fid   -> ts_hash
//! User ‖ fid ‖ FollowRemoves ‖ target_fid   -> ts_hash
//! FollowsByTarget ‖ target_fid ‖ fid ‖ ts_hash -> (empty)
//! ```
//!
//! Fids are variable length, so they are encoded as a fixed 33-byte
//! field: one length byte followed by the fid bytes zero-padded to
//! [`Fid::MAX_LENGTH`]. The encoding is injective (a bare length prefix
//! would collide fids with leading zero bytes under left-padding) and
//! keeps every later field at a fixed offset. Encoded fids order by
//! `(length, bytes)`.
//!
//! Prefix and postfix values are stable forever; a future layout change
//! allocates new root prefixes instead of mutating these.

use bytes::BufMut;
use hubdb_core::{Error, Fid, Result, TsHash, TS_HASH_LENGTH};

/// Top-level key namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RootPrefix {
    /// Keys scoped to a single user: message blobs and pair indexes
    User = 1,
    /// Inverse follow index, scoped to the target user
    FollowsByTarget = 2,
}

/// Second-level tag selecting which store owns a user-scoped key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UserPostfix {
    /// Cast message blobs
    CastMessage = 1,
    /// Cast add pair index
    CastAdds = 2,
    /// Cast remove pair index
    CastRemoves = 3,
    /// Follow message blobs
    FollowMessage = 4,
    /// Follow add pair index
    FollowAdds = 5,
    /// Follow remove pair index
    FollowRemoves = 6,
}

impl UserPostfix {
    /// Maps a raw postfix byte back to its tag
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(UserPostfix::CastMessage),
            2 => Some(UserPostfix::CastAdds),
            3 => Some(UserPostfix::CastRemoves),
            4 => Some(UserPostfix::FollowMessage),
            5 => Some(UserPostfix::FollowAdds),
            6 => Some(UserPostfix::FollowRemoves),
            _ => None,
        }
    }
}

/// Width of an encoded fid field: length byte plus padded bytes
pub const FID_FIELD_WIDTH: usize = 1 + Fid::MAX_LENGTH;

const MESSAGE_KEY_LENGTH: usize = 1 + FID_FIELD_WIDTH + 1 + TS_HASH_LENGTH;
const PAIR_KEY_LENGTH: usize = 1 + FID_FIELD_WIDTH + 1 + FID_FIELD_WIDTH;
const BY_TARGET_KEY_LENGTH: usize = 1 + FID_FIELD_WIDTH + FID_FIELD_WIDTH + TS_HASH_LENGTH;

fn put_fid(buf: &mut Vec<u8>, fid: &Fid) {
    buf.put_u8(fid.len() as u8);
    buf.put_slice(fid.as_bytes());
    buf.put_bytes(0, Fid::MAX_LENGTH - fid.len());
}

fn read_fid(field: &[u8]) -> Result<Fid> {
    debug_assert_eq!(field.len(), FID_FIELD_WIDTH);
    let len = field[0] as usize;
    if len == 0 || len > Fid::MAX_LENGTH {
        return Err(Error::Corruption(format!("invalid fid length byte: {}", len)));
    }
    if field[1 + len..].iter().any(|&b| b != 0) {
        return Err(Error::Corruption("nonzero fid padding".to_string()));
    }
    Fid::from_slice(&field[1..1 + len])
}

/// Builds the primary key of a message blob
pub fn message_key(fid: &Fid, postfix: UserPostfix, ts_hash: &TsHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(MESSAGE_KEY_LENGTH);
    key.put_u8(RootPrefix::User as u8);
    put_fid(&mut key, fid);
    key.put_u8(postfix as u8);
    key.put_slice(ts_hash.as_bytes());
    key
}

/// Builds the scan prefix covering all message blobs of one fid
///
/// Keys under this prefix order by ts_hash, so a scan enumerates the
/// fid's messages chronologically with the hash as tiebreak.
pub fn message_prefix(fid: &Fid, postfix: UserPostfix) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + FID_FIELD_WIDTH + 1);
    key.put_u8(RootPrefix::User as u8);
    put_fid(&mut key, fid);
    key.put_u8(postfix as u8);
    key
}

/// Builds the pair-index key for `(fid, target)` under the given index
pub fn pair_key(fid: &Fid, postfix: UserPostfix, target: &Fid) -> Vec<u8> {
    let mut key = Vec::with_capacity(PAIR_KEY_LENGTH);
    key.put_u8(RootPrefix::User as u8);
    put_fid(&mut key, fid);
    key.put_u8(postfix as u8);
    put_fid(&mut key, target);
    key
}

/// Builds the scan prefix covering one fid's whole pair index
pub fn pair_prefix(fid: &Fid, postfix: UserPostfix) -> Vec<u8> {
    message_prefix(fid, postfix)
}

/// Builds the inverse-index key recording that `fid` follows `target`
pub fn by_target_key(target: &Fid, fid: &Fid, ts_hash: &TsHash) -> Vec<u8> {
    let mut key = Vec::with_capacity(BY_TARGET_KEY_LENGTH);
    key.put_u8(RootPrefix::FollowsByTarget as u8);
    put_fid(&mut key, target);
    put_fid(&mut key, fid);
    key.put_slice(ts_hash.as_bytes());
    key
}

/// Builds the scan prefix covering all followers of `target`
pub fn by_target_prefix(target: &Fid) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + FID_FIELD_WIDTH);
    key.put_u8(RootPrefix::FollowsByTarget as u8);
    put_fid(&mut key, target);
    key
}

/// Decodes a primary message key into its fields
pub fn decode_message_key(key: &[u8]) -> Result<(Fid, UserPostfix, TsHash)> {
    if key.len() != MESSAGE_KEY_LENGTH || key[0] != RootPrefix::User as u8 {
        return Err(Error::Corruption("malformed message key".to_string()));
    }
    let fid = read_fid(&key[1..1 + FID_FIELD_WIDTH])?;
    let postfix = UserPostfix::from_u8(key[1 + FID_FIELD_WIDTH])
        .ok_or_else(|| Error::Corruption("unknown user postfix".to_string()))?;
    let ts_hash = TsHash::from_slice(&key[2 + FID_FIELD_WIDTH..])?;
    Ok((fid, postfix, ts_hash))
}

/// Decodes a pair-index key into its fields
pub fn decode_pair_key(key: &[u8]) -> Result<(Fid, UserPostfix, Fid)> {
    if key.len() != PAIR_KEY_LENGTH || key[0] != RootPrefix::User as u8 {
        return Err(Error::Corruption("malformed pair index key".to_string()));
    }
    let fid = read_fid(&key[1..1 + FID_FIELD_WIDTH])?;
    let postfix = UserPostfix::from_u8(key[1 + FID_FIELD_WIDTH])
        .ok_or_else(|| Error::Corruption("unknown user postfix".to_string()))?;
    let target = read_fid(&key[2 + FID_FIELD_WIDTH..])?;
    Ok((fid, postfix, target))
}

/// Decodes an inverse-index key into its fields
pub fn decode_by_target_key(key: &[u8]) -> Result<(Fid, Fid, TsHash)> {
    if key.len() != BY_TARGET_KEY_LENGTH || key[0] != RootPrefix::FollowsByTarget as u8 {
        return Err(Error::Corruption("malformed by-target key".to_string()));
    }
    let target = read_fid(&key[1..1 + FID_FIELD_WIDTH])?;
    let fid = read_fid(&key[1 + FID_FIELD_WIDTH..1 + 2 * FID_FIELD_WIDTH])?;
    let ts_hash = TsHash::from_slice(&key[1 + 2 * FID_FIELD_WIDTH..])?;
    Ok((target, fid, ts_hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hubdb_core::HASH_LENGTH;

    fn fid(bytes: &[u8]) -> Fid {
        Fid::from_slice(bytes).unwrap()
    }

    #[test]
    fn test_message_key_round_trip() {
        let ts_hash = TsHash::new(100, &[0xaa; HASH_LENGTH]);
        let key = message_key(&fid(b"alice"), UserPostfix::FollowMessage, &ts_hash);

        let (decoded_fid, postfix, decoded_ts_hash) = decode_message_key(&key).unwrap();
        assert_eq!(decoded_fid, fid(b"alice"));
        assert_eq!(postfix, UserPostfix::FollowMessage);
        assert_eq!(decoded_ts_hash, ts_hash);
    }

    #[test]
    fn test_pair_key_round_trip() {
        let key = pair_key(&fid(b"alice"), UserPostfix::FollowAdds, &fid(b"bob"));

        let (decoded_fid, postfix, decoded_target) = decode_pair_key(&key).unwrap();
        assert_eq!(decoded_fid, fid(b"alice"));
        assert_eq!(postfix, UserPostfix::FollowAdds);
        assert_eq!(decoded_target, fid(b"bob"));
    }

    #[test]
    fn test_by_target_key_round_trip() {
        let ts_hash = TsHash::new(7, &[0x11; HASH_LENGTH]);
        let key = by_target_key(&fid(b"bob"), &fid(b"alice"), &ts_hash);

        let (target, follower, decoded_ts_hash) = decode_by_target_key(&key).unwrap();
        assert_eq!(target, fid(b"bob"));
        assert_eq!(follower, fid(b"alice"));
        assert_eq!(decoded_ts_hash, ts_hash);
    }

    #[test]
    fn test_message_keys_sort_by_ts_hash() {
        let f = fid(b"alice");
        let earlier = message_key(&f, UserPostfix::FollowMessage, &TsHash::new(100, &[0xff; HASH_LENGTH]));
        let later = message_key(&f, UserPostfix::FollowMessage, &TsHash::new(101, &[0x00; HASH_LENGTH]));
        assert!(earlier < later);
    }

    #[test]
    fn test_fid_encoding_is_injective() {
        // [1] and [0, 1] must not collide, nor may a fid be a prefix of
        // a longer one within the same field.
        let short = pair_key(&fid(&[1]), UserPostfix::FollowAdds, &fid(&[9]));
        let padded = pair_key(&fid(&[0, 1]), UserPostfix::FollowAdds, &fid(&[9]));
        assert_ne!(short, padded);

        let a = by_target_prefix(&fid(&[5]));
        let b = by_target_prefix(&fid(&[5, 0]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_rejects_malformed_keys() {
        assert!(decode_message_key(&[]).is_err());
        assert!(decode_message_key(&[0xff; 59]).is_err());

        // Corrupt padding bytes must not decode.
        let mut key = pair_key(&fid(b"a"), UserPostfix::FollowAdds, &fid(b"b"));
        key[10] = 0xff;
        assert!(decode_pair_key(&key).is_err());
    }

    #[test]
    fn test_max_length_fid_round_trips() {
        let long = fid(&[0xab; Fid::MAX_LENGTH]);
        let key = pair_key(&long, UserPostfix::FollowRemoves, &long);
        let (decoded_fid, _, decoded_target) = decode_pair_key(&key).unwrap();
        assert_eq!(decoded_fid, long);
        assert_eq!(decoded_target, long);
    }
}
