//! Message blob persistence
//!
//! Message bytes live under their primary key, framed with a CRC32 so
//! corruption is caught at read time:
//!
//! ```text
//! +-----------+------------------+
//! | CRC32(4B) | bincode(Message) |
//! +-----------+------------------+
//! ```
//!
//! There is no cache in front of the engine; its own block cache is
//! assumed sufficient.

use crate::db::{Batch, Database};
use crate::keys::{self, UserPostfix};
use bytes::{Buf, BufMut};
use crc32fast::Hasher;
use hubdb_core::{Error, Fid, Message, Result, TsHash};

/// Frames a message for storage
pub fn encode_message(message: &Message) -> Result<Vec<u8>> {
    let payload =
        bincode::serialize(message).map_err(|e| Error::Serialization(e.to_string()))?;

    let mut hasher = Hasher::new();
    hasher.update(&payload);

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.put_u32_le(hasher.finalize());
    buf.put_slice(&payload);
    Ok(buf)
}

/// Unframes a stored message, verifying its checksum
///
/// # Errors
///
/// Returns [`Error::Corruption`] if the frame is truncated, the
/// checksum does not match, or the payload does not decode.
pub fn decode_message(data: &[u8]) -> Result<Message> {
    if data.len() < 4 {
        return Err(Error::Corruption("message blob too small".to_string()));
    }

    let mut cursor = data;
    let expected = cursor.get_u32_le();

    let mut hasher = Hasher::new();
    hasher.update(cursor);
    if hasher.finalize() != expected {
        return Err(Error::Corruption("message blob checksum mismatch".to_string()));
    }

    bincode::deserialize(cursor)
        .map_err(|e| Error::Corruption(format!("undecodable message blob: {}", e)))
}

/// Queues the blob write for a message under its primary key
pub fn put_message(batch: &mut Batch, postfix: UserPostfix, message: &Message) -> Result<()> {
    let key = keys::message_key(message.fid(), postfix, &message.ts_hash());
    batch.put(key, encode_message(message)?);
    Ok(())
}

/// Queues the blob deletion for a message
pub fn delete_message(batch: &mut Batch, postfix: UserPostfix, message: &Message) {
    batch.delete(keys::message_key(message.fid(), postfix, &message.ts_hash()));
}

/// Loads and decodes the message stored under `(fid, postfix, ts_hash)`
///
/// # Errors
///
/// Returns [`Error::NotFound`] if no blob exists under the key.
pub fn get_message<D: Database>(
    db: &D,
    fid: &Fid,
    postfix: UserPostfix,
    ts_hash: &TsHash,
) -> Result<Message> {
    let key = keys::message_key(fid, postfix, ts_hash);
    let data = db.get(&key)?.ok_or(Error::NotFound)?;
    decode_message(&data)
}
