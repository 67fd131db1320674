//! Farcaster time
//!
//! Message timestamps count seconds since the Farcaster epoch rather
//! than the Unix epoch, which keeps them inside 32 bits for decades.

use crate::{Error, Result, Timestamp};
use std::time::{SystemTime, UNIX_EPOCH};

/// The Farcaster epoch: 2021-01-01T00:00:00Z, in Unix seconds
pub const FARCASTER_EPOCH: u64 = 1_609_459_200;

/// Returns the current Farcaster time from the system clock
///
/// # Errors
///
/// Returns [`Error::BadRequest`] if the system clock is before the
/// Farcaster epoch or beyond the range of a 32-bit timestamp.
pub fn farcaster_time() -> Result<Timestamp> {
    let unix_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| Error::BadRequest(format!("system clock before Unix epoch: {}", e)))?
        .as_secs();
    to_farcaster_time(unix_secs)
}

/// Converts Unix seconds to Farcaster time
pub fn to_farcaster_time(unix_secs: u64) -> Result<Timestamp> {
    let elapsed = unix_secs
        .checked_sub(FARCASTER_EPOCH)
        .ok_or_else(|| Error::BadRequest("timestamp before the Farcaster epoch".to_string()))?;
    Timestamp::try_from(elapsed)
        .map_err(|_| Error::BadRequest("timestamp exceeds 32 bits of Farcaster time".to_string()))
}

/// Converts Farcaster time back to Unix seconds
pub fn from_farcaster_time(timestamp: Timestamp) -> u64 {
    FARCASTER_EPOCH + u64::from(timestamp)
}
