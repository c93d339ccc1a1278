//! Clock used to evaluate credential expiration.
//!
//! Timestamps are unix seconds. On `wasm32` the clock is read through
//! `web_time`, everywhere else through `std::time`.

#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

#[cfg(target_arch = "wasm32")]
use web_time::{SystemTime, UNIX_EPOCH};

use crate::AuthorizationError;

/// Unix time in seconds.
pub type Timestamp = u64;

/// Current unix time in seconds.
///
/// Fails with `Internal` when the clock reads before the epoch; expiration
/// cannot be judged then, and the caller must reject.
pub fn now() -> Result<Timestamp, AuthorizationError> {
    since_epoch(SystemTime::now())
}

/// Seconds from the unix epoch to `time`.
pub fn since_epoch(time: SystemTime) -> Result<Timestamp, AuthorizationError> {
    time.duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|error| {
            AuthorizationError::internal(format!("Clock reads before epoch: {}", error))
        })
}

/// Returns `true` if `expiration` is set and `now` is past it.
///
/// A credential remains valid during the second named by its expiration.
pub fn is_expired(expiration: Option<Timestamp>, now: Timestamp) -> bool {
    matches!(expiration, Some(exp) if now > exp)
}
