//! Content hashing for bundle file names.
//!
//! # Usage
//!
//! ```ignore
//! use crate::utils::hash;
//!
//! let fp = hash::fingerprint(b"body{color:red}"); // -> "a1b2c3d4"
//! ```

/// Length of the fingerprint embedded in file names.
pub const FINGERPRINT_LEN: usize = 8;

/// First 8 hex digits of the BLAKE3 digest of `data`.
///
/// Useful for cache-busting filenames (e.g. `bundle-style-a1b2c3d4.css`).
#[inline]
pub fn fingerprint<T: AsRef<[u8]> + ?Sized>(data: &T) -> String {
    let digest = blake3::hash(data.as_ref());
    let mut hex = hex::encode(&digest.as_bytes()[..FINGERPRINT_LEN / 2]);
    hex.truncate(FINGERPRINT_LEN);
    hex
}
