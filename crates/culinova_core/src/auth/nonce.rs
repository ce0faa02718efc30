//! Nonce generation for identity-token binding.
//!
//! The raw nonce stays on device; only its SHA-256 hex digest is sent to the
//! provider, which echoes it back inside the signed identity token.

use rand::Rng;
use sha2::{Digest, Sha256};

/// Characters a nonce is drawn from. `W` is absent; existing tokens were
/// issued from this set.
pub const NONCE_CHARSET: &[u8] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVXYZabcdefghijklmnopqrstuvwxyz-._";

pub const DEFAULT_NONCE_LEN: usize = 32;

/// Returns `len` characters drawn uniformly from `NONCE_CHARSET`.
pub fn random_nonce(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| NONCE_CHARSET[rng.gen_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}
