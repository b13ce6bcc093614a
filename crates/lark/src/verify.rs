use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Constant-time token comparison via SHA-256 digest.
/// Hashing normalizes lengths so ct_eq always compares 32 bytes.
pub fn token_eq(a: &str, b: &str) -> bool {
    let ha = Sha256::digest(a.as_bytes());
    let hb = Sha256::digest(b.as_bytes());
    ha.ct_eq(&hb).into()
}

/// Check a callback's verification token. With no expected token configured
/// every callback passes.
pub fn verify_token(expected: Option<&str>, provided: &str) -> bool {
    match expected {
        Some(expected) => token_eq(expected, provided),
        None => true,
    }
}
