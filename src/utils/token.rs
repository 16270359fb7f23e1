//! API token generation and hashing.
//!
//! Tokens are stored as HMAC-SHA256 digests keyed by the server signing
//! secret. The same function is used by the HTTP layer and the admin CLI, so
//! both must be configured with the same `TOKEN_SIGNING_SECRET`.

use hmac::{Hmac, Mac};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a generated raw token.
pub const TOKEN_LENGTH: usize = 48;

/// Hashes a raw token with HMAC-SHA256.
///
/// Returns a 64-character lowercase hex string.
pub fn hash_token(secret: &str, token: &str) -> String {
    // HMAC accepts keys of any length, so construction cannot fail
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts any key length"));
    mac.update(token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Generates a new random API token.
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}
