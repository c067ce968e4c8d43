//! HMAC-SHA256 helpers shared by the gateway adapters.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the hex-encoded HMAC-SHA256 of `message` under `secret`.
pub(crate) fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Verifies a hex-encoded HMAC-SHA256 signature in constant time.
///
/// Undecodable hex and wrong-length tags are rejected without touching the
/// MAC comparison; the tag comparison itself goes through `verify_slice`.
pub(crate) fn verify_hmac_sha256_hex(secret: &[u8], message: &[u8], provided_hex: &str) -> bool {
    let Ok(provided) = hex::decode(provided_hex.trim()) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key size");
    mac.update(message);
    mac.verify_slice(&provided).is_ok()
}
