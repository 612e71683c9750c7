//! HMAC-SHA256 payload signatures for webhook deliveries.
//!
//! Every delivery with a subscriber secret carries a signature of the raw
//! request body so receivers can authenticate the sender. The signature is
//! `sha256=<hex>` over the body, keyed with the subscriber's secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HTTP header carrying the payload signature.
pub const SIGNATURE_HEADER: &str = "X-Spree-Hmac-SHA256";

/// Sign a payload with the given secret.
#[must_use]
#[allow(clippy::expect_used)] // HMAC accepts any key size, this cannot fail
pub fn sign_payload(payload: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload.as_bytes());
    let result = mac.finalize();

    format!("sha256={}", hex::encode(result.into_bytes()))
}

/// Verify a payload signature in constant time.
#[must_use]
pub fn verify_payload(payload: &str, secret: &str, signature: &str) -> bool {
    let Some(hex_digest) = signature.strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_digest) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
