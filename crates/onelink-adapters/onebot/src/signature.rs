//! HMAC-SHA1 webhook signatures.
//!
//! The gateway signs each push with the shared secret and sends
//! `x-signature: sha1=<hex digest of the raw body>`. Checking is opt-in per
//! bot: without a secret every request is accepted.

use hmac::{Hmac, Mac};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha1 = Hmac<Sha1>;

/// Prefix of the signature header value.
pub const SIGNATURE_PREFIX: &str = "sha1=";

/// Why a signature check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A secret is configured but no signature was sent.
    #[error("signature header missing")]
    Missing,
    /// The signature does not match the body.
    #[error("signature mismatch")]
    Invalid,
}

/// Computes the full header value (`sha1=<hex>`) for `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(body);
    Some(format!(
        "{SIGNATURE_PREFIX}{}",
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Checks `signature` against `body`.
///
/// `secret == None` skips verification entirely. The comparison is exact
/// on the header string (lower-case hex) and runs in constant time.
///
/// # Errors
/// [`SignatureError::Missing`] when a secret is set but the header is absent
/// or empty, [`SignatureError::Invalid`] on any mismatch.
pub fn verify(
    secret: Option<&str>,
    body: &[u8],
    signature: Option<&str>,
) -> Result<(), SignatureError> {
    let Some(secret) = secret else {
        return Ok(());
    };
    let signature = signature
        .filter(|s| !s.is_empty())
        .ok_or(SignatureError::Missing)?;
    let expected = sign(secret, body).ok_or(SignatureError::Invalid)?;

    if bool::from(expected.as_bytes().ct_eq(signature.as_bytes())) {
        Ok(())
    } else {
        Err(SignatureError::Invalid)
    }
}
