/*
[INPUT]:  Message bytes and shared secret key
[OUTPUT]: Hex-encoded HMAC-SHA256 digests and random nonces
[POS]:    Crypto layer - keyed-hash signing capability
[UPDATE]: When changing digest algorithm or nonce format
*/

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::http::{Result, ZaplinkError};

/// Number of random bytes in a request nonce (32 hex chars)
const NONCE_BYTES: usize = 16;

/// Trait for the injectable signing capability
///
/// Implement this to route signing through an external provider.
/// The trait is async because some environments expose keyed hashing
/// behind an asynchronous interface.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Sign `message` with `secret_key` and return a lowercase hex digest
    async fn sign(&self, message: &str, secret_key: &str) -> Result<String>;
}

/// Default HMAC-SHA256 signing provider
///
/// Produces the same digest as any standard HMAC-SHA256 implementation,
/// so a server-side verifier sharing the secret can validate it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HmacSha256Signer;

#[async_trait]
impl SigningProvider for HmacSha256Signer {
    async fn sign(&self, message: &str, secret_key: &str) -> Result<String> {
        let mut mac: Hmac<Sha256> = Mac::new_from_slice(secret_key.as_bytes())
            .map_err(|_| ZaplinkError::Config("HMAC key setup failed".to_string()))?;
        mac.update(message.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

/// Generate a 16-byte random nonce as 32 lowercase hex characters
///
/// Uses OS entropy; if that is unavailable the thread-local generator is
/// used instead and a warning is logged. Security-sensitive builds should
/// treat that warning as a deployment problem.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    if let Err(err) = OsRng.try_fill_bytes(&mut bytes) {
        tracing::warn!("OS entropy unavailable, falling back to thread-local RNG: {err}");
        rand::thread_rng().fill_bytes(&mut bytes);
    }
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_known_vector() {
        let signer = HmacSha256Signer;
        let digest = signer
            .sign("The quick brown fox jumps over the lazy dog", "key")
            .await
            .unwrap();
        assert_eq!(
            digest,
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[tokio::test]
    async fn test_sign_is_deterministic() {
        let signer = HmacSha256Signer;
        let a = signer.sign("payload", "secret").await.unwrap();
        let b = signer.sign("payload", "secret").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[tokio::test]
    async fn test_sign_differs_on_message_or_key_change() {
        let signer = HmacSha256Signer;
        let base = signer.sign("payload", "secret").await.unwrap();
        let other_message = signer.sign("payloae", "secret").await.unwrap();
        let other_key = signer.sign("payload", "secres").await.unwrap();
        assert_ne!(base, other_message);
        assert_ne!(base, other_key);
    }

    #[test]
    fn test_nonce_format_and_uniqueness() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert_eq!(b.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
