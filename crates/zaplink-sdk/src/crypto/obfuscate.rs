/*
[INPUT]:  Serializable values and a per-instance key
[OUTPUT]: Base64-encoded XOR-masked payloads
[POS]:    Crypto layer - at-rest obfuscation for the session slot
[UPDATE]: When changing the serialization or encoding of stored sessions
*/

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::http::{Result, ZaplinkError};

/// Mask a serializable value for local storage
///
/// Serializes to JSON, XORs each byte against the cyclically repeated key,
/// then base64-encodes the result. This is a deterrent against casual
/// inspection of the storage slot, not a confidentiality guarantee.
pub fn obfuscate<T: Serialize>(value: &T, key: &str) -> Result<String> {
    let plain = serde_json::to_vec(value)?;
    Ok(BASE64.encode(xor_bytes(&plain, key.as_bytes())))
}

/// Exact inverse of [`obfuscate`]
///
/// Invalid base64 or a payload that does not decode to valid JSON yields
/// a decode error; callers treat that as "no usable session".
pub fn deobfuscate<T: DeserializeOwned>(encoded: &str, key: &str) -> Result<T> {
    let masked = BASE64
        .decode(encoded)
        .map_err(|e| ZaplinkError::Decode(format!("invalid base64: {e}")))?;
    let plain = xor_bytes(&masked, key.as_bytes());
    serde_json::from_slice(&plain)
        .map_err(|e| ZaplinkError::Decode(format!("invalid session payload: {e}")))
}

fn xor_bytes(data: &[u8], key: &[u8]) -> Vec<u8> {
    if key.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .enumerate()
        .map(|(i, byte)| byte ^ key[i % key.len()])
        .collect()
}
