/*
[INPUT]:  Signing and masking requirements from the client and session store
[OUTPUT]: HMAC signing, nonce generation, and obfuscation primitives
[POS]:    Crypto layer - module wiring
[UPDATE]: When adding new primitives or changing provider interfaces
*/

pub mod obfuscate;
pub mod signing;

pub use obfuscate::{deobfuscate, obfuscate};
pub use signing::{generate_nonce, HmacSha256Signer, SigningProvider};
