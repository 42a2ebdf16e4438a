/*
[INPUT]:  Authenticated user, app token, and a storage adapter
[OUTPUT]: Obfuscated persisted sessions with lazy expiry
[POS]:    Session layer - single-slot session persistence
[UPDATE]: When changing the slot format, key derivation, or expiry rules
*/

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::crypto::{deobfuscate, obfuscate};
use crate::http::Result;
use crate::types::PiUser;

use super::storage::StorageAdapter;

/// Namespace tag prefixed to every storage key
const STORAGE_KEY_PREFIX: &str = "zaplink";

/// Length of the derived per-API-key tag
const STORAGE_TAG_LEN: usize = 8;

/// Characters of the secret key used as the obfuscation key
const OBFUSCATION_KEY_LEN: usize = 16;

/// Persisted session record; timestamps are millisecond Unix stamps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionData {
    user: PiUser,
    token: String,
    expires: i64,
    created: i64,
}

/// Persists at most one authenticated session through a storage adapter
///
/// The storage key is a pure function of the API key, so SDK instances
/// configured with different API keys never collide. Expiry is enforced
/// lazily on load; there is no background timer.
pub struct SessionStore {
    storage_key: String,
    obfuscation_key: String,
    adapter: Box<dyn StorageAdapter>,
    session_timeout: Duration,
}

impl SessionStore {
    /// Create a store for one API key / secret key pair
    pub fn new(
        api_key: &str,
        secret_key: &str,
        adapter: Box<dyn StorageAdapter>,
        session_timeout: Duration,
    ) -> Self {
        Self {
            storage_key: derive_storage_key(api_key),
            obfuscation_key: derive_obfuscation_key(secret_key),
            adapter,
            session_timeout,
        }
    }

    /// The derived storage key this store writes under
    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Persist a session expiring `session_timeout` from now
    pub fn save(&self, user: &PiUser, token: &str) -> Result<()> {
        let now = Utc::now().timestamp_millis();
        let data = SessionData {
            user: user.clone(),
            token: token.to_string(),
            expires: now + self.session_timeout.as_millis() as i64,
            created: now,
        };

        let encoded = obfuscate(&data, &self.obfuscation_key)?;
        self.adapter.set(&self.storage_key, &encoded);
        Ok(())
    }

    /// Load the persisted session if present and unexpired
    ///
    /// A corrupted slot is cleared and reported as absent; an expired slot
    /// is cleared and reported as absent.
    pub fn load(&self) -> Option<(PiUser, String)> {
        let encoded = self.adapter.get(&self.storage_key)?;

        let data: SessionData = match deobfuscate(&encoded, &self.obfuscation_key) {
            Ok(data) => data,
            Err(err) => {
                tracing::warn!("clearing corrupted session slot: {err}");
                self.clear();
                return None;
            }
        };

        if Utc::now().timestamp_millis() > data.expires {
            self.clear();
            return None;
        }

        Some((data.user, data.token))
    }

    /// Remove the slot unconditionally; idempotent
    pub fn clear(&self) {
        self.adapter.remove(&self.storage_key);
    }

    /// Whether a loadable, unexpired session exists
    ///
    /// Performs a full load and decode, not a cheap existence check.
    pub fn has_valid_session(&self) -> bool {
        self.load().is_some()
    }
}

fn derive_storage_key(api_key: &str) -> String {
    let tag: String = BASE64.encode(api_key).chars().take(STORAGE_TAG_LEN).collect();
    format!("{STORAGE_KEY_PREFIX}_{tag}")
}

fn derive_obfuscation_key(secret_key: &str) -> String {
    let chars: Vec<char> = secret_key.chars().collect();
    let start = chars.len().saturating_sub(OBFUSCATION_KEY_LEN);
    chars[start..].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::storage::MemoryStorage;
    use rust_decimal::Decimal;

    fn test_user() -> PiUser {
        PiUser {
            id: None,
            username: "alice".to_string(),
            pi_username: None,
            pi_uid: None,
            wallet_address: Some("GABC123".to_string()),
            balance: Decimal::from(10),
            name: None,
        }
    }

    fn store_with(adapter: MemoryStorage, timeout: Duration) -> SessionStore {
        SessionStore::new("k1", "super-secret-key-material", Box::new(adapter), timeout)
    }

    #[test]
    fn test_storage_key_is_deterministic_and_namespaced() {
        let a = derive_storage_key("k1");
        let b = derive_storage_key("k1");
        let other = derive_storage_key("k2");

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert!(a.starts_with("zaplink_"));
        assert!(a.len() <= "zaplink_".len() + STORAGE_TAG_LEN);
    }

    #[test]
    fn test_obfuscation_key_is_secret_tail() {
        assert_eq!(derive_obfuscation_key("abcdefghijklmnopqrstuvwx"), "ijklmnopqrstuvwx");
        assert_eq!(derive_obfuscation_key("short"), "short");
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let adapter = MemoryStorage::new();
        let store = store_with(adapter, Duration::from_secs(3600));

        store.save(&test_user(), "app-token-1").unwrap();
        let (user, token) = store.load().expect("session should load");

        assert_eq!(user, test_user());
        assert_eq!(token, "app-token-1");
        assert!(store.has_valid_session());
    }

    #[test]
    fn test_expired_session_is_cleared_on_load() {
        let adapter = MemoryStorage::new();
        let store = store_with(adapter.clone(), Duration::from_secs(3600));

        // Write a record whose expiry is already in the past.
        let now = Utc::now().timestamp_millis();
        let stale = SessionData {
            user: test_user(),
            token: "old-token".to_string(),
            expires: now - 1_000,
            created: now - 10_000,
        };
        let encoded =
            obfuscate(&stale, &derive_obfuscation_key("super-secret-key-material")).unwrap();
        adapter.set(store.storage_key(), &encoded);

        assert!(store.load().is_none());
        assert!(adapter.get(store.storage_key()).is_none());
    }

    #[test]
    fn test_corrupted_slot_self_heals() {
        let adapter = MemoryStorage::new();
        let store = store_with(adapter.clone(), Duration::from_secs(3600));

        adapter.set(store.storage_key(), "!!not-a-session!!");

        assert!(store.load().is_none());
        assert!(adapter.get(store.storage_key()).is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let adapter = MemoryStorage::new();
        let store = store_with(adapter, Duration::from_secs(3600));

        store.save(&test_user(), "token").unwrap();
        store.clear();
        store.clear();
        assert!(store.load().is_none());
        assert!(!store.has_valid_session());
    }
}
