/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for zaplink-sdk tests

use wiremock::MockServer;
use zaplink_sdk::{MemoryStorage, PiUser, Zaplink, ZaplinkConfig};

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Configuration pointing at a mock server
pub fn test_config(base_url: &str) -> ZaplinkConfig {
    ZaplinkConfig::new("k1", "s1", "5").with_base_url(base_url)
}

/// User fixture matching the mock callback responses
pub fn test_user() -> PiUser {
    serde_json::from_value(serde_json::json!({
        "username": "alice",
        "balance": 10,
        "wallet_address": "GABC123",
    }))
    .expect("valid user fixture")
}

/// Fresh unauthenticated client backed by shared in-memory storage
pub fn fresh_client(base_url: &str) -> (Zaplink, MemoryStorage) {
    let adapter = MemoryStorage::new();
    let client = Zaplink::with_storage(test_config(base_url), Box::new(adapter.clone()))
        .expect("client init");
    (client, adapter)
}

/// Client that starts authenticated by resuming a seeded session
///
/// No network traffic is involved; the session is written through the
/// shared adapter and picked up at construction.
#[allow(dead_code)]
pub fn authenticated_client(base_url: &str) -> (Zaplink, MemoryStorage) {
    let adapter = MemoryStorage::new();
    {
        let seed = Zaplink::with_storage(test_config(base_url), Box::new(adapter.clone()))
            .expect("client init");
        seed.session()
            .save(&test_user(), "at1")
            .expect("session seed");
    }
    let client = Zaplink::with_storage(test_config(base_url), Box::new(adapter.clone()))
        .expect("client init");
    assert!(client.is_authenticated());
    (client, adapter)
}
