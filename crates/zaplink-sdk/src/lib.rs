/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public Zaplink SDK crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod client;
pub mod crypto;
pub mod events;
pub mod http;
pub mod session;
pub mod types;

// Re-export the client
pub use client::Zaplink;

// Re-export commonly used types from crypto
pub use crypto::{
    generate_nonce,
    HmacSha256Signer,
    SigningProvider,
};

// Re-export commonly used types from events
pub use events::{
    EventBus,
    EventData,
    Subscription,
    ZaplinkEvent,
};

// Re-export commonly used types from http
pub use http::{
    ClientConfig,
    RequestSigner,
    Result,
    ZaplinkError,
};

// Re-export commonly used types from session
pub use session::{
    FileStorage,
    MemoryStorage,
    NoopStorage,
    SessionStore,
    StorageAdapter,
};

// Re-export all types
pub use types::*;
