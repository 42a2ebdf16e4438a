/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses and typed API results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod signature;

pub use client::{ClientConfig, HttpClient};
pub use error::{Result, ZaplinkError};
pub use signature::RequestSigner;
