/*
[INPUT]:  Session records and storage capability implementations
[OUTPUT]: Session persistence with expiry and pluggable backends
[POS]:    Session layer - module wiring
[UPDATE]: When adding storage backends or changing session semantics
*/

pub mod storage;
pub mod store;

pub use storage::{FileStorage, MemoryStorage, NoopStorage, StorageAdapter};
pub use store::SessionStore;
