//! Infrastructure Layer
//!
//! Session persistence on top of `platform` key-value storage.

pub mod storage;

pub use storage::StoredSessionRepository;
