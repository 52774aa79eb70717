//! TTL response cache.
//!
//! Short-circuits expensive downstream calls for identical, recent
//! requests. Keys derive deterministically from `(endpoint, params)` with
//! params sorted by name, so caller map iteration order never matters.
//! Entries expire lazily on lookup against wall-clock time.

pub mod entry;
pub mod key;
pub mod store;

pub use entry::CacheEntry;
pub use key::{derive_key, params_json};
pub use store::ResponseCache;
