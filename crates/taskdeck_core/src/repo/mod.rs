//! Persistence boundary: blob key-value storage and the snapshot codec.
//!
//! # Responsibility
//! - Define the synchronous blob store contract consumed by the store.
//! - Isolate SQLite and JSON details from service orchestration.
//!
//! # Invariants
//! - The service layer never touches SQL or raw JSON directly.
//! - Decoding rejects structurally invalid state; callers decide recovery.

pub mod blob_store;
pub mod snapshot;
