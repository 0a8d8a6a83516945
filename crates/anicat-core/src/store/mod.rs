//! Local profile storage
//!
//! - `backend`: versioned key-value stores (memory, files)
//! - `profile`: watchlists and personal info on top of a backend

pub mod backend;
pub mod profile;

pub use backend::{BlobStore, FileStore, MemoryStore, VersionedBlob};
pub use profile::ProfileStore;
