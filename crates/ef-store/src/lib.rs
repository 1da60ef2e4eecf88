//! ef-store: artifact storage on a shared filesystem.
//!
//! The store is the only channel for communication between pipeline
//! processes. Writers write-to-temp-then-rename; readers copy-then-read;
//! cross-process exclusion comes from sentinel file locks.

pub mod atomic;
pub mod lock;
pub mod paths;
pub mod records;
pub mod store;

pub use lock::{FileLock, LockManager};
pub use paths::Layout;
pub use records::{
    payload_digest, ConfigData, ResultMetadata, ResultRecord, StatusRecord, VariationOutcome,
};
pub use store::ArtifactStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Artifact corrupt at {path}: {detail}")]
    ArtifactCorrupt { path: std::path::PathBuf, detail: String },

    #[error("Configuration missing: {path}")]
    ConfigMissing { path: std::path::PathBuf },

    #[error("Lock timeout on {resource} after {waited_ms} ms")]
    LockTimeout { resource: String, waited_ms: u64 },

    #[error("Invalid path: {message}")]
    InvalidPath { message: String },
}
