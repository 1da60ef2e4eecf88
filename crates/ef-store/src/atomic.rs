//! Atomic artifact I/O.
//!
//! Writers stage into a temp file in the destination directory and rename
//! over the target, so a reader never observes a partial write. Readers
//! copy the artifact aside before parsing, so a concurrent atomic replace
//! cannot swap the file mid-read.

use crate::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

pub fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path.parent().ok_or_else(|| StoreError::InvalidPath {
        message: format!("{} has no parent directory", path.display()),
    })?;
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn read_atomic(path: &Path) -> StoreResult<Vec<u8>> {
    let dir = path.parent().ok_or_else(|| StoreError::InvalidPath {
        message: format!("{} has no parent directory", path.display()),
    })?;
    if !path.exists() {
        return Err(StoreError::ConfigMissing {
            path: path.to_path_buf(),
        });
    }
    let tmp = NamedTempFile::new_in(dir)?;
    match std::fs::copy(path, tmp.path()) {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::ConfigMissing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => return Err(StoreError::Io(e)),
    }
    Ok(std::fs::read(tmp.path())?)
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| StoreError::ArtifactCorrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    write_atomic(path, &bytes)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let bytes = read_atomic(path)?;
    serde_json::from_slice(&bytes).map_err(|e| StoreError::ArtifactCorrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}

pub fn write_bincode_atomic<T: Serialize>(path: &Path, value: &T) -> StoreResult<()> {
    let bytes = bincode::serialize(value).map_err(|e| StoreError::ArtifactCorrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    write_atomic(path, &bytes)
}

pub fn read_bincode<T: DeserializeOwned>(path: &Path) -> StoreResult<T> {
    let bytes = read_atomic(path)?;
    bincode::deserialize(&bytes).map_err(|e| StoreError::ArtifactCorrupt {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })
}
