//! JSON record I/O shared by both entity kinds.
//!
//! Writes go through a sibling temp file and a rename so a failed update
//! can never leave a torn record where a valid previous version was.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Error, Result};

/// Serialize a record as pretty JSON and replace `path` atomically.
pub(crate) fn write_atomic<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(record)?;
    write_bytes_atomic(path, json.as_bytes())
}

/// Replace `path` with `bytes` via temp file + rename.
pub(crate) fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidName {
            name: path.display().to_string(),
            reason: "path has no file name",
        })?
        .to_string_lossy()
        .to_string();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));

    fs::write(&tmp, bytes).map_err(|e| Error::IoWrite {
        path: tmp.clone(),
        source: e,
    })?;
    fs::rename(&tmp, path).map_err(|e| Error::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse a JSON record from `path`.
pub(crate) fn load<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).map_err(|e| Error::IoRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&raw).map_err(|e| Error::Malformed {
        path: path.to_path_buf(),
        source: e,
    })
}
