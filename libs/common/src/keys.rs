//! Loading PEM keys from configuration values

use std::io;
use std::path::{Path, PathBuf};

/// Resolve a key setting that holds either inline PEM text or a path to a
/// PEM file. Relative paths are tried against the working directory first,
/// then against the workspace root.
pub fn read_key(value: &str) -> io::Result<String> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let key = std::fs::read_to_string(value).or_else(|err| {
        if Path::new(value).is_absolute() {
            return Err(err);
        }
        std::fs::read_to_string(workspace_root().join(value))
    })?;

    Ok(key.trim().to_string())
}

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}
