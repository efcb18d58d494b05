// File-level I/O helpers for the merge pipeline.
//
// All writes are whole-file: content goes to a temporary sibling first and
// is renamed into place, so a crash never leaves a half-written asset.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::Error;

/// Read an input asset fully into memory.
///
/// A missing file is `SourceNotFound`; any other I/O failure is
/// `ReadFailure`.
pub fn read_asset(path: &Path) -> Result<Vec<u8>, Error> {
    fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            Error::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Error::ReadFailure {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })
}

/// Write `bytes` to `path` atomically: the content lands in a temporary
/// sibling which is then renamed over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let wrap = |e: io::Error| Error::WriteFailure {
        path: path.to_path_buf(),
        source: e,
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp_path = PathBuf::from(tmp);

    fs::write(&tmp_path, bytes).map_err(wrap)?;
    fs::rename(&tmp_path, path).map_err(wrap)
}

/// Binary-identical copy, overwriting any existing destination file.
/// Returns the number of bytes copied.
pub fn copy_file(src: &Path, dst: &Path) -> Result<u64, Error> {
    let bytes = read_asset(src)?;
    write_atomic(dst, &bytes)?;
    Ok(bytes.len() as u64)
}

/// Create a directory and its parents.
pub fn create_dir_all(path: &Path) -> Result<(), Error> {
    fs::create_dir_all(path).map_err(|e| Error::WriteFailure {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Hex-encoded SHA-256 of a byte buffer.
#[cfg(feature = "digest")]
pub fn sha256_hex(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for byte in digest {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
