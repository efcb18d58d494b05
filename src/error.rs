// Error taxonomy for the codec layer and the merge pipeline.
//
// Codecs operate on byte buffers and know nothing about files, so they
// report the path-free `CodecError`. The file-level layers lift those into
// the crate-wide `Error` with `CodecError::at()`, attaching the offending
// path so a failed run names the asset that broke.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Codec-level errors
// ---------------------------------------------------------------------------

/// Error produced while decoding a byte buffer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The stream ended before a fixed or length-prefixed read completed.
    #[error("truncated input at offset {offset}: needed {needed} more bytes, {remaining} left")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },

    /// A structurally present but semantically invalid field.
    #[error("malformed data at offset {offset}: {detail}")]
    Malformed { offset: usize, detail: String },
}

impl CodecError {
    /// Attach the path of the asset being decoded.
    pub fn at(self, path: &Path) -> Error {
        match self {
            CodecError::Truncated { offset, needed, .. } => Error::TruncatedInput {
                path: path.to_path_buf(),
                offset,
                needed,
            },
            CodecError::Malformed { offset, detail } => Error::MalformedAsset {
                path: path.to_path_buf(),
                offset,
                detail,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline errors
// ---------------------------------------------------------------------------

/// Error surfaced by the merge pipeline. Every failure aborts the run;
/// nothing here is recovered locally.
#[derive(Debug, Error)]
pub enum Error {
    /// An asset ended before a read completed.
    #[error("{path}: truncated input at offset {offset} (needed {needed} more bytes)")]
    TruncatedInput {
        path: PathBuf,
        offset: usize,
        needed: usize,
    },

    /// An asset holds a semantically invalid field.
    #[error("{path}: malformed asset at offset {offset}: {detail}")]
    MalformedAsset {
        path: PathBuf,
        offset: usize,
        detail: String,
    },

    /// An expected input file does not exist.
    #[error("source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// An input file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// No stage record matches the requested act and source folder.
    #[error("no stage with act {act:?} in folder {folder:?}")]
    StageNotFound { act: String, folder: String },

    /// An alias names a canonical object that was never inserted.
    #[error("alias {alias:?} refers to {canonical:?}, which is not in the merged object table")]
    UnknownAlias { alias: String, canonical: String },

    /// A source object has no identifier in the merged table.
    #[error("object {name:?} has no identifier in the merged object table")]
    UnmappedObject { name: String },

    /// The destination file could not be created or written.
    #[error("cannot write {path}: {source}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
