//! rsdkmerge: binary asset codec and merge/patch engine for hybrid
//! Retro-engine data trees.
//!
//! The crate provides:
//! - Symmetric codecs for each asset kind across both config revisions (`format`)
//! - Object table reconciliation and the patch-and-recopy pipeline (`merge`)
//! - Byte-cursor primitives (`binio`) and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```no_run
//! use rsdkmerge::format::gameconfig::Revision;
//!
//! let bytes = std::fs::read("one/Data/Game/GameConfig.bin").unwrap();
//! let config = Revision::Rev4.decode(&bytes).unwrap();
//! assert_eq!(Revision::Rev4.encode(&config), bytes);
//! ```

pub mod binio;
pub mod error;
pub mod format;
pub mod io;
pub mod merge;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{CodecError, Error};
