// Per-source mapping context.
//
// One `Context` exists per source title for the duration of a merge run.
// It bundles everything a recopy or assembly step needs to resolve names,
// identifiers and paths. The destination config is not part of the
// context: it is a single-writer value passed by exclusive reference
// through the assembly sequence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::format::gameconfig::GameConfig;

/// Directory under a data root that holds per-stage folders.
pub const STAGES_DIR: &str = "Stages";

/// Mapping context for one source title.
#[derive(Debug)]
pub struct Context<'a> {
    /// Root of the source data tree.
    pub src_root: PathBuf,
    /// Root of the destination data tree.
    pub dst_root: PathBuf,
    /// The source's decoded game config (read-only).
    pub src_config: &'a GameConfig,
    /// Destination name→identifier map, shared across all per-source
    /// contexts. Built once by the reconciler, read-only during assembly.
    pub dst_objects: &'a HashMap<String, usize>,
    /// Source relative path → destination relative path renames, applied
    /// to script and sound-effect references while recopying.
    pub replacements: HashMap<String, String>,
}

impl<'a> Context<'a> {
    pub fn new(
        src_root: impl Into<PathBuf>,
        dst_root: impl Into<PathBuf>,
        src_config: &'a GameConfig,
        dst_objects: &'a HashMap<String, usize>,
        replacements: HashMap<String, String>,
    ) -> Self {
        Self {
            src_root: src_root.into(),
            dst_root: dst_root.into(),
            src_config,
            dst_objects,
            replacements,
        }
    }

    /// Name of the source object with positional identifier `id`.
    pub fn src_object_name(&self, id: u8) -> Option<&str> {
        self.src_config.object_name(id as usize)
    }

    /// Unified identifier for `name`, aliases included.
    pub fn dst_object_id(&self, name: &str) -> Option<usize> {
        self.dst_objects.get(name).copied()
    }

    /// Apply the path-rename table to a relative asset reference.
    pub fn replace_path<'s>(&'s self, path: &'s str) -> &'s str {
        self.replacements.get(path).map_or(path, String::as_str)
    }

    pub fn src_stage_dir(&self, folder: &str) -> PathBuf {
        self.src_root.join(STAGES_DIR).join(folder)
    }

    pub fn dst_stage_dir(&self, folder: &str) -> PathBuf {
        self.dst_root.join(STAGES_DIR).join(folder)
    }

    pub fn src_game_config_path(&self) -> PathBuf {
        self.src_root.join("Game").join("GameConfig.bin")
    }
}

/// Destination `Game/GameConfig.bin` path under a data root.
pub fn game_config_path(root: &Path) -> PathBuf {
    root.join("Game").join("GameConfig.bin")
}
