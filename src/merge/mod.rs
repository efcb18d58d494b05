// Cross-source merge engine.
//
// - `objects`  — unified object table construction and id translation
// - `context`  — per-source mapping context threaded through every operation
// - `recopy`   — generic decode / patch / re-encode pipeline
// - `assembly` — per-stage assembly driver

pub mod assembly;
pub mod context;
pub mod objects;
pub mod recopy;

pub use assembly::{StageRequest, assemble_stage};
pub use context::Context;
pub use objects::{ObjectTable, ObjectTableBuilder, merge_variables};
pub use recopy::{RecopyStats, Recopyable, identity_patch, recopy};
