// Asset format codecs.
//
// One encoder/decoder pair per asset kind, each a mutual inverse of the
// other for every value a decoder can produce. Game configs exist in two
// revisions with different object and stage record layouts; the caller
// selects the revision explicitly, it is never sniffed from content.
//
// # Modules
//
// - `gameconfig` — per-title game configuration (rev-3 and rev-4 layouts)
// - `stageconfig` — per-stage object/palette/sfx configuration
// - `act`        — per-act entity placement list
// - `background` — stage background layer description

pub mod act;
pub mod background;
pub mod gameconfig;
pub mod stageconfig;

// Re-export key types for convenience.
pub use act::{Act, ActEntity, EntityAttrs};
pub use background::{BackgroundLayer, ScrollInfo, StageBackground};
pub use gameconfig::{GameConfig, GameObject, Revision, Stage, StageCategory, Variable};
pub use stageconfig::{StageConfig, StageObject};
