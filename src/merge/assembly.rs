// Per-stage assembly driver.
//
// Walks one stage through Located -> FilesCopied -> ConfigPatched ->
// ActPatched -> BackgroundRoundTripped -> Registered. The destination
// stage record is appended last, so a failure anywhere leaves the
// destination config exactly as it was for this stage.

use crate::error::Error;
use crate::format::act::Act;
use crate::format::background::StageBackground;
use crate::format::gameconfig::{GameConfig, Stage, StageCategory};
use crate::format::stageconfig::StageConfig;
use crate::io::{copy_file, create_dir_all, read_asset, write_atomic};
use crate::merge::context::Context;
use crate::merge::recopy::{identity_patch, recopy};

/// Entity name the act patch rewrites with the visual act number.
pub const TITLE_CARD_OBJECT: &str = "Title Card";

/// Title-card property value for stages without visual act numbering.
pub const TITLE_CARD_NO_ACT: u8 = 4;

/// Fixed auxiliary files copied binary-identical per stage.
pub const AUX_FILES: [&str; 4] = [
    "16x16Tiles.gif",
    "128x128Tiles.bin",
    "Backgrounds.bin",
    "CollisionMasks.bin",
];

/// Stage configuration file name within a stage folder.
pub const STAGE_CONFIG_FILE: &str = "StageConfig.bin";

/// Background descriptor file name within a stage folder.
pub const BACKGROUNDS_FILE: &str = "Backgrounds.bin";

/// Act file name for `act_number`.
pub fn act_file_name(act_number: u32) -> String {
    format!("Act{act_number}.bin")
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// One stage to pull from a source into the destination.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub category: StageCategory,
    /// Display title without act suffix.
    pub title: String,
    /// Act number used for lookup and storage.
    pub act_number: u32,
    /// Act number shown to the player. `None` follows `act_number`;
    /// `Some(0)` suppresses the suffix entirely.
    pub visual_act: Option<u32>,
    /// Stage folder under the source's `Stages/`.
    pub src_folder: String,
    /// Stage folder under the destination's `Stages/`.
    pub dst_folder: String,
}

impl StageRequest {
    fn effective_visual_act(&self) -> u32 {
        self.visual_act.unwrap_or(self.act_number)
    }

    /// `"{title} {visual_act}"`, or the bare title when the visual act
    /// number is zero.
    pub fn display_name(&self) -> String {
        match self.effective_visual_act() {
            0 => self.title.clone(),
            n => format!("{} {n}", self.title),
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Assemble one stage's full asset bundle into the destination tree and
/// register it in `dst_config`.
pub fn assemble_stage(
    ctx: &Context<'_>,
    dst_config: &mut GameConfig,
    request: &StageRequest,
) -> Result<(), Error> {
    // Located
    let act_text = request.act_number.to_string();
    let src_stage = ctx
        .src_config
        .stages(request.category)
        .iter()
        .find(|s| s.act == act_text && s.path == request.src_folder)
        .ok_or_else(|| Error::StageNotFound {
            act: act_text.clone(),
            folder: request.src_folder.clone(),
        })?
        .clone();

    let src_dir = ctx.src_stage_dir(&request.src_folder);
    let dst_dir = ctx.dst_stage_dir(&request.dst_folder);
    create_dir_all(&dst_dir)?;

    // FilesCopied
    for file in AUX_FILES {
        copy_file(&src_dir.join(file), &dst_dir.join(file))?;
    }

    // ConfigPatched: no named rewrite at present, but the hook stays so
    // per-stage overrides have somewhere to live.
    recopy::<StageConfig, _>(
        ctx,
        &src_dir.join(STAGE_CONFIG_FILE),
        &dst_dir.join(STAGE_CONFIG_FILE),
        identity_patch,
    )?;

    // ActPatched
    let visual_act = request.effective_visual_act();
    let act_file = act_file_name(request.act_number);
    recopy::<Act, _>(
        ctx,
        &src_dir.join(&act_file),
        &dst_dir.join(&act_file),
        |_, entity, name| {
            if name == TITLE_CARD_OBJECT {
                entity.property_value = if visual_act > 0 {
                    visual_act as u8
                } else {
                    TITLE_CARD_NO_ACT
                };
                true
            } else {
                false
            }
        },
    )?;

    // BackgroundRoundTripped: decode then re-encode, proving the copied
    // descriptor survives the codec unchanged.
    let bg_src = src_dir.join(BACKGROUNDS_FILE);
    let background = StageBackground::decode(&read_asset(&bg_src)?).map_err(|e| e.at(&bg_src))?;
    write_atomic(&dst_dir.join(BACKGROUNDS_FILE), &background.encode())?;

    // Registered
    let stage = Stage {
        name: request.display_name(),
        act: act_text,
        mode: src_stage.mode,
        path: request.dst_folder.clone(),
    };
    log::info!(
        "registered {} stage {:?} (act {}) from {}",
        request.category.label(),
        stage.name,
        stage.act,
        request.src_folder,
    );
    dst_config.stages_mut(request.category).push(stage);

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
