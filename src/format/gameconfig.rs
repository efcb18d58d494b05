// Game configuration codec, revisions 3 and 4.
//
// The two revisions share the overall record sequence and differ in the
// object and stage record layouts:
//
//   rev-4 object: name + script reference      rev-3 object: name only
//   rev-4 stage:  path, act, name, mode        rev-3 stage:  path, act, name
//
// Object list order defines the implicit identifiers every other asset in
// the same source references; reordering objects without remapping those
// references corrupts data.

use crate::binio::{Reader, Writer};
use crate::error::CodecError;

/// Size of the opaque master palette blob.
pub const PALETTE_SIZE: usize = 96;

/// Highest valid stage mode value.
pub const MAX_STAGE_MODE: u8 = 3;

// ---------------------------------------------------------------------------
// Entity model
// ---------------------------------------------------------------------------

/// One scripted game object. The name is the stable cross-source join key;
/// the script reference exists only in the rev-4 layout and decodes empty
/// from rev-3 sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameObject {
    pub name: String,
    pub script: String,
}

/// Flat engine variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: i32,
}

/// One catalogued stage. `act` is numeric but stored as text on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub name: String,
    pub act: String,
    pub mode: u8,
    pub path: String,
}

/// The four ordered stage groupings of a game config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageCategory {
    Presentation,
    Regular,
    Bonus,
    Special,
}

impl StageCategory {
    pub const ALL: [StageCategory; 4] = [
        StageCategory::Presentation,
        StageCategory::Regular,
        StageCategory::Bonus,
        StageCategory::Special,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            StageCategory::Presentation => "presentation",
            StageCategory::Regular => "regular",
            StageCategory::Bonus => "bonus",
            StageCategory::Special => "special",
        }
    }
}

/// In-memory game configuration, shared by both revisions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GameConfig {
    pub name: String,
    pub description: String,
    /// Opaque master palette blob, `PALETTE_SIZE` bytes.
    pub palette: Vec<u8>,
    pub objects: Vec<GameObject>,
    pub variables: Vec<Variable>,
    pub sound_effects: Vec<String>,
    pub players: Vec<String>,
    /// The four per-category stage lists, indexed by `StageCategory`.
    /// Prefer `stages()`/`stages_mut()` over direct indexing.
    pub stage_lists: [Vec<Stage>; 4],
}

impl GameConfig {
    pub fn stages(&self, category: StageCategory) -> &[Stage] {
        &self.stage_lists[category.index()]
    }

    pub fn stages_mut(&mut self, category: StageCategory) -> &mut Vec<Stage> {
        &mut self.stage_lists[category.index()]
    }

    /// Name of the object at positional identifier `id`, if any.
    pub fn object_name(&self, id: usize) -> Option<&str> {
        self.objects.get(id).map(|o| o.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Revision selection
// ---------------------------------------------------------------------------

/// Game config format revision. Source identity is always known at call
/// time, so callers pick the codec; nothing is auto-detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Revision {
    Rev3,
    Rev4,
}

impl Revision {
    pub fn label(self) -> &'static str {
        match self {
            Revision::Rev3 => "rev-3",
            Revision::Rev4 => "rev-4",
        }
    }

    /// Decode a game config from `bytes`.
    pub fn decode(self, bytes: &[u8]) -> Result<GameConfig, CodecError> {
        let mut r = Reader::new(bytes);

        let name = r.read_string()?;
        let description = r.read_string()?;
        let palette = r.read_bytes(PALETTE_SIZE)?.to_vec();

        let object_count = r.read_u8()? as usize;
        let mut objects = Vec::with_capacity(object_count);
        for _ in 0..object_count {
            let name = r.read_string()?;
            let script = match self {
                Revision::Rev4 => r.read_string()?,
                Revision::Rev3 => String::new(),
            };
            objects.push(GameObject { name, script });
        }

        let variable_count = r.read_u8()? as usize;
        let mut variables = Vec::with_capacity(variable_count);
        for _ in 0..variable_count {
            let name = r.read_string()?;
            let value = r.read_i32()?;
            variables.push(Variable { name, value });
        }

        let sfx_count = r.read_u8()? as usize;
        let mut sound_effects = Vec::with_capacity(sfx_count);
        for _ in 0..sfx_count {
            sound_effects.push(r.read_string()?);
        }

        let player_count = r.read_u8()? as usize;
        let mut players = Vec::with_capacity(player_count);
        for _ in 0..player_count {
            players.push(r.read_string()?);
        }

        let mut stage_lists: [Vec<Stage>; 4] = Default::default();
        for category in StageCategory::ALL {
            let marker_offset = r.position();
            let marker = r.read_u8()?;
            if marker != category.index() as u8 {
                return Err(CodecError::Malformed {
                    offset: marker_offset,
                    detail: format!(
                        "category marker {marker} where {} ({}) was expected",
                        category.index(),
                        category.label()
                    ),
                });
            }
            let stage_count = r.read_u8()? as usize;
            let list = &mut stage_lists[category.index()];
            list.reserve(stage_count);
            for _ in 0..stage_count {
                list.push(read_stage(self, &mut r)?);
            }
        }

        r.finish()?;

        Ok(GameConfig {
            name,
            description,
            palette,
            objects,
            variables,
            sound_effects,
            players,
            stage_lists,
        })
    }

    /// Encode `config` to bytes. Never fails for values produced by a
    /// successful decode of the same revision.
    pub fn encode(self, config: &GameConfig) -> Vec<u8> {
        debug_assert_eq!(config.palette.len(), PALETTE_SIZE);
        debug_assert!(config.objects.len() <= u8::MAX as usize);

        let mut w = Writer::new();
        w.write_string(&config.name);
        w.write_string(&config.description);
        w.write_bytes(&config.palette);

        w.write_u8(config.objects.len() as u8);
        for obj in &config.objects {
            w.write_string(&obj.name);
            if self == Revision::Rev4 {
                w.write_string(&obj.script);
            }
        }

        w.write_u8(config.variables.len() as u8);
        for var in &config.variables {
            w.write_string(&var.name);
            w.write_i32(var.value);
        }

        w.write_u8(config.sound_effects.len() as u8);
        for path in &config.sound_effects {
            w.write_string(path);
        }

        w.write_u8(config.players.len() as u8);
        for player in &config.players {
            w.write_string(player);
        }

        for category in StageCategory::ALL {
            let list = config.stages(category);
            w.write_u8(category.index() as u8);
            w.write_u8(list.len() as u8);
            for stage in list {
                write_stage(self, &mut w, stage);
            }
        }

        w.into_inner()
    }
}

fn read_stage(revision: Revision, r: &mut Reader<'_>) -> Result<Stage, CodecError> {
    let path = r.read_string()?;
    let act = r.read_string()?;
    let name = r.read_string()?;
    let mode = match revision {
        Revision::Rev4 => {
            let offset = r.position();
            let mode = r.read_u8()?;
            if mode > MAX_STAGE_MODE {
                return Err(CodecError::Malformed {
                    offset,
                    detail: format!("stage mode {mode} out of range 0..={MAX_STAGE_MODE}"),
                });
            }
            mode
        }
        Revision::Rev3 => 0,
    };
    Ok(Stage {
        name,
        act,
        mode,
        path,
    })
}

fn write_stage(revision: Revision, w: &mut Writer, stage: &Stage) {
    w.write_string(&stage.path);
    w.write_string(&stage.act);
    w.write_string(&stage.name);
    if revision == Revision::Rev4 {
        debug_assert!(stage.mode <= MAX_STAGE_MODE);
        w.write_u8(stage.mode);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> GameConfig {
        let mut config = GameConfig {
            name: "HYBRID".into(),
            description: "two titles in one".into(),
            palette: vec![0x11; PALETTE_SIZE],
            objects: vec![
                GameObject {
                    name: "Ring".into(),
                    script: "Global/Ring.txt".into(),
                },
                GameObject {
                    name: "Star Post".into(),
                    script: "Global/StarPost.txt".into(),
                },
            ],
            variables: vec![
                Variable {
                    name: "options.gameMode".into(),
                    value: 1,
                },
                Variable {
                    name: "stage.gameid".into(),
                    value: -1,
                },
            ],
            sound_effects: vec!["Global/Jump.wav".into()],
            players: vec!["PLAYER A".into(), "PLAYER B".into()],
            ..Default::default()
        };
        config.stages_mut(StageCategory::Presentation).push(Stage {
            name: "TITLE SCREEN".into(),
            act: "1".into(),
            mode: 0,
            path: "Title".into(),
        });
        config.stages_mut(StageCategory::Regular).push(Stage {
            name: "MARBLE ZONE 2".into(),
            act: "2".into(),
            mode: 1,
            path: "Zone02".into(),
        });
        config
    }

    #[test]
    fn rev4_roundtrip() {
        let config = sample_config();
        let bytes = Revision::Rev4.encode(&config);
        let decoded = Revision::Rev4.decode(&bytes).unwrap();
        assert_eq!(decoded, config);
        // Byte law: re-encoding a decoded value reproduces the input.
        assert_eq!(Revision::Rev4.encode(&decoded), bytes);
    }

    #[test]
    fn rev3_roundtrip_is_stable() {
        let config = sample_config();
        let bytes = Revision::Rev3.encode(&config);
        let decoded = Revision::Rev3.decode(&bytes).unwrap();
        // Rev-3 drops script references and stage modes.
        assert!(decoded.objects.iter().all(|o| o.script.is_empty()));
        assert!(
            StageCategory::ALL
                .iter()
                .flat_map(|&c| decoded.stages(c))
                .all(|s| s.mode == 0)
        );
        assert_eq!(Revision::Rev3.encode(&decoded), bytes);
    }

    #[test]
    fn rev3_is_shorter_than_rev4() {
        let config = sample_config();
        let v3 = Revision::Rev3.encode(&config);
        let v4 = Revision::Rev4.encode(&config);
        assert!(v3.len() < v4.len());
    }

    #[test]
    fn pinned_minimal_layout() {
        let config = GameConfig {
            name: "G".into(),
            palette: vec![0; PALETTE_SIZE],
            ..Default::default()
        };
        let bytes = Revision::Rev3.encode(&config);
        let mut expected = vec![1, b'G', 0];
        expected.extend_from_slice(&[0u8; PALETTE_SIZE]);
        // object, variable, sfx, player counts
        expected.extend_from_slice(&[0, 0, 0, 0]);
        // four category blocks: marker + empty count
        expected.extend_from_slice(&[0, 0, 1, 0, 2, 0, 3, 0]);
        assert_eq!(bytes, expected);
        assert_eq!(Revision::Rev3.decode(&bytes).unwrap(), config);
    }

    #[test]
    fn rejects_bad_category_marker() {
        let mut config = sample_config();
        for category in StageCategory::ALL {
            config.stages_mut(category).clear();
        }
        let mut bytes = Revision::Rev4.encode(&config);
        // With every list empty the last 8 bytes are the four category
        // blocks: marker 0..=3 followed by a zero count each.
        let marker_pos = bytes.len() - 8;
        assert_eq!(bytes[marker_pos], 0);
        bytes[marker_pos] = 7;
        match Revision::Rev4.decode(&bytes).unwrap_err() {
            CodecError::Malformed { detail, .. } => {
                assert!(detail.contains("category marker 7"), "{detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_out_of_range_stage_mode() {
        let mut config = sample_config();
        config.stages_mut(StageCategory::Presentation).clear();
        let mut bytes = Revision::Rev4.encode(&config);
        // The regular record's mode byte sits right before the two empty
        // trailing category blocks (bonus and special, 2 bytes each).
        let mode_pos = bytes.len() - 5;
        assert_eq!(bytes[mode_pos], 1);
        bytes[mode_pos] = MAX_STAGE_MODE + 1;
        match Revision::Rev4.decode(&bytes).unwrap_err() {
            CodecError::Malformed { detail, .. } => {
                assert!(detail.contains("stage mode"), "{detail}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_truncated_input() {
        let config = sample_config();
        let bytes = Revision::Rev4.encode(&config);
        for cut in [0, 1, 10, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                Revision::Rev4.decode(&bytes[..cut]).is_err(),
                "decode succeeded on {cut}-byte prefix"
            );
        }
    }

    #[test]
    fn rejects_trailing_bytes() {
        let config = sample_config();
        let mut bytes = Revision::Rev4.encode(&config);
        bytes.push(0xEE);
        match Revision::Rev4.decode(&bytes).unwrap_err() {
            CodecError::Malformed { detail, .. } => assert!(detail.contains("trailing")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
