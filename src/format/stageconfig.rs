// Stage configuration codec.
//
// Shared by both game config revisions: the per-stage record layout never
// changed between them.

use crate::binio::{Reader, Writer};
use crate::error::CodecError;
use crate::format::gameconfig::PALETTE_SIZE;

// ---------------------------------------------------------------------------
// Entity model
// ---------------------------------------------------------------------------

/// One stage-local scripted object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageObject {
    pub name: String,
    pub script: String,
}

/// Decoded stage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageConfig {
    /// Whether the stage also loads the global object scripts.
    pub load_global_objects: bool,
    /// Opaque stage palette blob, `PALETTE_SIZE` bytes.
    pub palette: Vec<u8>,
    pub objects: Vec<StageObject>,
    pub sound_effects: Vec<String>,
}

impl StageConfig {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);

        let flag = r.read_u8()?;
        if flag > 1 {
            return Err(CodecError::Malformed {
                offset: 0,
                detail: format!("load-global flag {flag} is not 0 or 1"),
            });
        }
        let palette = r.read_bytes(PALETTE_SIZE)?.to_vec();

        let object_count = r.read_u8()? as usize;
        let mut objects = Vec::with_capacity(object_count);
        for _ in 0..object_count {
            let name = r.read_string()?;
            let script = r.read_string()?;
            objects.push(StageObject { name, script });
        }

        let sfx_count = r.read_u8()? as usize;
        let mut sound_effects = Vec::with_capacity(sfx_count);
        for _ in 0..sfx_count {
            sound_effects.push(r.read_string()?);
        }

        r.finish()?;

        Ok(StageConfig {
            load_global_objects: flag != 0,
            palette,
            objects,
            sound_effects,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        debug_assert_eq!(self.palette.len(), PALETTE_SIZE);
        debug_assert!(self.objects.len() <= u8::MAX as usize);

        let mut w = Writer::new();
        w.write_u8(self.load_global_objects as u8);
        w.write_bytes(&self.palette);
        w.write_u8(self.objects.len() as u8);
        for obj in &self.objects {
            w.write_string(&obj.name);
            w.write_string(&obj.script);
        }
        w.write_u8(self.sound_effects.len() as u8);
        for path in &self.sound_effects {
            w.write_string(path);
        }
        w.into_inner()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
