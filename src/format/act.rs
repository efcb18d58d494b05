// Act entity placement codec.
//
// An act file is a chunk layout plus a placed-entity list. Each entity's
// `object_type` is a positional identifier into the owning source's game
// config object list; the merge rebinds those identifiers, so the codec
// keeps them addressable while treating the per-entity attribute payload
// as an opaque block whose length is derived from the attribute mask.

use bitflags::bitflags;

use crate::binio::{Reader, Writer};
use crate::error::CodecError;

bitflags! {
    /// Presence mask for the optional per-entity attribute payload.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct EntityAttrs: u16 {
        const STATE      = 1 << 0;
        const DIRECTION  = 1 << 1;
        const SCALE      = 1 << 2;
        const ROTATION   = 1 << 3;
        const DRAW_ORDER = 1 << 4;
        const PRIORITY   = 1 << 5;
        const ALPHA      = 1 << 6;
        const ANIMATION  = 1 << 7;
        const ANIM_SPEED = 1 << 8;
        const FRAME      = 1 << 9;
        const INK_EFFECT = 1 << 10;
        const VALUE0     = 1 << 11;
        const VALUE1     = 1 << 12;
        const VALUE2     = 1 << 13;
        const VALUE3     = 1 << 14;
    }
}

impl EntityAttrs {
    /// Byte length of the attribute payload selected by this mask.
    pub fn payload_len(self) -> usize {
        const WIDTHS: [(EntityAttrs, usize); 15] = [
            (EntityAttrs::STATE, 4),
            (EntityAttrs::DIRECTION, 1),
            (EntityAttrs::SCALE, 4),
            (EntityAttrs::ROTATION, 4),
            (EntityAttrs::DRAW_ORDER, 1),
            (EntityAttrs::PRIORITY, 1),
            (EntityAttrs::ALPHA, 1),
            (EntityAttrs::ANIMATION, 1),
            (EntityAttrs::ANIM_SPEED, 4),
            (EntityAttrs::FRAME, 1),
            (EntityAttrs::INK_EFFECT, 1),
            (EntityAttrs::VALUE0, 4),
            (EntityAttrs::VALUE1, 4),
            (EntityAttrs::VALUE2, 4),
            (EntityAttrs::VALUE3, 4),
        ];
        WIDTHS
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, width)| width)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Entity model
// ---------------------------------------------------------------------------

/// One placed entity. `extra` is the raw attribute payload; its length is
/// always `attrs.payload_len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActEntity {
    pub attrs: EntityAttrs,
    pub object_type: u8,
    pub property_value: u8,
    pub x: i32,
    pub y: i32,
    pub extra: Vec<u8>,
}

/// Decoded act file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Act {
    pub title: String,
    pub active_layers: [u8; 4],
    pub layer_midpoint: u8,
    /// Chunk layout dimensions.
    pub width: u8,
    pub height: u8,
    /// Row-major chunk references, `width * height` entries.
    pub layout: Vec<u16>,
    pub entities: Vec<ActEntity>,
}

impl Act {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);

        let title = r.read_string()?;
        let mut active_layers = [0u8; 4];
        for slot in &mut active_layers {
            *slot = r.read_u8()?;
        }
        let layer_midpoint = r.read_u8()?;

        let width = r.read_u8()?;
        let height = r.read_u8()?;
        let mut layout = Vec::with_capacity(width as usize * height as usize);
        for _ in 0..width as usize * height as usize {
            layout.push(r.read_u16()?);
        }

        let entity_count = r.read_u16()? as usize;
        let mut entities = Vec::with_capacity(entity_count);
        for _ in 0..entity_count {
            let attr_offset = r.position();
            let raw = r.read_u16()?;
            let attrs = EntityAttrs::from_bits(raw).ok_or_else(|| CodecError::Malformed {
                offset: attr_offset,
                detail: format!("entity attribute mask {raw:#06X} has undefined bits"),
            })?;
            let object_type = r.read_u8()?;
            let property_value = r.read_u8()?;
            let x = r.read_i32()?;
            let y = r.read_i32()?;
            let extra = r.read_bytes(attrs.payload_len())?.to_vec();
            entities.push(ActEntity {
                attrs,
                object_type,
                property_value,
                x,
                y,
                extra,
            });
        }

        r.finish()?;

        Ok(Act {
            title,
            active_layers,
            layer_midpoint,
            width,
            height,
            layout,
            entities,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        debug_assert_eq!(self.layout.len(), self.width as usize * self.height as usize);
        debug_assert!(self.entities.len() <= u16::MAX as usize);

        let mut w = Writer::new();
        w.write_string(&self.title);
        for &layer in &self.active_layers {
            w.write_u8(layer);
        }
        w.write_u8(self.layer_midpoint);
        w.write_u8(self.width);
        w.write_u8(self.height);
        for &chunk in &self.layout {
            w.write_u16(chunk);
        }
        w.write_u16(self.entities.len() as u16);
        for entity in &self.entities {
            debug_assert_eq!(entity.extra.len(), entity.attrs.payload_len());
            w.write_u16(entity.attrs.bits());
            w.write_u8(entity.object_type);
            w.write_u8(entity.property_value);
            w.write_i32(entity.x);
            w.write_i32(entity.y);
            w.write_bytes(&entity.extra);
        }
        w.into_inner()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
