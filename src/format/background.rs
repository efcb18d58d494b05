// Stage background codec.
//
// Layer scroll/parallax description. The merge never edits backgrounds; it
// decodes and immediately re-encodes them as a fidelity check, so this
// codec exists to prove the bytes survive the trip.

use crate::binio::{Reader, Writer};
use crate::error::CodecError;

/// Highest valid scroll/layer behavior value.
pub const MAX_BEHAVIOR: u8 = 3;

// ---------------------------------------------------------------------------
// Entity model
// ---------------------------------------------------------------------------

/// One horizontal or vertical scroll line group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollInfo {
    pub relative_speed: u16,
    pub constant_speed: u8,
    pub behavior: u8,
}

/// One background layer with its chunk layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundLayer {
    pub width: u8,
    pub height: u8,
    pub behavior: u8,
    pub relative_speed: u16,
    pub constant_speed: u8,
    /// Row-major chunk references, `width * height` entries.
    pub layout: Vec<u16>,
}

/// Decoded stage background.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StageBackground {
    pub h_scroll: Vec<ScrollInfo>,
    pub v_scroll: Vec<ScrollInfo>,
    pub layers: Vec<BackgroundLayer>,
}

impl StageBackground {
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut r = Reader::new(bytes);

        let h_scroll = read_scroll_list(&mut r)?;
        let v_scroll = read_scroll_list(&mut r)?;

        let layer_count = r.read_u8()? as usize;
        let mut layers = Vec::with_capacity(layer_count);
        for _ in 0..layer_count {
            let width = r.read_u8()?;
            let height = r.read_u8()?;
            let behavior = read_behavior(&mut r)?;
            let relative_speed = r.read_u16()?;
            let constant_speed = r.read_u8()?;
            let mut layout = Vec::with_capacity(width as usize * height as usize);
            for _ in 0..width as usize * height as usize {
                layout.push(r.read_u16()?);
            }
            layers.push(BackgroundLayer {
                width,
                height,
                behavior,
                relative_speed,
                constant_speed,
                layout,
            });
        }

        r.finish()?;

        Ok(StageBackground {
            h_scroll,
            v_scroll,
            layers,
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = Writer::new();
        write_scroll_list(&mut w, &self.h_scroll);
        write_scroll_list(&mut w, &self.v_scroll);
        w.write_u8(self.layers.len() as u8);
        for layer in &self.layers {
            debug_assert_eq!(layer.layout.len(), layer.width as usize * layer.height as usize);
            w.write_u8(layer.width);
            w.write_u8(layer.height);
            w.write_u8(layer.behavior);
            w.write_u16(layer.relative_speed);
            w.write_u8(layer.constant_speed);
            for &chunk in &layer.layout {
                w.write_u16(chunk);
            }
        }
        w.into_inner()
    }
}

fn read_behavior(r: &mut Reader<'_>) -> Result<u8, CodecError> {
    let offset = r.position();
    let behavior = r.read_u8()?;
    if behavior > MAX_BEHAVIOR {
        return Err(CodecError::Malformed {
            offset,
            detail: format!("scroll behavior {behavior} out of range 0..={MAX_BEHAVIOR}"),
        });
    }
    Ok(behavior)
}

fn read_scroll_list(r: &mut Reader<'_>) -> Result<Vec<ScrollInfo>, CodecError> {
    let count = r.read_u8()? as usize;
    let mut list = Vec::with_capacity(count);
    for _ in 0..count {
        let relative_speed = r.read_u16()?;
        let constant_speed = r.read_u8()?;
        let behavior = read_behavior(r)?;
        list.push(ScrollInfo {
            relative_speed,
            constant_speed,
            behavior,
        });
    }
    Ok(list)
}

fn write_scroll_list(w: &mut Writer, list: &[ScrollInfo]) {
    w.write_u8(list.len() as u8);
    for info in list {
        w.write_u16(info.relative_speed);
        w.write_u8(info.constant_speed);
        w.write_u8(info.behavior);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
