// Patch-and-recopy engine.
//
// The one pipeline every entity-bearing asset goes through on its way into
// the destination tree: decode the whole file, visit every entity in
// on-disk order, re-encode, write atomically. Call sites only supply the
// per-entity rewrite; the codec work is done once here.
//
// A patch callback may mutate the entity it is handed and nothing else, and
// returns whether it changed anything. Entities are visited in place, so a
// recopy can never add or remove one: the entity count is invariant.

use std::path::Path;

use crate::error::{CodecError, Error};
use crate::format::act::Act;
use crate::format::stageconfig::StageConfig;
use crate::io::{read_asset, write_atomic};
use crate::merge::context::Context;

// ---------------------------------------------------------------------------
// Recopyable assets
// ---------------------------------------------------------------------------

/// An asset kind the recopy pipeline can carry.
///
/// `patch` drives the supplied callback over every entity in file order and
/// performs the kind's context-dependent rewrites (identifier rebinding for
/// act entities, path renames for stage configs).
pub trait Recopyable: Sized {
    type Entity;

    /// Asset kind label for logging.
    const KIND: &'static str;

    fn decode(bytes: &[u8]) -> Result<Self, CodecError>;

    fn encode(&self) -> Vec<u8>;

    fn entity_count(&self) -> usize;

    /// Returns the number of entities the callback reported changing.
    fn patch(
        &mut self,
        ctx: &Context<'_>,
        patch_fn: &mut dyn FnMut(&Context<'_>, &mut Self::Entity, &str) -> bool,
    ) -> Result<usize, Error>;
}

impl Recopyable for StageConfig {
    type Entity = crate::format::stageconfig::StageObject;

    const KIND: &'static str = "stage config";

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        StageConfig::decode(bytes)
    }

    fn encode(&self) -> Vec<u8> {
        StageConfig::encode(self)
    }

    fn entity_count(&self) -> usize {
        self.objects.len()
    }

    fn patch(
        &mut self,
        ctx: &Context<'_>,
        patch_fn: &mut dyn FnMut(&Context<'_>, &mut Self::Entity, &str) -> bool,
    ) -> Result<usize, Error> {
        let mut patched = 0;
        for obj in &mut self.objects {
            let name = obj.name.clone();
            if patch_fn(ctx, obj, &name) {
                patched += 1;
            }
            if let Some(renamed) = ctx.replacements.get(&obj.script) {
                obj.script = renamed.clone();
            }
        }
        for path in &mut self.sound_effects {
            if let Some(renamed) = ctx.replacements.get(path) {
                *path = renamed.clone();
            }
        }
        Ok(patched)
    }
}

impl Recopyable for Act {
    type Entity = crate::format::act::ActEntity;

    const KIND: &'static str = "act";

    fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Act::decode(bytes)
    }

    fn encode(&self) -> Vec<u8> {
        Act::encode(self)
    }

    fn entity_count(&self) -> usize {
        self.entities.len()
    }

    fn patch(
        &mut self,
        ctx: &Context<'_>,
        patch_fn: &mut dyn FnMut(&Context<'_>, &mut Self::Entity, &str) -> bool,
    ) -> Result<usize, Error> {
        let mut patched = 0;
        for entity in &mut self.entities {
            let name = ctx.src_object_name(entity.object_type).map(str::to_owned);
            if patch_fn(ctx, entity, name.as_deref().unwrap_or("")) {
                patched += 1;
            }
            // Rebind the identifier into the unified table. Types outside
            // the source table (stage-local actors) pass through as-is.
            if let Some(name) = name {
                let id = ctx
                    .dst_object_id(&name)
                    .ok_or(Error::UnmappedObject { name })?;
                entity.object_type = id as u8;
            }
        }
        Ok(patched)
    }
}

// ---------------------------------------------------------------------------
// Recopy
// ---------------------------------------------------------------------------

/// Statistics returned by `recopy()`.
#[derive(Debug, Clone, Copy)]
pub struct RecopyStats {
    /// Entities visited (identical before and after).
    pub entities: usize,
    /// Entities the patch callback reported changing.
    pub patched: usize,
    /// Source file size in bytes.
    pub bytes_in: usize,
    /// Destination file size in bytes.
    pub bytes_out: usize,
}

/// Pass-through patch: leaves every entity untouched.
pub fn identity_patch<E>(_: &Context<'_>, _: &mut E, _: &str) -> bool {
    false
}

/// Decode `src`, run `patch_fn` over every entity in file order, re-encode
/// and write the result to `dst` atomically.
///
/// The caller is responsible for `dst`'s parent directory existing.
pub fn recopy<A, F>(
    ctx: &Context<'_>,
    src: &Path,
    dst: &Path,
    mut patch_fn: F,
) -> Result<RecopyStats, Error>
where
    A: Recopyable,
    F: FnMut(&Context<'_>, &mut A::Entity, &str) -> bool,
{
    let bytes = read_asset(src)?;
    let mut asset = A::decode(&bytes).map_err(|e| e.at(src))?;
    let entities = asset.entity_count();

    let patched = asset.patch(ctx, &mut patch_fn)?;
    debug_assert_eq!(asset.entity_count(), entities);

    let out = asset.encode();
    write_atomic(dst, &out)?;

    log::debug!(
        "recopied {} {} -> {} ({entities} entities, {patched} patched, {} -> {} bytes)",
        A::KIND,
        src.display(),
        dst.display(),
        bytes.len(),
        out.len(),
    );

    Ok(RecopyStats {
        entities,
        patched,
        bytes_in: bytes.len(),
        bytes_out: out.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use crate::format::act::{ActEntity, EntityAttrs};
    use crate::format::gameconfig::{GameConfig, GameObject};
    use crate::format::stageconfig::StageObject;

    fn source_config(names: &[&str]) -> GameConfig {
        GameConfig {
            objects: names
                .iter()
                .map(|n| GameObject {
                    name: (*n).into(),
                    script: String::new(),
                })
                .collect(),
            ..Default::default()
        }
    }

    fn identity_ids(names: &[&str]) -> HashMap<String, usize> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| ((*n).into(), i))
            .collect()
    }

    fn entity(object_type: u8, property_value: u8) -> ActEntity {
        ActEntity {
            attrs: EntityAttrs::empty(),
            object_type,
            property_value,
            x: 0,
            y: 0,
            extra: Vec::new(),
        }
    }

    fn sample_act(entities: Vec<ActEntity>) -> Act {
        Act {
            title: "TEST".into(),
            entities,
            ..Default::default()
        }
    }

    #[test]
    fn entity_count_is_invariant() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Act1.bin");
        let dst = dir.path().join("Act1.out.bin");

        let names = ["Ring", "Spring", "Title Card"];
        let config = source_config(&names);
        let ids = identity_ids(&names);
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let act = sample_act(vec![entity(0, 0), entity(1, 0), entity(2, 0)]);
        std::fs::write(&src, act.encode()).unwrap();

        let stats = recopy::<Act, _>(&ctx, &src, &dst, |_, e, _| {
            e.property_value = 99;
            true
        })
        .unwrap();
        assert_eq!(stats.entities, 3);
        assert_eq!(stats.patched, 3);

        let out = Act::decode(&std::fs::read(&dst).unwrap()).unwrap();
        assert_eq!(out.entities.len(), 3);
        assert!(out.entities.iter().all(|e| e.property_value == 99));
    }

    #[test]
    fn title_card_patch_leaves_others_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Act2.bin");
        let dst = dir.path().join("Act2.out.bin");

        let names = ["Ring", "Title Card", "Spring"];
        let config = source_config(&names);
        let ids = identity_ids(&names);
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let act = sample_act(vec![entity(0, 7), entity(1, 7), entity(2, 7)]);
        let src_bytes = act.encode();
        std::fs::write(&src, &src_bytes).unwrap();

        recopy::<Act, _>(&ctx, &src, &dst, |_, e, name| {
            if name == "Title Card" {
                e.property_value = 3;
                true
            } else {
                false
            }
        })
        .unwrap();

        let out_bytes = std::fs::read(&dst).unwrap();
        let out = Act::decode(&out_bytes).unwrap();
        assert_eq!(out.entities[1].property_value, 3);
        assert_eq!(out.entities[0], act.entities[0]);
        assert_eq!(out.entities[2], act.entities[2]);
        // With an identity table, only the patched byte differs.
        let diffs: Vec<usize> = src_bytes
            .iter()
            .zip(&out_bytes)
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(diffs.len(), 1);
    }

    #[test]
    fn act_entities_are_rebound_to_unified_identifiers() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Act1.bin");
        let dst = dir.path().join("Act1.out.bin");

        let config = source_config(&["Ring", "Lamp Post"]);
        // The unified table placed Ring at 5, and Lamp Post aliases
        // Star Post at 9.
        let mut ids = HashMap::new();
        ids.insert("Ring".to_owned(), 5usize);
        ids.insert("Star Post".to_owned(), 9usize);
        ids.insert("Lamp Post".to_owned(), 9usize);
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let act = sample_act(vec![entity(0, 0), entity(1, 0), entity(200, 0)]);
        std::fs::write(&src, act.encode()).unwrap();

        recopy::<Act, _>(&ctx, &src, &dst, identity_patch).unwrap();

        let out = Act::decode(&std::fs::read(&dst).unwrap()).unwrap();
        assert_eq!(out.entities[0].object_type, 5);
        assert_eq!(out.entities[1].object_type, 9);
        // Type 200 is outside the source table and passes through.
        assert_eq!(out.entities[2].object_type, 200);
    }

    #[test]
    fn unmapped_object_aborts_recopy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Act1.bin");
        let dst = dir.path().join("Act1.out.bin");

        let config = source_config(&["Transporter"]);
        let ids = HashMap::new();
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        std::fs::write(&src, sample_act(vec![entity(0, 0)]).encode()).unwrap();

        let err = recopy::<Act, _>(&ctx, &src, &dst, identity_patch).unwrap_err();
        assert!(matches!(err, Error::UnmappedObject { name } if name == "Transporter"));
        assert!(!dst.exists());
    }

    #[test]
    fn stage_config_identity_recopy_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("StageConfig.bin");
        let dst = dir.path().join("StageConfig.out.bin");

        let config = source_config(&[]);
        let ids = HashMap::new();
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let stage_config = StageConfig {
            load_global_objects: true,
            palette: vec![7; crate::format::gameconfig::PALETTE_SIZE],
            objects: vec![StageObject {
                name: "Platform".into(),
                script: "Zone01/Platform.txt".into(),
            }],
            sound_effects: vec!["Zone01/Crash.wav".into()],
        };
        let src_bytes = stage_config.encode();
        std::fs::write(&src, &src_bytes).unwrap();

        recopy::<StageConfig, _>(&ctx, &src, &dst, identity_patch).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), src_bytes);
    }

    #[test]
    fn stage_config_recopy_applies_path_renames() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("StageConfig.bin");
        let dst = dir.path().join("StageConfig.out.bin");

        let config = source_config(&[]);
        let ids = HashMap::new();
        let mut replacements = HashMap::new();
        replacements.insert(
            "Special/PlayerObject.txt".to_owned(),
            "Special/PlayerObject1.txt".to_owned(),
        );
        replacements.insert(
            "Special/Warp.wav".to_owned(),
            "Special/Warp1.wav".to_owned(),
        );
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, replacements);

        let stage_config = StageConfig {
            load_global_objects: false,
            palette: vec![0; crate::format::gameconfig::PALETTE_SIZE],
            objects: vec![StageObject {
                name: "Player Object".into(),
                script: "Special/PlayerObject.txt".into(),
            }],
            sound_effects: vec!["Special/Warp.wav".into(), "Special/Ding.wav".into()],
        };
        std::fs::write(&src, stage_config.encode()).unwrap();

        recopy::<StageConfig, _>(&ctx, &src, &dst, identity_patch).unwrap();

        let out = StageConfig::decode(&std::fs::read(&dst).unwrap()).unwrap();
        assert_eq!(out.objects[0].script, "Special/PlayerObject1.txt");
        assert_eq!(out.sound_effects[0], "Special/Warp1.wav");
        assert_eq!(out.sound_effects[1], "Special/Ding.wav");
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let config = source_config(&[]);
        let ids = HashMap::new();
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let err = recopy::<Act, _>(
            &ctx,
            &dir.path().join("Act9.bin"),
            &dir.path().join("out.bin"),
            identity_patch,
        )
        .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound { .. }));
    }

    #[test]
    fn malformed_source_carries_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("Act1.bin");
        std::fs::write(&src, [0xFFu8; 3]).unwrap();

        let config = source_config(&[]);
        let ids = HashMap::new();
        let ctx = Context::new(dir.path(), dir.path(), &config, &ids, HashMap::new());

        let err = recopy::<Act, _>(&ctx, &src, &dir.path().join("out.bin"), identity_patch)
            .unwrap_err();
        match err {
            Error::TruncatedInput { path, .. } => assert_eq!(path, src),
            other => panic!("unexpected error: {other}"),
        }
    }
}
