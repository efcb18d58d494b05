// Unified object table construction.
//
// Every source title carries its own object list whose order defines the
// identifiers its binary assets reference. The merged title needs one
// table covering all sources, plus a translation from each source's
// identifiers to the unified ones.

use std::collections::HashMap;

use crate::error::Error;
use crate::format::gameconfig::{GameObject, Variable};

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds the unified object table. Insert sources in precedence order:
/// the first source to define a name wins, later duplicates are ignored.
#[derive(Debug, Default)]
pub struct ObjectTableBuilder {
    objects: Vec<GameObject>,
    ids: HashMap<String, usize>,
}

impl ObjectTableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one source's object list. Names already present keep their
    /// earlier identifier and definition.
    pub fn add_source(&mut self, objects: &[GameObject]) {
        for obj in objects {
            if !self.ids.contains_key(&obj.name) {
                self.ids.insert(obj.name.clone(), self.objects.len());
                self.objects.push(obj.clone());
            }
        }
    }

    /// Bind `alias` to the identifier already held by `canonical`. The
    /// alias becomes a second name for the same slot; no object is added.
    pub fn alias(&mut self, alias: &str, canonical: &str) -> Result<(), Error> {
        let id = *self
            .ids
            .get(canonical)
            .ok_or_else(|| Error::UnknownAlias {
                alias: alias.to_owned(),
                canonical: canonical.to_owned(),
            })?;
        self.ids.insert(alias.to_owned(), id);
        Ok(())
    }

    pub fn finish(self) -> ObjectTable {
        ObjectTable {
            objects: self.objects,
            ids: self.ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Finished table
// ---------------------------------------------------------------------------

/// The destination's unified object table: the final object list (insertion
/// order = identifier order) and the name→identifier map including aliases.
#[derive(Debug, Clone)]
pub struct ObjectTable {
    objects: Vec<GameObject>,
    ids: HashMap<String, usize>,
}

impl ObjectTable {
    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// Name→identifier map, aliases included.
    pub fn ids(&self) -> &HashMap<String, usize> {
        &self.ids
    }

    /// Translation from one source's positional identifiers to unified
    /// identifiers. Fails if any source object resolves to no slot, which
    /// means the manifest is missing an alias for it.
    pub fn translation_for(&self, source: &[GameObject]) -> Result<Vec<usize>, Error> {
        source
            .iter()
            .map(|obj| {
                self.id_of(&obj.name).ok_or_else(|| Error::UnmappedObject {
                    name: obj.name.clone(),
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Variable merge
// ---------------------------------------------------------------------------

/// Deduplicate variables by name across sources. Later sets override the
/// value; the output keeps first-seen ordering.
pub fn merge_variables(sets: &[&[Variable]]) -> Vec<Variable> {
    let mut merged: Vec<Variable> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for set in sets {
        for var in *set {
            match index.get(&var.name) {
                Some(&i) => merged[i].value = var.value,
                None => {
                    index.insert(var.name.clone(), merged.len());
                    merged.push(var.clone());
                }
            }
        }
    }
    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
