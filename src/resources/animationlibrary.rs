//! Animation definition registry.
//!
//! Definitions are validated on insertion and stored immutably. Replacing a
//! definition under the same id bumps a global revision counter, which the
//! resolver cache compares against to know its resolutions are stale.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use log::info;
use rustc_hash::FxHashMap;

use crate::animation::definition::AnimationDefinition;
use crate::animation::error::EngineError;

#[derive(Debug, Clone)]
pub struct LibraryEntry {
    pub definition: Arc<AnimationDefinition>,
    pub revision: u64,
}

/// Central registry of validated animation definitions keyed by id.
#[derive(Resource, Debug, Default)]
pub struct AnimationLibrary {
    entries: FxHashMap<String, LibraryEntry>,
    next_revision: u64,
}

impl AnimationLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store `definition`, replacing any previous one with the
    /// same id. Returns the new revision.
    pub fn insert(&mut self, definition: AnimationDefinition) -> Result<u64, EngineError> {
        definition.validate()?;
        self.next_revision += 1;
        let revision = self.next_revision;
        let replaced = self.entries.insert(
            definition.id.clone(),
            LibraryEntry {
                definition: Arc::new(definition),
                revision,
            },
        );
        if let Some(old) = replaced {
            info!(
                "Replaced animation '{}' (revision {} -> {})",
                old.definition.id, old.revision, revision
            );
        }
        Ok(revision)
    }

    pub fn get(&self, id: &str) -> Option<&LibraryEntry> {
        self.entries.get(id)
    }

    pub fn definition(&self, id: &str) -> Result<Arc<AnimationDefinition>, EngineError> {
        self.entries
            .get(id)
            .map(|e| Arc::clone(&e.definition))
            .ok_or_else(|| EngineError::UnknownAnimation(id.to_string()))
    }

    pub fn revision(&self, id: &str) -> Option<u64> {
        self.entries.get(id).map(|e| e.revision)
    }

    pub fn remove(&mut self, id: &str) -> Option<LibraryEntry> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::definition::MotionType;

    fn def(id: &str) -> AnimationDefinition {
        AnimationDefinition::new(id, MotionType::Circular, 4.0).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let mut lib = AnimationLibrary::new();
        lib.insert(def("a")).unwrap();
        assert!(lib.contains("a"));
        assert_eq!(lib.definition("a").unwrap().motion_type, MotionType::Circular);
    }

    #[test]
    fn test_replace_bumps_revision() {
        let mut lib = AnimationLibrary::new();
        let r1 = lib.insert(def("a")).unwrap();
        let r2 = lib.insert(def("a").with_loop(true)).unwrap();
        assert!(r2 > r1);
        assert_eq!(lib.revision("a"), Some(r2));
        assert_eq!(lib.len(), 1);
    }

    #[test]
    fn test_invalid_definition_rejected() {
        let mut lib = AnimationLibrary::new();
        let bad = def("a").with_parameter("radius", f64::NAN);
        assert!(lib.insert(bad).is_err());
        assert!(lib.is_empty());
    }

    #[test]
    fn test_unknown_animation() {
        let lib = AnimationLibrary::new();
        assert_eq!(
            lib.definition("nope").unwrap_err(),
            EngineError::UnknownAnimation("nope".into())
        );
    }
}
