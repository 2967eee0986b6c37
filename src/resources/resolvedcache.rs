//! Cache of resolved per-track parameters.
//!
//! Written only by
//! [`refresh_resolved_tracks`](crate::systems::strategy::refresh_resolved_tracks),
//! read by the tick system. An entry is reused as long as its
//! [`Fingerprint`] matches the current definition revision, strategy
//! revision and the identity and initial positions of the tracks the
//! instance binds.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::animation::clock::InstanceId;
use crate::animation::definition::AnimationDefinition;
use crate::animation::strategy::Resolution;

/// Inputs a resolution was computed from.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Fingerprint {
    pub definition_revision: u64,
    pub strategy_revision: u64,
    /// Hash of the bound `(TrackId, initial_position)` list.
    pub tracks: u64,
}

impl Fingerprint {
    pub fn same_revisions(&self, other: &Fingerprint) -> bool {
        self.definition_revision == other.definition_revision
            && self.strategy_revision == other.strategy_revision
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub fingerprint: Fingerprint,
    /// World track revision at which `fingerprint.tracks` was last compared.
    pub checked_at: u64,
    pub definition: Arc<AnimationDefinition>,
    pub resolution: Resolution,
}

#[derive(Resource, Debug, Default)]
pub struct ResolvedCache {
    entries: FxHashMap<InstanceId, ResolvedEntry>,
    /// Bumped whenever a `Track` component is added, changed or removed
    /// anywhere in the world. Only gates the per-instance track comparison.
    track_revision: u64,
    /// Number of resolutions computed so far.
    resolve_count: u64,
}

impl ResolvedCache {
    pub fn get(&self, id: InstanceId) -> Option<&ResolvedEntry> {
        self.entries.get(&id)
    }

    pub fn is_fresh(&self, id: InstanceId, fingerprint: Fingerprint) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|e| e.fingerprint == fingerprint)
    }

    /// Record that the entry was compared against the world at `revision`
    /// and found current.
    pub(crate) fn mark_checked(&mut self, id: InstanceId, revision: u64) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.checked_at = revision;
        }
    }

    pub(crate) fn store(&mut self, id: InstanceId, entry: ResolvedEntry) {
        self.resolve_count += 1;
        self.entries.insert(id, entry);
    }

    pub(crate) fn remove(&mut self, id: InstanceId) -> Option<ResolvedEntry> {
        self.entries.remove(&id)
    }

    pub(crate) fn retain(&mut self, keep: impl Fn(InstanceId) -> bool) {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn track_revision(&self) -> u64 {
        self.track_revision
    }

    pub(crate) fn bump_track_revision(&mut self) {
        self.track_revision += 1;
    }

    pub fn resolve_count(&self) -> u64 {
        self.resolve_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
