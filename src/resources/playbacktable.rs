//! Playback instance table.
//!
//! The single owner of every [`PlaybackInstance`]. Clock transitions go
//! through the table's `start`/`pause`/`resume`/`stop`, which delegate to the
//! clock operations; nothing else mutates instance state.

use bevy_ecs::prelude::Resource;
use glam::DVec3;
use log::info;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::animation::clock::{InstanceId, PlaybackInstance, PlaybackState, Timestamp};
use crate::animation::error::EngineError;
use crate::animation::strategy::StrategyConfig;
use crate::components::track::TrackId;

/// One instance plus the strategy it is resolved with.
#[derive(Debug, Clone)]
pub struct PlaybackEntry {
    pub instance: PlaybackInstance,
    pub strategy: StrategyConfig,
    /// Bumped by [`PlaybackTable::set_strategy`].
    pub strategy_revision: u64,
    /// Tracks of a non-looping instance that reached the end of the path,
    /// with the final position when it could be evaluated.
    pub finished_tracks: SmallVec<[(TrackId, Option<DVec3>); 8]>,
}

impl PlaybackEntry {
    pub fn is_track_finished(&self, track: TrackId) -> bool {
        self.finished_tracks.iter().any(|(id, _)| *id == track)
    }

    /// Final positions of the tracks that finished with a valid position.
    pub fn final_positions(&self) -> Vec<(TrackId, DVec3)> {
        self.finished_tracks
            .iter()
            .filter_map(|(id, pos)| pos.map(|p| (*id, p)))
            .collect()
    }
}

#[derive(Resource, Debug, Default)]
pub struct PlaybackTable {
    entries: FxHashMap<InstanceId, PlaybackEntry>,
    next_id: u64,
    next_revision: u64,
}

impl PlaybackTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new instance in the `Created` state.
    ///
    /// The strategy and the track list are validated here, before the
    /// instance exists. A track may be bound only once per instance.
    pub fn create(
        &mut self,
        animation_id: impl Into<String>,
        track_ids: impl IntoIterator<Item = TrackId>,
        strategy: StrategyConfig,
    ) -> Result<InstanceId, EngineError> {
        strategy.validate()?;
        let track_ids: SmallVec<[TrackId; 8]> = track_ids.into_iter().collect();
        for (i, track) in track_ids.iter().enumerate() {
            if track_ids[..i].contains(track) {
                return Err(EngineError::InvalidStrategy(format!(
                    "track {} is bound more than once",
                    track
                )));
            }
        }
        self.next_id += 1;
        self.next_revision += 1;
        let id = InstanceId(self.next_id);
        let instance = PlaybackInstance::new(id, animation_id, track_ids);
        info!(
            "Created instance {} of '{}' on {} track(s)",
            id,
            instance.animation_id,
            instance.track_ids.len()
        );
        self.entries.insert(
            id,
            PlaybackEntry {
                instance,
                strategy,
                strategy_revision: self.next_revision,
                finished_tracks: SmallVec::new(),
            },
        );
        Ok(id)
    }

    fn entry_mut(&mut self, id: InstanceId) -> Result<&mut PlaybackEntry, EngineError> {
        self.entries
            .get_mut(&id)
            .ok_or(EngineError::UnknownInstance(id))
    }

    pub fn start(&mut self, id: InstanceId, now: Timestamp) -> Result<(), EngineError> {
        let entry = self.entry_mut(id)?;
        entry.finished_tracks.clear();
        entry.instance.start(now)
    }

    pub fn pause(&mut self, id: InstanceId, now: Timestamp) -> Result<(), EngineError> {
        self.entry_mut(id)?.instance.pause(now)
    }

    pub fn resume(&mut self, id: InstanceId, now: Timestamp) -> Result<(), EngineError> {
        self.entry_mut(id)?.instance.resume(now)
    }

    pub fn stop(&mut self, id: InstanceId, now: Timestamp) -> Result<(), EngineError> {
        self.entry_mut(id)?.instance.stop(now)
    }

    /// Replace the strategy of an instance. Invalidates its resolution.
    pub fn set_strategy(
        &mut self,
        id: InstanceId,
        strategy: StrategyConfig,
    ) -> Result<(), EngineError> {
        strategy.validate()?;
        self.next_revision += 1;
        let revision = self.next_revision;
        let entry = self.entry_mut(id)?;
        entry.strategy = strategy;
        entry.strategy_revision = revision;
        Ok(())
    }

    pub fn get(&self, id: InstanceId) -> Option<&PlaybackEntry> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: InstanceId) -> Option<&mut PlaybackEntry> {
        self.entries.get_mut(&id)
    }

    pub fn state(&self, id: InstanceId) -> Option<PlaybackState> {
        self.entries.get(&id).map(|e| e.instance.state())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&InstanceId, &PlaybackEntry)> {
        self.entries.iter()
    }

    /// Instance ids in ascending order, for deterministic iteration.
    pub fn ids(&self) -> Vec<InstanceId> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<PlaybackEntry> {
        self.entries.remove(&id)
    }

    /// Drop every `Stopped` instance and return their ids.
    pub fn purge_stopped(&mut self) -> Vec<InstanceId> {
        let stopped: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.instance.state() == PlaybackState::Stopped)
            .map(|(id, _)| *id)
            .collect();
        for id in &stopped {
            self.entries.remove(id);
        }
        stopped
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
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_create_assigns_unique_ids() {
        let mut table = PlaybackTable::new();
        let a = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        let b = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        assert_ne!(a, b);
        assert_eq!(table.state(a), Some(PlaybackState::Created));
    }

    #[test]
    fn test_invalid_strategy_rejected_before_creation() {
        let mut table = PlaybackTable::new();
        let bad = StrategyConfig::independent().with_phase_offset(f64::NAN);
        assert!(matches!(
            table.create("x", [TrackId(1)], bad),
            Err(EngineError::InvalidStrategy(_))
        ));
        assert!(table.is_empty());
    }

    #[test]
    fn test_duplicate_tracks_rejected_before_creation() {
        let mut table = PlaybackTable::new();
        let strategy = StrategyConfig::independent().with_phase_offset(0.5);
        assert!(matches!(
            table.create("x", [TrackId(1), TrackId(2), TrackId(1)], strategy),
            Err(EngineError::InvalidStrategy(_))
        ));
        assert!(table.is_empty());

        let id = table
            .create("x", [TrackId(2), TrackId(1)], StrategyConfig::default())
            .unwrap();
        let bound = &table.get(id).unwrap().instance.track_ids;
        assert_eq!(bound.as_slice(), &[TrackId(2), TrackId(1)]);
    }

    #[test]
    fn test_clock_transitions_through_table() {
        let mut table = PlaybackTable::new();
        let id = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        table.start(id, Duration::from_secs(1)).unwrap();
        table.pause(id, Duration::from_secs(3)).unwrap();
        assert_eq!(table.state(id), Some(PlaybackState::Paused));
        table.resume(id, Duration::from_secs(10)).unwrap();
        let elapsed = table.get(id).unwrap().instance.elapsed(Duration::from_secs(10));
        assert_eq!(elapsed.unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn test_unknown_instance() {
        let mut table = PlaybackTable::new();
        assert_eq!(
            table.start(InstanceId(99), Duration::ZERO),
            Err(EngineError::UnknownInstance(InstanceId(99)))
        );
    }

    #[test]
    fn test_set_strategy_bumps_revision() {
        let mut table = PlaybackTable::new();
        let id = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        let before = table.get(id).unwrap().strategy_revision;
        table.set_strategy(id, StrategyConfig::default().with_phase_offset(1.0)).unwrap();
        assert!(table.get(id).unwrap().strategy_revision > before);
    }

    #[test]
    fn test_purge_stopped() {
        let mut table = PlaybackTable::new();
        let a = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        let b = table.create("x", [TrackId(1)], StrategyConfig::default()).unwrap();
        table.stop(a, Duration::ZERO).unwrap();
        assert_eq!(table.purge_stopped(), vec![a]);
        assert!(table.contains(b));
    }
}
