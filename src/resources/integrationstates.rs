//! Integration state of physics-driven tracks, keyed by instance and track.

use bevy_ecs::prelude::Resource;
use rustc_hash::FxHashMap;

use crate::animation::clock::InstanceId;
use crate::animation::models::IntegrationState;
use crate::components::track::TrackId;

#[derive(Resource, Debug, Default)]
pub struct IntegrationStates {
    states: FxHashMap<(InstanceId, TrackId), IntegrationState>,
}

impl IntegrationStates {
    pub fn entry(&mut self, instance: InstanceId, track: TrackId) -> &mut IntegrationState {
        self.states.entry((instance, track)).or_default()
    }

    pub fn get(&self, instance: InstanceId, track: TrackId) -> Option<&IntegrationState> {
        self.states.get(&(instance, track))
    }

    /// Forget every state of `instance`, e.g. after its parameters changed.
    pub fn clear_instance(&mut self, instance: InstanceId) {
        self.states.retain(|(id, _), _| *id != instance);
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
