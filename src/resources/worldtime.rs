//! Tick clock shared by every system.
//!
//! `now` is sampled once per tick by [`update_world_time`] and every
//! playback instance in that tick is evaluated against the same value.
//!
//! [`update_world_time`]: crate::systems::time::update_world_time

use std::time::Duration;

use bevy_ecs::prelude::Resource;

use crate::animation::clock::Timestamp;

#[derive(Resource, Clone, Copy, Debug, PartialEq)]
pub struct WorldTime {
    /// Scaled time since the host started.
    pub now: Timestamp,
    /// Scaled delta of the last tick in seconds.
    pub delta: f64,
    pub time_scale: f64,
    pub frame_count: u64,
}

impl Default for WorldTime {
    fn default() -> Self {
        WorldTime {
            now: Duration::ZERO,
            delta: 0.0,
            time_scale: 1.0,
            frame_count: 0,
        }
    }
}

impl WorldTime {
    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }
}
