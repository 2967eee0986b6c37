//! Spatial audio track components.
//!
//! A track is an entity with two position components that are deliberately
//! kept apart:
//! - [`Track`] – identity plus the static `initial_position` snapshot taken
//!   when an animation is applied. This is the only position the strategy
//!   resolver ever reads.
//! - [`CurrentPosition`] – the live, animated position written every tick by
//!   [`apply_track_positions`](crate::systems::output::apply_track_positions).
//!
//! Because they are separate components, change detection on [`Track`] fires
//! only for edits of the static snapshot and never for playback updates, so
//! formation offsets cannot be re-derived from a moving position.

use std::fmt;

use bevy_ecs::prelude::Component;
use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Stable identifier of a spatial audio track.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TrackId(pub u32);

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Track identity and its static rest position.
#[derive(Component, Clone, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    /// Position the track rests at when no animation drives it.
    pub initial_position: DVec3,
}

impl Track {
    pub fn new(id: u32, name: impl Into<String>, initial_position: DVec3) -> Self {
        Track {
            id: TrackId(id),
            name: name.into(),
            initial_position,
        }
    }
}

/// Live position of a track, in the domain convention.
#[derive(Component, Clone, Copy, Debug, PartialEq, Default)]
pub struct CurrentPosition(pub DVec3);

/// Plain snapshot handed to the strategy resolver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackSnapshot {
    pub id: TrackId,
    pub initial_position: DVec3,
    pub current_position: DVec3,
}

impl TrackSnapshot {
    pub fn new(id: TrackId, initial_position: DVec3) -> Self {
        TrackSnapshot {
            id,
            initial_position,
            current_position: initial_position,
        }
    }

    pub fn from_components(track: &Track, current: Option<&CurrentPosition>) -> Self {
        TrackSnapshot {
            id: track.id,
            initial_position: track.initial_position,
            current_position: current.map_or(track.initial_position, |c| c.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_new() {
        let track = Track::new(3, "violin", DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(track.id, TrackId(3));
        assert_eq!(track.name, "violin");
        assert_eq!(track.initial_position, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_snapshot_defaults_current_to_initial() {
        let track = Track::new(1, "a", DVec3::new(4.0, 0.0, 0.0));
        let snap = TrackSnapshot::from_components(&track, None);
        assert_eq!(snap.current_position, snap.initial_position);
    }

    #[test]
    fn test_snapshot_keeps_live_position_separate() {
        let track = Track::new(1, "a", DVec3::new(4.0, 0.0, 0.0));
        let live = CurrentPosition(DVec3::new(9.0, 9.0, 9.0));
        let snap = TrackSnapshot::from_components(&track, Some(&live));
        assert_eq!(snap.initial_position, DVec3::new(4.0, 0.0, 0.0));
        assert_eq!(snap.current_position, DVec3::new(9.0, 9.0, 9.0));
    }

    #[test]
    fn test_track_id_display() {
        assert_eq!(TrackId(7).to_string(), "#7");
    }
}
