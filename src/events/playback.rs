//! Playback commands, per-tick outputs and lifecycle notifications.
//!
//! Messages (read/written through `MessageReader`/`MessageWriter`):
//! - [`PlaybackCommand`] – host → engine requests, applied by
//!   [`process_playback_commands`](crate::systems::playback::process_playback_commands)
//! - [`TrackPositionMessage`] – one evaluated position per track and tick
//! - [`TrackFaultMessage`] – a track failed to evaluate and holds its position
//! - [`PlaybackLifecycleMessage`] – created/started/paused/... notifications
//!
//! The observer event [`PlaybackFinishedEvent`] is triggered when a
//! non-looping instance completes, so hosts can react immediately (for
//! example with [`observe_return_to_rest`]).

use bevy_ecs::observer::On;
use bevy_ecs::prelude::*;
use glam::DVec3;
use log::debug;

use crate::animation::clock::InstanceId;
use crate::animation::error::EngineError;
use crate::animation::strategy::StrategyConfig;
use crate::components::track::{Track, TrackId};
use crate::components::tween::TweenPosition;
use crate::resources::engineconfig::EngineConfig;

/// Requests to the playback engine.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    /// Create an instance of `animation_id` on `tracks`, optionally starting
    /// it in the same tick.
    Create {
        animation_id: String,
        tracks: Vec<TrackId>,
        strategy: StrategyConfig,
        autostart: bool,
    },
    Start(InstanceId),
    Pause(InstanceId),
    Resume(InstanceId),
    Stop(InstanceId),
    SetStrategy {
        instance: InstanceId,
        strategy: StrategyConfig,
    },
}

impl PlaybackCommand {
    /// Instance the command targets, `None` for `Create`.
    pub fn instance(&self) -> Option<InstanceId> {
        match self {
            PlaybackCommand::Create { .. } => None,
            PlaybackCommand::Start(id)
            | PlaybackCommand::Pause(id)
            | PlaybackCommand::Resume(id)
            | PlaybackCommand::Stop(id) => Some(*id),
            PlaybackCommand::SetStrategy { instance, .. } => Some(*instance),
        }
    }
}

/// Position of one track at the current tick, in the domain convention.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct TrackPositionMessage {
    pub instance: InstanceId,
    pub track: TrackId,
    pub position: DVec3,
}

/// Evaluation of a track failed this tick; the track keeps its last position.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct TrackFaultMessage {
    pub instance: InstanceId,
    pub track: TrackId,
    pub error: EngineError,
}

#[derive(Message, Debug, Clone, PartialEq)]
pub enum PlaybackLifecycleMessage {
    Created {
        instance: InstanceId,
        animation_id: String,
    },
    Started(InstanceId),
    Paused(InstanceId),
    Resumed(InstanceId),
    /// Diagnostic only; emitted when the loop counter grows.
    Looped {
        instance: InstanceId,
        loop_count: u32,
    },
    /// Non-looping instance completed on every track.
    Finished(InstanceId),
    Stopped(InstanceId),
    /// A command could not be applied.
    Rejected {
        instance: Option<InstanceId>,
        error: EngineError,
    },
}

/// Triggered once when a non-looping instance completes.
///
/// `final_positions` holds the end-of-path position of every track that
/// evaluated without a fault. Each was also emitted as a
/// [`TrackPositionMessage`] when its track finished.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PlaybackFinishedEvent {
    pub instance: InstanceId,
    pub final_positions: Vec<(TrackId, DVec3)>,
}

/// Observer that eases finished tracks back to their initial position.
///
/// Enabled by [`EngineConfig::return_to_rest`]. Inserts a [`TweenPosition`]
/// from the final position to [`Track::initial_position`]; the tween runs on
/// its own clock and playback never waits for it.
pub fn observe_return_to_rest(
    trigger: On<PlaybackFinishedEvent>,
    config: Res<EngineConfig>,
    tracks: Query<(Entity, &Track)>,
    mut commands: Commands,
) {
    if !config.return_to_rest {
        return;
    }
    let event = trigger.event();
    for (entity, track) in tracks.iter() {
        let Some(from) = event
            .final_positions
            .iter()
            .find(|(id, _)| *id == track.id)
            .map(|(_, pos)| *pos)
        else {
            continue;
        };
        debug!(
            "Track {} returning to rest over {}s",
            track.id, config.return_duration
        );
        commands.entity(entity).insert(
            TweenPosition::new(from, track.initial_position, config.return_duration)
                .with_easing(config.return_easing),
        );
    }
}
