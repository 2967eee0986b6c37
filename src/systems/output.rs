//! Output side of the tick: track components, the output thread and message
//! bookkeeping.
//!
//! - [`apply_track_positions`] writes evaluated positions into
//!   [`CurrentPosition`]. Playback takes precedence over a running rest
//!   tween, which is removed.
//! - [`forward_track_positions`] packs the tick's positions into one
//!   [`PositionFrame`] and pushes it through the [`OutputBridge`].
//! - [`output_thread`] runs on its own OS thread and hands frames to the
//!   [`PositionSink`].
//! - [`update_playback_messages`] advances the engine's message queues once
//!   per tick.

use bevy_ecs::prelude::*;
use crossbeam_channel::Receiver;
use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::components::track::{CurrentPosition, Track, TrackId};
use crate::components::tween::TweenPosition;
use crate::events::playback::{
    PlaybackCommand, PlaybackLifecycleMessage, TrackFaultMessage, TrackPositionMessage,
};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::outputbridge::{
    FramePosition, OutputBridge, OutputCmd, PositionFrame, PositionSink,
};
use crate::resources::worldtime::WorldTime;

/// Copy this tick's [`TrackPositionMessage`]s into the track entities.
///
/// A tween inserted during this tick (for example by the return-to-rest
/// observer of a finishing instance) is kept.
pub fn apply_track_positions(
    mut reader: MessageReader<TrackPositionMessage>,
    mut tracks: Query<(
        Entity,
        &Track,
        Option<&mut CurrentPosition>,
        Option<Ref<TweenPosition>>,
    )>,
    mut commands: Commands,
) {
    let mut latest: FxHashMap<TrackId, glam::DVec3> = FxHashMap::default();
    for msg in reader.read() {
        latest.insert(msg.track, msg.position);
    }
    if latest.is_empty() {
        return;
    }
    for (entity, track, current, tween) in tracks.iter_mut() {
        let Some(position) = latest.get(&track.id) else {
            continue;
        };
        match current {
            Some(mut current) => current.0 = *position,
            None => {
                commands.entity(entity).insert(CurrentPosition(*position));
            }
        }
        if tween.is_some_and(|tw| !tw.is_added()) {
            commands.entity(entity).remove::<TweenPosition>();
        }
    }
}

/// Send every position of this tick to the output thread as one frame.
pub fn forward_track_positions(
    bridge: Option<Res<OutputBridge>>,
    world_time: Res<WorldTime>,
    config: Res<EngineConfig>,
    mut reader: MessageReader<TrackPositionMessage>,
) {
    let convention = config.convention();
    let positions: Vec<FramePosition> = reader
        .read()
        .map(|msg| FramePosition {
            instance: msg.instance,
            track: msg.track,
            position: msg.position,
            render: convention.to_render(msg.position),
        })
        .collect();
    let Some(bridge) = bridge else {
        return;
    };
    if positions.is_empty() {
        return;
    }
    let frame = PositionFrame {
        frame: world_time.frame_count,
        now: world_time.now,
        positions,
    };
    // the receiver is gone only during shutdown
    let _ = bridge.tx_cmd.send(OutputCmd::Frame(frame));
}

/// Advance the engine's message queues.
///
/// Run first in the schedule so that commands written by the host before
/// the tick and every message written during the tick stay readable until
/// the next tick.
pub fn update_playback_messages(
    mut commands: ResMut<Messages<PlaybackCommand>>,
    mut positions: ResMut<Messages<TrackPositionMessage>>,
    mut faults: ResMut<Messages<TrackFaultMessage>>,
    mut lifecycle: ResMut<Messages<PlaybackLifecycleMessage>>,
) {
    commands.update();
    positions.update();
    faults.update();
    lifecycle.update();
}

/// Entry point of the output thread.
///
/// Blocks on the command channel and forwards every frame to `sink` until
/// [`OutputCmd::Shutdown`] arrives or the bridge is dropped.
pub fn output_thread(rx_cmd: Receiver<OutputCmd>, mut sink: impl PositionSink) {
    debug!(
        "output thread starting (id={:?})",
        std::thread::current().id()
    );
    let mut frames = 0u64;
    loop {
        match rx_cmd.recv() {
            Ok(OutputCmd::Frame(frame)) => {
                frames += 1;
                sink.frame(&frame);
            }
            Ok(OutputCmd::Shutdown) => break,
            Err(_) => {
                warn!("output bridge dropped without shutdown");
                break;
            }
        }
    }
    sink.finish();
    debug!("output thread exiting after {} frame(s)", frames);
}
