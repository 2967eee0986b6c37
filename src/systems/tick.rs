//! Tick engine.
//!
//! [`playback_tick_system`] runs once per host tick. Every playing instance
//! is evaluated against the same `WorldTime::now`:
//!
//! 1. clock → elapsed time of the instance
//! 2. per resolved track: phase offset, loop/ping-pong → [`TrackTime`]
//! 3. `Pending` tracks are skipped and keep their last position;
//!    `At(t)` tracks are evaluated and emitted; `Finished` tracks emit their
//!    end-of-path position once
//! 4. a non-looping instance whose tracks all finished is stopped and
//!    reported through [`PlaybackLifecycleMessage::Finished`] and
//!    [`PlaybackFinishedEvent`]
//!
//! A failing track is reported with a [`TrackFaultMessage`] and holds its
//! position; the other tracks of the instance keep playing.

use std::time::Duration;

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::animation::clock::{InstanceId, TrackTime, completed_cycles, effective_track_time};
use crate::animation::definition::AnimationDefinition;
use crate::animation::error::EngineError;
use crate::animation::models::{EvalContext, evaluate};
use crate::animation::strategy::ResolvedTrackParameters;
use crate::events::playback::{
    PlaybackFinishedEvent, PlaybackLifecycleMessage, TrackFaultMessage, TrackPositionMessage,
};
use crate::resources::engineconfig::EngineConfig;
use crate::resources::integrationstates::IntegrationStates;
use crate::resources::playbacktable::PlaybackTable;
use crate::resources::resolvedcache::ResolvedCache;
use crate::resources::worldtime::WorldTime;

/// Evaluate one track at `t` seconds on its own timeline.
fn evaluate_track(
    instance: InstanceId,
    definition: &AnimationDefinition,
    track: &ResolvedTrackParameters,
    t: f64,
    physics_step: f64,
    states: &mut IntegrationStates,
) -> Result<glam::DVec3, EngineError> {
    let motion = definition.motion_type;
    let mut ctx = EvalContext::new(track.track_id, track.anchor).with_step(physics_step);
    if motion.is_physics() {
        ctx = ctx.with_state(states.entry(instance, track.track_id));
    }
    let path = evaluate(
        motion,
        &track.parameters,
        t,
        definition.duration_secs(),
        &mut ctx,
    )?;
    let position = track.place(path);
    if position.is_finite() {
        Ok(position)
    } else {
        Err(EngineError::NonFinitePosition {
            track: track.track_id,
        })
    }
}

#[allow(clippy::too_many_arguments)]
pub fn playback_tick_system(
    world_time: Res<WorldTime>,
    config: Res<EngineConfig>,
    cache: Res<ResolvedCache>,
    mut table: ResMut<PlaybackTable>,
    mut states: ResMut<IntegrationStates>,
    mut positions: MessageWriter<TrackPositionMessage>,
    mut faults: MessageWriter<TrackFaultMessage>,
    mut lifecycle: MessageWriter<PlaybackLifecycleMessage>,
    mut commands: Commands,
) {
    let now = world_time.now;
    let physics_step = config.physics_step();

    for id in table.ids() {
        let Some(entry) = table.get_mut(id) else {
            continue;
        };
        if !entry.instance.is_playing() {
            continue;
        }
        let Some(resolved) = cache.get(id) else {
            warn!("{}: no resolved parameters, skipped this tick", id);
            continue;
        };
        let elapsed = match entry.instance.elapsed(now) {
            Ok(elapsed) => elapsed,
            Err(e) => {
                warn!("{}: {}", id, e);
                continue;
            }
        };
        let definition = resolved.definition.as_ref();
        let timing = definition.timing();

        for track in &resolved.resolution.tracks {
            if entry.is_track_finished(track.track_id) {
                continue;
            }
            let (t, finishing) = match effective_track_time(elapsed, timing, track.phase_offset) {
                TrackTime::Pending => continue,
                TrackTime::At(t) => (t.as_secs_f64(), false),
                TrackTime::Finished => (definition.duration_secs(), true),
            };
            let result = evaluate_track(id, definition, track, t, physics_step, &mut states);
            let position = match result {
                Ok(position) => {
                    positions.write(TrackPositionMessage {
                        instance: id,
                        track: track.track_id,
                        position,
                    });
                    Some(position)
                }
                Err(error) => {
                    warn!("{} track {}: {}", id, track.track_id, error);
                    faults.write(TrackFaultMessage {
                        instance: id,
                        track: track.track_id,
                        error,
                    });
                    None
                }
            };
            if finishing {
                debug!("{} track {} reached the end of its path", id, track.track_id);
                entry.finished_tracks.push((track.track_id, position));
            }
        }

        if timing.looping {
            let first_phase = resolved
                .resolution
                .tracks
                .iter()
                .map(|t| t.phase_offset)
                .min()
                .unwrap_or(Duration::ZERO);
            let cycles = completed_cycles(elapsed, timing.duration, first_phase);
            if entry.instance.record_loop(cycles) {
                debug!("{} looped ({})", id, cycles);
                lifecycle.write(PlaybackLifecycleMessage::Looped {
                    instance: id,
                    loop_count: cycles,
                });
            }
            continue;
        }

        let all_finished = resolved
            .resolution
            .tracks
            .iter()
            .all(|t| entry.is_track_finished(t.track_id));
        if !all_finished {
            continue;
        }
        if let Err(e) = entry.instance.stop(now) {
            warn!("{}: {}", id, e);
            continue;
        }
        info!("{} finished '{}'", id, definition.id);
        lifecycle.write(PlaybackLifecycleMessage::Finished(id));
        commands.trigger(PlaybackFinishedEvent {
            instance: id,
            final_positions: entry.final_positions(),
        });
    }
}
