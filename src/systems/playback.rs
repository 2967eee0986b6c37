//! Playback command processing.
//!
//! [`process_playback_commands`] is the only system that drives clock
//! transitions from outside the tick engine. Every command is applied with
//! the tick's `WorldTime::now`, never with a fresh clock read, so pause and
//! resume land exactly on tick boundaries.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::animation::clock::{PlaybackState, Timestamp};
use crate::animation::error::EngineError;
use crate::events::playback::{PlaybackCommand, PlaybackLifecycleMessage};
use crate::resources::animationlibrary::AnimationLibrary;
use crate::resources::integrationstates::IntegrationStates;
use crate::resources::playbacktable::PlaybackTable;
use crate::resources::worldtime::WorldTime;

/// Apply every pending [`PlaybackCommand`].
///
/// Failures never panic: they are logged at `warn` and reported as
/// [`PlaybackLifecycleMessage::Rejected`].
pub fn process_playback_commands(
    mut reader: MessageReader<PlaybackCommand>,
    world_time: Res<WorldTime>,
    library: Res<AnimationLibrary>,
    mut table: ResMut<PlaybackTable>,
    mut lifecycle: MessageWriter<PlaybackLifecycleMessage>,
) {
    let now = world_time.now;
    for command in reader.read() {
        if let Err(error) = apply_command(command, now, &library, &mut table, &mut lifecycle) {
            warn!("Rejected playback command {:?}: {}", command, error);
            lifecycle.write(PlaybackLifecycleMessage::Rejected {
                instance: command.instance(),
                error,
            });
        }
    }
}

fn apply_command(
    command: &PlaybackCommand,
    now: Timestamp,
    library: &AnimationLibrary,
    table: &mut PlaybackTable,
    lifecycle: &mut MessageWriter<PlaybackLifecycleMessage>,
) -> Result<(), EngineError> {
    match command {
        PlaybackCommand::Create {
            animation_id,
            tracks,
            strategy,
            autostart,
        } => {
            if !library.contains(animation_id) {
                return Err(EngineError::UnknownAnimation(animation_id.clone()));
            }
            if tracks.is_empty() {
                return Err(EngineError::InvalidStrategy(
                    "an instance needs at least one track".into(),
                ));
            }
            let id = table.create(animation_id.clone(), tracks.iter().copied(), strategy.clone())?;
            lifecycle.write(PlaybackLifecycleMessage::Created {
                instance: id,
                animation_id: animation_id.clone(),
            });
            if *autostart {
                table.start(id, now)?;
                lifecycle.write(PlaybackLifecycleMessage::Started(id));
            }
        }
        PlaybackCommand::Start(id) => {
            table.start(*id, now)?;
            lifecycle.write(PlaybackLifecycleMessage::Started(*id));
        }
        PlaybackCommand::Pause(id) => {
            let before = table.state(*id);
            table.pause(*id, now)?;
            if before != Some(PlaybackState::Paused) {
                lifecycle.write(PlaybackLifecycleMessage::Paused(*id));
            }
        }
        PlaybackCommand::Resume(id) => {
            table.resume(*id, now)?;
            lifecycle.write(PlaybackLifecycleMessage::Resumed(*id));
        }
        PlaybackCommand::Stop(id) => {
            let before = table.state(*id);
            table.stop(*id, now)?;
            if before != Some(PlaybackState::Stopped) {
                lifecycle.write(PlaybackLifecycleMessage::Stopped(*id));
            }
        }
        PlaybackCommand::SetStrategy { instance, strategy } => {
            table.set_strategy(*instance, strategy.clone())?;
            debug!("Strategy of {} replaced", instance);
        }
    }
    Ok(())
}

/// Drop instances stopped during the previous tick, together with their
/// integration state.
pub fn purge_stopped_instances(
    mut table: ResMut<PlaybackTable>,
    mut states: ResMut<IntegrationStates>,
) {
    for id in table.purge_stopped() {
        states.clear_instance(id);
        debug!("Purged stopped instance {}", id);
    }
}
