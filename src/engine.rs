//! World and schedule assembly.
//!
//! [`setup_world`] inserts every resource, message queue and observer the
//! engine needs; [`build_schedule`] returns the per-tick schedule in its
//! fixed order:
//!
//! 1. `update_playback_messages` – advance message queues
//! 2. `purge_stopped_instances` – drop instances stopped last tick
//! 3. `process_playback_commands` – apply host commands at `now`
//! 4. `refresh_resolved_tracks` – re-resolve stale instances
//! 5. `tween_position_system` – rest easing
//! 6. `playback_tick_system` – evaluate and emit positions
//! 7. `apply_track_positions` – write `CurrentPosition`, playback wins
//! 8. `forward_track_positions` – hand the frame to the output thread
//!
//! A tween attached while a tick runs starts moving on the next tick.
//!
//! [`run_tick`] advances [`WorldTime`] and runs the schedule once, the way
//! the host main loop does.

use std::time::Duration;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;

use crate::events::playback::{
    PlaybackCommand, PlaybackLifecycleMessage, TrackFaultMessage, TrackPositionMessage,
    observe_return_to_rest,
};
use crate::resources::animationlibrary::AnimationLibrary;
use crate::resources::editsession::EditSession;
use crate::resources::engineconfig::EngineConfig;
use crate::resources::integrationstates::IntegrationStates;
use crate::resources::playbacktable::PlaybackTable;
use crate::resources::resolvedcache::ResolvedCache;
use crate::resources::worldtime::WorldTime;
use crate::systems::output::{
    apply_track_positions, forward_track_positions, update_playback_messages,
};
use crate::systems::playback::{process_playback_commands, purge_stopped_instances};
use crate::systems::strategy::refresh_resolved_tracks;
use crate::systems::tick::playback_tick_system;
use crate::systems::time::update_world_time;
use crate::systems::tween::tween_position_system;

/// Insert engine resources, message queues and observers into `world`.
pub fn setup_world(world: &mut World, config: EngineConfig) {
    world.insert_resource(WorldTime::default().with_time_scale(config.time_scale));
    world.insert_resource(config);
    world.insert_resource(AnimationLibrary::new());
    world.insert_resource(PlaybackTable::new());
    world.insert_resource(ResolvedCache::default());
    world.insert_resource(IntegrationStates::default());
    world.insert_resource(EditSession::new());

    world.init_resource::<Messages<PlaybackCommand>>();
    world.init_resource::<Messages<TrackPositionMessage>>();
    world.init_resource::<Messages<TrackFaultMessage>>();
    world.init_resource::<Messages<PlaybackLifecycleMessage>>();

    world.spawn(Observer::new(observe_return_to_rest));
    // Ensure the observer is registered before any system triggers events.
    world.flush();
}

/// The per-tick schedule.
pub fn build_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            update_playback_messages,
            purge_stopped_instances,
            process_playback_commands,
            refresh_resolved_tracks,
            tween_position_system,
            playback_tick_system,
            apply_track_positions,
            forward_track_positions,
        )
            .chain(),
    );
    schedule
}

/// Advance the tick clock by `dt` and run one tick.
pub fn run_tick(world: &mut World, schedule: &mut Schedule, dt: Duration) {
    update_world_time(world, dt);
    schedule.run(world);
    world.clear_trackers();
}
