//! Tween update system.
//!
//! [`tween_position_system`] advances every playing
//! [`TweenPosition`](crate::components::tween::TweenPosition) by the tick
//! delta from [`WorldTime`](crate::resources::worldtime::WorldTime) and writes
//! the eased position into the track's
//! [`CurrentPosition`](crate::components::track::CurrentPosition). Finished
//! one-shot tweens are removed.

use bevy_ecs::prelude::*;

use crate::components::track::CurrentPosition;
use crate::components::tween::{LoopMode, TweenPosition};
use crate::resources::worldtime::WorldTime;

/// Advance tween time and handle looping/completion.
pub(crate) fn advance(
    time: &mut f64,
    duration: f64,
    forward: &mut bool,
    playing: &mut bool,
    mode: LoopMode,
    dt: f64,
) {
    let dir = if *forward { 1.0 } else { -1.0 };
    *time += dt * dir;

    let finished_forward = *forward && *time >= duration;
    let finished_backward = !*forward && *time <= 0.0;

    if finished_forward || finished_backward {
        match mode {
            LoopMode::Once => {
                *playing = false;
                *time = time.clamp(0.0, duration);
            }
            LoopMode::Loop => {
                *time = if finished_forward { 0.0 } else { duration };
            }
            LoopMode::PingPong => {
                *forward = !*forward;
                *time = time.clamp(0.0, duration);
            }
        }
    }
}

/// Animate track positions based on [`TweenPosition`] components.
pub fn tween_position_system(
    world_time: Res<WorldTime>,
    mut query: Query<(Entity, &mut CurrentPosition, &mut TweenPosition)>,
    mut commands: Commands,
) {
    let dt = world_time.delta.max(0.0);
    for (entity, mut current, mut tw) in query.iter_mut() {
        if !tw.playing {
            continue;
        }
        let duration = tw.duration.max(0.0);
        let loop_mode = tw.loop_mode;
        let mut t = tw.time;
        let mut forward = tw.forward;
        let mut playing = tw.playing;
        advance(&mut t, duration, &mut forward, &mut playing, loop_mode, dt);
        tw.time = t;
        tw.forward = forward;
        tw.playing = playing;
        current.0 = tw.sample();
        if !playing {
            commands.entity(entity).remove::<TweenPosition>();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_advance_once_stops_at_end() {
        let (mut t, mut fwd, mut playing) = (0.9, true, true);
        advance(&mut t, 1.0, &mut fwd, &mut playing, LoopMode::Once, 0.5);
        assert!(approx_eq(t, 1.0));
        assert!(!playing);
    }

    #[test]
    fn test_advance_loop_wraps() {
        let (mut t, mut fwd, mut playing) = (0.9, true, true);
        advance(&mut t, 1.0, &mut fwd, &mut playing, LoopMode::Loop, 0.5);
        assert!(approx_eq(t, 0.0));
        assert!(playing);
    }

    #[test]
    fn test_advance_ping_pong_reverses() {
        let (mut t, mut fwd, mut playing) = (0.9, true, true);
        advance(&mut t, 1.0, &mut fwd, &mut playing, LoopMode::PingPong, 0.5);
        assert!(approx_eq(t, 1.0));
        assert!(!fwd);
        advance(&mut t, 1.0, &mut fwd, &mut playing, LoopMode::PingPong, 0.25);
        assert!(approx_eq(t, 0.75));
    }

    #[test]
    fn test_system_moves_and_removes_finished_tween() {
        use glam::DVec3;

        let mut world = World::new();
        world.insert_resource(WorldTime {
            delta: 0.5,
            ..Default::default()
        });
        let e = world
            .spawn((
                CurrentPosition(DVec3::ZERO),
                TweenPosition::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), 1.0),
            ))
            .id();
        let mut schedule = Schedule::default();
        schedule.add_systems(tween_position_system);

        schedule.run(&mut world);
        assert!(approx_eq(world.get::<CurrentPosition>(e).unwrap().0.x, 1.0));
        assert!(world.get::<TweenPosition>(e).is_some());

        schedule.run(&mut world);
        assert_eq!(world.get::<CurrentPosition>(e).unwrap().0, DVec3::new(2.0, 0.0, 0.0));
        assert!(world.get::<TweenPosition>(e).is_none());
    }
}
