//! Time update system.
//!
//! Updates the shared [`WorldTime`](crate::resources::worldtime::WorldTime)
//! resource once per tick, applying `time_scale` to the provided delta.

use std::time::Duration;

use bevy_ecs::prelude::*;

use crate::resources::worldtime::WorldTime;

/// Advance `now` and `delta` on the `WorldTime` resource.
///
/// `dt` is the unscaled tick delta. Negative or non-finite scaled deltas are
/// treated as zero so `now` never goes backwards.
pub fn update_world_time(world: &mut World, dt: Duration) {
    let mut wt = world.resource_mut::<WorldTime>();
    let scale = if wt.time_scale.is_finite() {
        wt.time_scale.max(0.0)
    } else {
        0.0
    };
    let scaled = dt.mul_f64(scale);
    wt.now += scaled;
    wt.delta = scaled.as_secs_f64();
    wt.frame_count += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_accumulates_now() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default());
        for _ in 0..3 {
            update_world_time(&mut world, Duration::from_millis(250));
        }
        let wt = world.resource::<WorldTime>();
        assert_eq!(wt.now, Duration::from_millis(750));
        assert!((wt.delta - 0.25).abs() < 1e-12);
        assert_eq!(wt.frame_count, 3);
    }

    #[test]
    fn test_time_scale_applies() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(2.0));
        update_world_time(&mut world, Duration::from_millis(100));
        assert_eq!(world.resource::<WorldTime>().now, Duration::from_millis(200));
    }

    #[test]
    fn test_negative_scale_freezes_time() {
        let mut world = World::new();
        world.insert_resource(WorldTime::default().with_time_scale(-1.0));
        update_world_time(&mut world, Duration::from_millis(100));
        assert_eq!(world.resource::<WorldTime>().now, Duration::ZERO);
    }
}
