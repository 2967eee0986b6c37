//! Engine tick integration tests for time scaling, rest easing, physics
//! models and the output bridge.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use bevy_ecs::prelude::*;
use glam::DVec3;

use sonomotion::animation::definition::{AnimationDefinition, MotionType};
use sonomotion::animation::strategy::StrategyConfig;
use sonomotion::components::track::{CurrentPosition, Track, TrackId};
use sonomotion::components::tween::TweenPosition;
use sonomotion::engine::{build_schedule, run_tick, setup_world};
use sonomotion::events::playback::PlaybackCommand;
use sonomotion::resources::animationlibrary::AnimationLibrary;
use sonomotion::resources::engineconfig::EngineConfig;
use sonomotion::resources::outputbridge::{PositionFrame, setup_output, shutdown_output};
use sonomotion::resources::playbacktable::PlaybackTable;
use sonomotion::resources::worldtime::WorldTime;
use sonomotion::scene::{Scene, apply_scene};

const EPSILON: f64 = 1e-9;

fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

fn make_world(config: EngineConfig) -> (World, Schedule) {
    let mut world = World::new();
    setup_world(&mut world, config);
    (world, build_schedule())
}

fn play(world: &mut World, definition: AnimationDefinition, position: DVec3) -> Entity {
    let id = definition.id.clone();
    world
        .resource_mut::<AnimationLibrary>()
        .insert(definition)
        .unwrap();
    let entity = world
        .spawn((Track::new(1, "solo", position), CurrentPosition(position)))
        .id();
    world.write_message(PlaybackCommand::Create {
        animation_id: id,
        tracks: vec![TrackId(1)],
        strategy: StrategyConfig::independent(),
        autostart: true,
    });
    entity
}

fn sweep(seconds: f64) -> AnimationDefinition {
    AnimationDefinition::new("sweep", MotionType::Linear, seconds)
        .unwrap()
        .with_parameter("startPosition", DVec3::ZERO)
        .with_parameter("endPosition", DVec3::new(4.0, 0.0, 0.0))
}

fn position(world: &World, entity: Entity) -> DVec3 {
    world.get::<CurrentPosition>(entity).unwrap().0
}

#[test]
fn time_scale_slows_playback() {
    let mut config = EngineConfig::new();
    config.time_scale = 0.5;
    let (mut world, mut schedule) = make_world(config);
    let track = play(&mut world, sweep(4.0), DVec3::ZERO);

    for _ in 0..21 {
        run_tick(&mut world, &mut schedule, Duration::from_millis(100));
    }
    // 2s of host time at half speed
    assert!(vec_approx_eq(position(&world, track), DVec3::new(1.0, 0.0, 0.0)));
}

#[test]
fn finished_track_eases_back_to_rest() {
    let mut config = EngineConfig::new();
    config.return_to_rest = true;
    config.return_duration = 1.0;
    let (mut world, mut schedule) = make_world(config);
    let rest = DVec3::new(0.0, 2.0, 0.0);
    let track = play(&mut world, sweep(1.0), rest);

    let tick = Duration::from_millis(100);
    for _ in 0..11 {
        run_tick(&mut world, &mut schedule, tick);
    }
    // finished on this tick: at the end of the path, tween attached
    assert!(vec_approx_eq(
        position(&world, track),
        rest + DVec3::new(4.0, 0.0, 0.0)
    ));
    assert!(world.get::<TweenPosition>(track).is_some());

    for _ in 0..15 {
        run_tick(&mut world, &mut schedule, tick);
    }
    assert!(vec_approx_eq(position(&world, track), rest));
    assert!(world.get::<TweenPosition>(track).is_none());
    assert!(world.resource::<PlaybackTable>().is_empty());
}

#[test]
fn new_playback_overrides_running_tween() {
    let (mut world, mut schedule) = make_world(EngineConfig::new());
    let track = play(&mut world, sweep(4.0), DVec3::ZERO);
    world.entity_mut(track).insert(TweenPosition::new(
        DVec3::splat(50.0),
        DVec3::splat(60.0),
        10.0,
    ));
    for _ in 0..3 {
        run_tick(&mut world, &mut schedule, Duration::from_millis(100));
    }
    assert!(world.get::<TweenPosition>(track).is_none());
    assert!(vec_approx_eq(position(&world, track), DVec3::new(0.2, 0.0, 0.0)));
}

#[test]
fn physics_models_do_not_depend_on_tick_rate() {
    for motion in [MotionType::Spring, MotionType::Pendulum, MotionType::Bounce] {
        let mut finals = Vec::new();
        for (tick_ms, count) in [(20u64, 150u32), (8, 375)] {
            let (mut world, mut schedule) = make_world(EngineConfig::new());
            let definition = AnimationDefinition::new("phys", motion, 10.0).unwrap();
            let track = play(&mut world, definition, DVec3::new(1.0, -1.0, 0.0));
            // first tick starts the instance at elapsed zero
            for _ in 0..=count {
                run_tick(&mut world, &mut schedule, Duration::from_millis(tick_ms));
            }
            finals.push(position(&world, track));
        }
        assert!(vec_approx_eq(finals[0], finals[1]), "{motion}");
    }
}

#[test]
fn output_bridge_receives_render_space_frames() {
    let frames: Arc<Mutex<Vec<PositionFrame>>> = Arc::default();
    let sink = Arc::clone(&frames);

    let (mut world, mut schedule) = make_world(EngineConfig::new());
    setup_output(&mut world, move |frame: &PositionFrame| {
        if let Ok(mut frames) = sink.lock() {
            frames.push(frame.clone());
        }
    });
    let track = play(
        &mut world,
        AnimationDefinition::new("lift", MotionType::Linear, 1.0)
            .unwrap()
            .with_parameter("startPosition", DVec3::ZERO)
            .with_parameter("endPosition", DVec3::new(0.0, 1.0, 2.0)),
        DVec3::ZERO,
    );
    for _ in 0..20 {
        run_tick(&mut world, &mut schedule, Duration::from_millis(100));
    }
    shutdown_output(&mut world);

    let frames = frames.lock().unwrap();
    // one frame per evaluated tick: t = 0.0 ..= 1.0
    assert_eq!(frames.len(), 11);
    let last = frames.last().unwrap().positions[0];
    assert_eq!(last.track, TrackId(1));
    assert!(vec_approx_eq(last.position, position(&world, track)));
    // Z-up (0, 1, 2) is (0, 2, -1) for a Y-up consumer
    assert!(vec_approx_eq(last.render.0, DVec3::new(0.0, 2.0, -1.0)));
}

#[test]
fn demo_scene_plays_every_track() {
    let (mut world, mut schedule) = make_world(EngineConfig::new());
    apply_scene(&mut world, &Scene::demo()).unwrap();
    for _ in 0..120 {
        run_tick(&mut world, &mut schedule, Duration::from_millis(16));
    }
    assert_eq!(world.resource::<PlaybackTable>().len(), 3);
    assert_eq!(world.resource::<WorldTime>().frame_count, 120);
    let mut query = world.query::<(&Track, &CurrentPosition)>();
    for (track, current) in query.iter(&world) {
        assert!(current.0.is_finite(), "{}", track.id);
    }
}
