//! Playback clock integration tests driven through the ECS schedule.
//!
//! The host loop is reproduced with `run_tick`: every tick advances
//! `WorldTime` by a fixed delta and runs the engine schedule once.

use std::time::Duration;

use bevy_ecs::prelude::*;
use glam::DVec3;

use sonomotion::animation::clock::{InstanceId, PlaybackState};
use sonomotion::animation::definition::{AnimationDefinition, MotionType};
use sonomotion::animation::strategy::{Arrangement, FormationVariant, StrategyConfig};
use sonomotion::components::track::{CurrentPosition, Track, TrackId};
use sonomotion::engine::{build_schedule, run_tick, setup_world};
use sonomotion::events::playback::{
    PlaybackCommand, PlaybackLifecycleMessage, TrackFaultMessage, TrackPositionMessage,
};
use sonomotion::resources::animationlibrary::AnimationLibrary;
use sonomotion::resources::engineconfig::EngineConfig;
use sonomotion::resources::playbacktable::PlaybackTable;
use sonomotion::resources::worldtime::WorldTime;
use sonomotion::systems::tick::playback_tick_system;

const EPSILON: f64 = 1e-9;
const TICK: Duration = Duration::from_millis(100);

fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
    (a - b).abs().max_element() < EPSILON
}

#[derive(Resource, Default)]
struct Collected {
    positions: Vec<TrackPositionMessage>,
    faults: Vec<TrackFaultMessage>,
    lifecycle: Vec<PlaybackLifecycleMessage>,
}

fn collect(
    mut positions: MessageReader<TrackPositionMessage>,
    mut faults: MessageReader<TrackFaultMessage>,
    mut lifecycle: MessageReader<PlaybackLifecycleMessage>,
    mut out: ResMut<Collected>,
) {
    out.positions.extend(positions.read().copied());
    out.faults.extend(faults.read().cloned());
    out.lifecycle.extend(lifecycle.read().cloned());
}

fn make_world() -> (World, Schedule) {
    let mut world = World::new();
    setup_world(&mut world, EngineConfig::new());
    world.insert_resource(Collected::default());
    let mut schedule = build_schedule();
    schedule.add_systems(collect.after(playback_tick_system));
    (world, schedule)
}

fn add_animation(world: &mut World, definition: AnimationDefinition) {
    world
        .resource_mut::<AnimationLibrary>()
        .insert(definition)
        .unwrap();
}

fn spawn_track(world: &mut World, id: u32, position: DVec3) -> Entity {
    world
        .spawn((
            Track::new(id, format!("track {id}"), position),
            CurrentPosition(position),
        ))
        .id()
}

fn create(world: &mut World, animation: &str, tracks: &[u32], strategy: StrategyConfig) {
    world.write_message(PlaybackCommand::Create {
        animation_id: animation.into(),
        tracks: tracks.iter().map(|id| TrackId(*id)).collect(),
        strategy,
        autostart: true,
    });
}

fn ticks(world: &mut World, schedule: &mut Schedule, n: u32) {
    for _ in 0..n {
        run_tick(world, schedule, TICK);
    }
}

fn position(world: &World, entity: Entity) -> DVec3 {
    world.get::<CurrentPosition>(entity).unwrap().0
}

fn only_instance(world: &World) -> InstanceId {
    world.resource::<PlaybackTable>().ids()[0]
}

/// Linear sweep from the origin to (10, 0, 0): position x equals track time.
fn sweep(looping: bool, ping_pong: bool) -> AnimationDefinition {
    AnimationDefinition::new("sweep", MotionType::Linear, 10.0)
        .unwrap()
        .with_loop(looping)
        .with_ping_pong(ping_pong)
        .with_parameter("startPosition", DVec3::ZERO)
        .with_parameter("endPosition", DVec3::new(10.0, 0.0, 0.0))
}

// ==================== END-TO-END SCENARIO TESTS ====================

#[test]
fn ping_pong_scenario_15s_and_25s() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(true, true));
    let track = spawn_track(&mut world, 1, DVec3::ZERO);
    create(&mut world, "sweep", &[1], StrategyConfig::independent());

    // started on the first tick at elapsed 0
    ticks(&mut world, &mut schedule, 1);
    assert!(vec_approx_eq(position(&world, track), DVec3::ZERO));

    // elapsed 12s: second cycle, reversed (10 - 2)
    ticks(&mut world, &mut schedule, 120);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(8.0, 0.0, 0.0)));

    // elapsed 15s: reversed, 10 - 5 = 5
    ticks(&mut world, &mut schedule, 30);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(5.0, 0.0, 0.0)));

    // elapsed 25s: third cycle, forward, 25 mod 10 = 5
    ticks(&mut world, &mut schedule, 100);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(5.0, 0.0, 0.0)));

    let looped = world
        .resource::<Collected>()
        .lifecycle
        .iter()
        .filter(|m| matches!(m, PlaybackLifecycleMessage::Looped { .. }))
        .count();
    assert_eq!(looped, 2);
}

#[test]
fn plain_loop_wraps_without_reset() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(true, false));
    let track = spawn_track(&mut world, 1, DVec3::ZERO);
    create(&mut world, "sweep", &[1], StrategyConfig::independent());

    ticks(&mut world, &mut schedule, 1 + 123);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(2.3, 0.0, 0.0)));
    let id = only_instance(&world);
    let table = world.resource::<PlaybackTable>();
    assert_eq!(table.get(id).unwrap().instance.loop_count(), 1);
    assert_eq!(
        table.get(id).unwrap().instance.start_reference(),
        Some(TICK)
    );
}

// ==================== PAUSE / RESUME TESTS ====================

#[test]
fn pause_resume_via_commands_has_zero_drift() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(false, false));
    let track = spawn_track(&mut world, 1, DVec3::ZERO);
    create(&mut world, "sweep", &[1], StrategyConfig::independent());
    ticks(&mut world, &mut schedule, 1 + 20);
    let id = only_instance(&world);

    world.write_message(PlaybackCommand::Pause(id));
    ticks(&mut world, &mut schedule, 1);
    let frozen = position(&world, track);
    let paused_at = world
        .resource::<PlaybackTable>()
        .get(id)
        .unwrap()
        .instance
        .pause_state()
        .unwrap()
        .paused_at_elapsed;
    // paused at the tick timestamp, one tick after the last evaluation
    assert_eq!(paused_at, Duration::from_millis(2100));

    let before = world.resource::<Collected>().positions.len();
    ticks(&mut world, &mut schedule, 37);
    assert_eq!(world.resource::<Collected>().positions.len(), before);
    assert_eq!(position(&world, track), frozen);

    world.write_message(PlaybackCommand::Resume(id));
    ticks(&mut world, &mut schedule, 1);
    let now = world.resource::<WorldTime>().now;
    let elapsed = world
        .resource::<PlaybackTable>()
        .get(id)
        .unwrap()
        .instance
        .elapsed(now)
        .unwrap();
    assert_eq!(elapsed, paused_at);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(2.1, 0.0, 0.0)));

    ticks(&mut world, &mut schedule, 10);
    assert!(vec_approx_eq(position(&world, track), DVec3::new(3.1, 0.0, 0.0)));
}

// ==================== COMPLETION TESTS ====================

#[test]
fn non_loop_finishes_once_at_end_of_path() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(false, false));
    let a = spawn_track(&mut world, 1, DVec3::ZERO);
    let b = spawn_track(&mut world, 2, DVec3::new(0.0, 5.0, 0.0));
    create(
        &mut world,
        "sweep",
        &[1, 2],
        StrategyConfig::independent().with_phase_offset(0.55),
    );

    ticks(&mut world, &mut schedule, 1 + 150);

    // every track ends exactly on its relocated end point
    assert!(vec_approx_eq(position(&world, a), DVec3::new(10.0, 0.0, 0.0)));
    assert!(vec_approx_eq(position(&world, b), DVec3::new(10.0, 5.0, 0.0)));

    let collected = world.resource::<Collected>();
    let finished: Vec<_> = collected
        .lifecycle
        .iter()
        .filter(|m| matches!(m, PlaybackLifecycleMessage::Finished(_)))
        .collect();
    assert_eq!(finished.len(), 1);
    assert!(world.resource::<PlaybackTable>().is_empty());
}

#[test]
fn phase_offset_holds_track_until_due() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(false, false));
    let late = spawn_track(&mut world, 2, DVec3::new(0.0, 3.0, 0.0));
    spawn_track(&mut world, 1, DVec3::ZERO);
    create(
        &mut world,
        "sweep",
        &[1, 2],
        StrategyConfig::independent().with_track_phase(TrackId(2), 2.0),
    );

    ticks(&mut world, &mut schedule, 1 + 15);
    let collected = world.resource::<Collected>();
    assert!(collected.positions.iter().all(|m| m.track == TrackId(1)));
    assert_eq!(position(&world, late), DVec3::new(0.0, 3.0, 0.0));

    ticks(&mut world, &mut schedule, 10);
    assert!(vec_approx_eq(
        position(&world, late),
        DVec3::new(0.5, 3.0, 0.0)
    ));
}

#[test]
fn stop_command_freezes_and_purges() {
    let (mut world, mut schedule) = make_world();
    add_animation(&mut world, sweep(true, false));
    let track = spawn_track(&mut world, 1, DVec3::ZERO);
    create(&mut world, "sweep", &[1], StrategyConfig::independent());
    ticks(&mut world, &mut schedule, 1 + 5);
    let id = only_instance(&world);

    world.write_message(PlaybackCommand::Stop(id));
    ticks(&mut world, &mut schedule, 1);
    assert_eq!(
        world.resource::<PlaybackTable>().state(id),
        Some(PlaybackState::Stopped)
    );
    let frozen = position(&world, track);
    ticks(&mut world, &mut schedule, 5);
    assert_eq!(position(&world, track), frozen);
    assert!(!world.resource::<PlaybackTable>().contains(id));

    world.write_message(PlaybackCommand::Resume(id));
    ticks(&mut world, &mut schedule, 1);
    assert!(world.resource::<Collected>().lifecycle.iter().any(|m| matches!(
        m,
        PlaybackLifecycleMessage::Rejected {
            instance: Some(rejected),
            ..
        } if *rejected == id
    )));
}

// ==================== FAULT ISOLATION TESTS ====================

#[test]
fn faulty_tracks_hold_position_while_others_continue() {
    let (mut world, mut schedule) = make_world();
    add_animation(
        &mut world,
        AnimationDefinition::new("orbit", MotionType::Circular, 4.0)
            .unwrap()
            .with_loop(true)
            .with_parameter("radius", 1.0),
    );
    let entities: Vec<_> = (0..5)
        .map(|i| spawn_track(&mut world, i + 1, DVec3::new(f64::from(i), 0.0, 0.0)))
        .collect();
    // outermost offsets overflow: 2 * f64::MAX
    let strategy = StrategyConfig::formation(FormationVariant::Custom(Arrangement::Line {
        spacing: f64::MAX,
        direction: DVec3::X,
    }));
    create(&mut world, "orbit", &[1, 2, 3, 4, 5], strategy);

    ticks(&mut world, &mut schedule, 1);
    let middle_start = position(&world, entities[2]);
    ticks(&mut world, &mut schedule, 5);

    for (i, faulty) in [(0usize, 1u32), (4, 5)] {
        assert_eq!(
            position(&world, entities[i]),
            DVec3::new(i as f64, 0.0, 0.0)
        );
        assert!(world
            .resource::<Collected>()
            .faults
            .iter()
            .any(|f| f.track == TrackId(faulty)));
    }
    assert_ne!(position(&world, entities[2]), middle_start);
    let id = only_instance(&world);
    assert_eq!(
        world.resource::<PlaybackTable>().state(id),
        Some(PlaybackState::Playing)
    );
}
