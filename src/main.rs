//! Sonomotion main entry point.
//!
//! A headless host for the spatial track motion engine, using:
//! - **bevy_ecs** for the world, systems, messages and observers
//! - **configparser** for the INI configuration
//! - **crossbeam-channel** to hand position frames to the output thread
//!
//! # Main Loop
//!
//! 1. Load `config.ini` (defaults when missing)
//! 2. Build the ECS world and apply a scene (JSON file or the built-in demo)
//! 3. Spawn the output thread, which prints one JSON line per frame
//! 4. Run the fixed-rate tick loop for the requested duration
//! 5. Shut the output thread down
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --scene assets/scenes/demo.json --seconds 10
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use bevy_ecs::prelude::*;
use clap::Parser;

use sonomotion::animation::coords::UpAxis;
use sonomotion::engine::{build_schedule, run_tick, setup_world};
use sonomotion::resources::engineconfig::EngineConfig;
use sonomotion::resources::outputbridge::{JsonLinesSink, setup_output, shutdown_output};
use sonomotion::scene::{Scene, apply_scene};

/// Spatial track motion engine
#[derive(Parser)]
#[command(version, about = "Drives spatial audio tracks along motion paths and streams their positions.")]
struct Cli {
    /// INI configuration file.
    #[arg(long, value_name = "PATH", default_value = "./config.ini")]
    config: PathBuf,

    /// JSON scene to play. The built-in demo scene is used when omitted.
    #[arg(long, value_name = "PATH")]
    scene: Option<PathBuf>,

    /// Seconds of playback to run before exiting.
    #[arg(long, default_value_t = 10.0)]
    seconds: f64,

    /// Print positions in the Y-up render convention instead of Z-up.
    #[arg(long)]
    render_space: bool,

    /// Run as fast as possible instead of in real time.
    #[arg(long)]
    no_wait: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = EngineConfig::with_path(&cli.config);
    if let Err(e) = config.load_from_file() {
        log::warn!("{}; using defaults", e);
    }
    if cli.render_space {
        config.up_axis = UpAxis::Y;
    }
    let render_space = cli.render_space;
    let tick_period = Duration::from_secs_f64(config.tick_period());
    let ticks = (cli.seconds.max(0.0) * f64::from(config.tick_rate)).round() as u64;

    let scene = match &cli.scene {
        Some(path) => match Scene::load(path) {
            Ok(scene) => scene,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => Scene::demo(),
    };

    // --------------- ECS world + resources ---------------
    let mut world = World::new();
    setup_world(&mut world, config);
    if let Err(e) = apply_scene(&mut world, &scene) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    setup_output(&mut world, JsonLinesSink::new(std::io::stdout(), render_space));

    let mut schedule = build_schedule();
    if let Err(e) = schedule.initialize(&mut world) {
        eprintln!("Error: failed to initialize schedule: {e}");
        std::process::exit(1);
    }

    log::info!(
        "Running {} tick(s) at {} Hz",
        ticks,
        world.resource::<EngineConfig>().tick_rate
    );

    // --------------- Main loop ---------------
    let mut next = Instant::now();
    for _ in 0..ticks {
        run_tick(&mut world, &mut schedule, tick_period);
        if !cli.no_wait {
            next += tick_period;
            if let Some(wait) = next.checked_duration_since(Instant::now()) {
                std::thread::sleep(wait);
            }
        }
    }

    shutdown_output(&mut world);
}
