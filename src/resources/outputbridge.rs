//! ECS resources that bridge the tick loop with a background position sink.
//!
//! Use [`setup_output`] once during initialization to spawn the output
//! thread and insert the [`OutputBridge`] resource. Call [`shutdown_output`]
//! during teardown to flush and stop the thread.
//!
//! The tick never blocks on the consumer: frames are pushed through an
//! unbounded channel and the sink runs on its own thread.

use std::io::Write;
use std::time::Duration;

use bevy_ecs::prelude::*;
use crossbeam_channel::{Sender, unbounded};
use glam::DVec3;
use log::warn;
use serde::Serialize;

use crate::animation::clock::InstanceId;
use crate::animation::coords::RenderPosition;
use crate::components::track::TrackId;
use crate::systems::output::output_thread;

/// Position of one track inside a [`PositionFrame`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FramePosition {
    pub instance: InstanceId,
    pub track: TrackId,
    /// Domain convention (Z up).
    pub position: DVec3,
    /// Consumer convention, see [`EngineConfig::up_axis`](crate::resources::engineconfig::EngineConfig::up_axis).
    pub render: RenderPosition,
}

/// Every position produced during one tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionFrame {
    pub frame: u64,
    #[serde(with = "frame_time")]
    pub now: Duration,
    pub positions: Vec<FramePosition>,
}

mod frame_time {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(now: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(now.as_secs_f64())
    }
}

/// Commands accepted by the output thread.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputCmd {
    Frame(PositionFrame),
    Shutdown,
}

/// Consumer of position frames, owned by the output thread.
pub trait PositionSink: Send + 'static {
    fn frame(&mut self, frame: &PositionFrame);

    /// Called once before the thread exits.
    fn finish(&mut self) {}
}

impl<F> PositionSink for F
where
    F: FnMut(&PositionFrame) + Send + 'static,
{
    fn frame(&mut self, frame: &PositionFrame) {
        self(frame)
    }
}

/// Writes one JSON line per frame.
///
/// With `render_space` the whole [`PositionFrame`] is written. Otherwise each
/// line is `[frame, seconds, [[track, [x, y, z]], ...]]` in the domain
/// convention. Write failures (e.g. a closed pipe) are logged and counted,
/// never fatal.
pub struct JsonLinesSink<W> {
    out: W,
    render_space: bool,
    write_errors: u64,
}

impl<W: Write + Send + 'static> JsonLinesSink<W> {
    pub fn new(out: W, render_space: bool) -> Self {
        JsonLinesSink {
            out,
            render_space,
            write_errors: 0,
        }
    }

    pub fn write_errors(&self) -> u64 {
        self.write_errors
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn encode(&self, frame: &PositionFrame) -> serde_json::Result<String> {
        if self.render_space {
            serde_json::to_string(frame)
        } else {
            let domain: Vec<_> = frame
                .positions
                .iter()
                .map(|p| (p.track, p.position))
                .collect();
            serde_json::to_string(&(frame.frame, frame.now.as_secs_f64(), domain))
        }
    }
}

impl<W: Write + Send + 'static> PositionSink for JsonLinesSink<W> {
    fn frame(&mut self, frame: &PositionFrame) {
        match self.encode(frame) {
            Ok(line) => {
                if let Err(e) = writeln!(self.out, "{}", line) {
                    self.write_errors += 1;
                    warn!("Cannot write frame {}: {}", frame.frame, e);
                }
            }
            Err(e) => warn!("Cannot encode frame {}: {}", frame.frame, e),
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("Cannot flush position output: {}", e);
        }
    }
}

/// Shared bridge between the ECS world and the output thread.
#[derive(Resource)]
pub struct OutputBridge {
    /// Sender for [`OutputCmd`] messages (ECS -> output thread).
    pub tx_cmd: Sender<OutputCmd>,
    /// Join handle for the background output thread.
    pub handle: std::thread::JoinHandle<()>,
}

/// Spawn the output thread around `sink` and register the bridge resource.
pub fn setup_output(world: &mut World, sink: impl PositionSink) {
    let (tx_cmd, rx_cmd) = unbounded::<OutputCmd>();

    let handle = std::thread::spawn(move || output_thread(rx_cmd, sink));

    world.insert_resource(OutputBridge { tx_cmd, handle });
}

/// Request shutdown of the output thread and join it.
///
/// Frames already queued are delivered before the thread exits.
pub fn shutdown_output(world: &mut World) {
    if let Some(bridge) = world.remove_resource::<OutputBridge>() {
        let _ = bridge.tx_cmd.send(OutputCmd::Shutdown);
        let _ = bridge.handle.join();
    }
}
