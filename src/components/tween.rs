//! Tween component for easing a track toward a position.
//!
//! [`TweenPosition`] drives a track's
//! [`CurrentPosition`](super::track::CurrentPosition) from one point to
//! another on its own clock, independent of any playback instance. It backs
//! the return-to-rest behavior and can be inserted by hosts directly.
//! See [`crate::systems::tween`] for the update system.

use bevy_ecs::prelude::Component;
use glam::DVec3;

pub use crate::animation::easing::Easing;

/// Determines how a tween behaves when it reaches the end.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoopMode {
    /// Play once and stop.
    Once,
    /// Restart from the beginning when finished.
    Loop,
    /// Reverse direction when reaching either end.
    PingPong,
}

/// Animates a track's position between two points.
///
/// The tween interpolates `from` to `to` over `duration` seconds using the
/// specified `easing` function and `loop_mode`.
#[derive(Component, Clone, Debug)]
pub struct TweenPosition {
    pub from: DVec3,
    pub to: DVec3,
    /// Duration in seconds.
    pub duration: f64,
    pub easing: Easing,
    pub loop_mode: LoopMode,
    /// Whether the tween is currently playing.
    pub playing: bool,
    /// Current time within the tween.
    pub time: f64,
    /// Direction of playback (true = forward).
    pub forward: bool,
}

impl TweenPosition {
    pub fn new(from: DVec3, to: DVec3, duration: f64) -> Self {
        TweenPosition {
            from,
            to,
            duration,
            easing: Easing::Linear,
            loop_mode: LoopMode::Once,
            playing: true,
            time: 0.0,
            forward: true,
        }
    }
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }
    pub fn with_loop_mode(mut self, loop_mode: LoopMode) -> Self {
        self.loop_mode = loop_mode;
        self
    }

    /// Position at the current tween time.
    pub fn sample(&self) -> DVec3 {
        let t = if self.duration > 0.0 {
            self.time / self.duration
        } else {
            1.0
        };
        self.from.lerp(self.to, self.easing.apply(t))
    }
}
