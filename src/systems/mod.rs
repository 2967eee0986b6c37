//! Engine systems.
//!
//! This module groups all ECS systems that advance playback and hand its
//! results to the host.
//!
//! Submodules overview
//! - [`output`] – apply positions to tracks, bridge frames to the output thread
//! - [`playback`] – apply playback commands and purge stopped instances
//! - [`strategy`] – keep resolved per-track parameters up to date
//! - [`tick`] – evaluate every playing instance against the tick clock
//! - [`time`] – update the tick clock and delta
//! - [`tween`] – ease tracks back to rest independently of playback

pub mod output;
pub mod playback;
pub mod strategy;
pub mod tick;
pub mod time;
pub mod tween;
