//! Animation timing and position resolution.
//!
//! Plain Rust, no ECS types. The host layer in [`crate::systems`] drives it.
//!
//! - [`clock`] – drift-free playback clock and effective track time
//! - [`definition`] – animation templates and parameter sets
//! - [`models`] – one evaluator per motion type
//! - [`strategy`] – multi-track resolver (independent / formation)
//! - [`coords`] – domain ↔ renderer coordinate convention
//! - [`easing`] – easing curves
//! - [`error`] – error taxonomy

pub mod clock;
pub mod coords;
pub mod definition;
pub mod easing;
pub mod error;
pub mod models;
pub mod strategy;
