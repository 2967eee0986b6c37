//! Sonomotion library.
//!
//! Drives spatial-audio tracks along parametric motion paths over time. The
//! timing and position core lives in [`animation`] (plain Rust); the ECS host
//! layer (components, resources, systems and messages) wires it into a
//! `bevy_ecs` world. Exposed as a library for integration tests and reuse.

pub mod animation;
pub mod components;
pub mod engine;
pub mod events;
pub mod resources;
pub mod scene;
pub mod systems;
