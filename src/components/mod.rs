//! ECS components for track entities.
//!
//! Submodules overview:
//! - [`track`] – track identity, static initial position and live position
//! - [`tween`] – eased 3D position interpolation used for rest easing

pub mod track;
pub mod tween;
