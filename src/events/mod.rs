//! Messages and observer events exchanged between the host and the engine.
//!
//! Submodules overview:
//! - [`playback`] – playback commands, positions, faults and lifecycle notifications

pub mod playback;
