//! ECS resources made available to systems.
//!
//! This module groups the long-lived data injected into the ECS world and
//! accessed by systems during execution. Each submodule documents the
//! semantics and intended usage of its resource(s).
//!
//! Overview
//! - `animationlibrary` – validated animation definitions keyed by id
//! - `editsession` – single owned state of an apply-animation edit
//! - `engineconfig` – INI-backed engine settings
//! - `integrationstates` – physics model state per instance and track
//! - `outputbridge` – channel and thread handle of the position consumer
//! - `playbacktable` – every playback instance and its strategy
//! - `resolvedcache` – resolved per-track parameters and their fingerprints
//! - `worldtime` – tick clock and delta
pub mod animationlibrary;
pub mod editsession;
pub mod engineconfig;
pub mod integrationstates;
pub mod outputbridge;
pub mod playbacktable;
pub mod resolvedcache;
pub mod worldtime;
