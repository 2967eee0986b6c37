//! Engine configuration resource.
//!
//! Manages engine settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [engine]
//! tick_rate = 60
//! time_scale = 1.0
//!
//! [playback]
//! return_to_rest = true
//! return_duration = 1.5
//! return_easing = sine-in-out
//!
//! [physics]
//! steps_per_second = 240
//!
//! [render]
//! up_axis = y
//! ```

use std::path::PathBuf;

use bevy_ecs::prelude::*;
use configparser::ini::Ini;
use log::{info, warn};

use crate::animation::coords::{CoordinateConvention, UpAxis};
use crate::animation::easing::Easing;

/// Default safe values for startup
const DEFAULT_TICK_RATE: u32 = 60;
const DEFAULT_TIME_SCALE: f64 = 1.0;
const DEFAULT_RETURN_TO_REST: bool = false;
const DEFAULT_RETURN_DURATION: f64 = 1.0;
const DEFAULT_PHYSICS_STEPS_PER_SECOND: u32 = 240;
const DEFAULT_CONFIG_PATH: &str = "./config.ini";

/// Engine configuration resource.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Host ticks per second.
    pub tick_rate: u32,
    /// Multiplier applied to the host delta before it reaches the engine.
    pub time_scale: f64,
    /// Ease tracks back to their initial position when playback finishes.
    pub return_to_rest: bool,
    /// Duration of the return tween in seconds.
    pub return_duration: f64,
    pub return_easing: Easing,
    /// Fixed integration rate of the physics models.
    pub physics_steps_per_second: u32,
    /// Up axis of the position consumer.
    pub up_axis: UpAxis,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            time_scale: DEFAULT_TIME_SCALE,
            return_to_rest: DEFAULT_RETURN_TO_REST,
            return_duration: DEFAULT_RETURN_DURATION,
            return_easing: Easing::SineInOut,
            physics_steps_per_second: DEFAULT_PHYSICS_STEPS_PER_SECOND,
            up_axis: UpAxis::Y,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Fixed step of the physics models in seconds.
    pub fn physics_step(&self) -> f64 {
        1.0 / f64::from(self.physics_steps_per_second.max(1))
    }

    /// Host tick period in seconds.
    pub fn tick_period(&self) -> f64 {
        1.0 / f64::from(self.tick_rate.max(1))
    }

    pub fn convention(&self) -> CoordinateConvention {
        CoordinateConvention::new(self.up_axis)
    }

    /// Load configuration from the INI file.
    ///
    /// Missing or malformed values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [engine] section
        if let Some(rate) = config.getuint("engine", "tick_rate").ok().flatten() {
            self.tick_rate = rate.clamp(1, 10_000) as u32;
        }
        if let Some(scale) = config.getfloat("engine", "time_scale").ok().flatten() {
            if scale.is_finite() && scale >= 0.0 {
                self.time_scale = scale;
            }
        }

        // [playback] section
        if let Some(enabled) = config.getbool("playback", "return_to_rest").ok().flatten() {
            self.return_to_rest = enabled;
        }
        if let Some(duration) = config.getfloat("playback", "return_duration").ok().flatten() {
            if duration.is_finite() && duration > 0.0 {
                self.return_duration = duration;
            }
        }
        if let Some(name) = config.get("playback", "return_easing") {
            match name.parse::<Easing>() {
                Ok(easing) => self.return_easing = easing,
                Err(e) => warn!("Ignoring return_easing: {}", e),
            }
        }

        // [physics] section
        if let Some(steps) = config.getuint("physics", "steps_per_second").ok().flatten() {
            self.physics_steps_per_second = steps.clamp(1, 100_000) as u32;
        }

        // [render] section
        if let Some(axis) = config.get("render", "up_axis") {
            match axis.trim().to_ascii_lowercase().as_str() {
                "y" => self.up_axis = UpAxis::Y,
                "z" => self.up_axis = UpAxis::Z,
                other => warn!("Ignoring unknown up_axis '{}'", other),
            }
        }

        info!(
            "Loaded config: {} Hz tick, time_scale={}, return_to_rest={}, physics {} Hz, up={:?}",
            self.tick_rate,
            self.time_scale,
            self.return_to_rest,
            self.physics_steps_per_second,
            self.up_axis
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        config.set("engine", "tick_rate", Some(self.tick_rate.to_string()));
        config.set("engine", "time_scale", Some(self.time_scale.to_string()));

        config.set(
            "playback",
            "return_to_rest",
            Some(self.return_to_rest.to_string()),
        );
        config.set(
            "playback",
            "return_duration",
            Some(self.return_duration.to_string()),
        );
        config.set(
            "playback",
            "return_easing",
            Some(easing_name(self.return_easing).to_string()),
        );

        config.set(
            "physics",
            "steps_per_second",
            Some(self.physics_steps_per_second.to_string()),
        );

        let axis = match self.up_axis {
            UpAxis::Y => "y",
            UpAxis::Z => "z",
        };
        config.set("render", "up_axis", Some(axis.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}

fn easing_name(easing: Easing) -> &'static str {
    match easing {
        Easing::Linear => "linear",
        Easing::QuadIn => "quad-in",
        Easing::QuadOut => "quad-out",
        Easing::QuadInOut => "quad-in-out",
        Easing::CubicIn => "cubic-in",
        Easing::CubicOut => "cubic-out",
        Easing::CubicInOut => "cubic-in-out",
        Easing::SineIn => "sine-in",
        Easing::SineOut => "sine-out",
        Easing::SineInOut => "sine-in-out",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sonomotion-{}-{}.ini", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::new();
        assert_eq!(config.tick_rate, 60);
        assert!(!config.return_to_rest);
        assert!((config.physics_step() - 1.0 / 240.0).abs() < 1e-12);
        assert_eq!(config.up_axis, UpAxis::Y);
    }

    #[test]
    fn test_missing_file_is_error() {
        let mut config = EngineConfig::with_path("/nonexistent/sonomotion/config.ini");
        assert!(config.load_from_file().is_err());
        assert_eq!(config.tick_rate, DEFAULT_TICK_RATE);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let path = temp_path("roundtrip");
        let mut saved = EngineConfig::with_path(&path);
        saved.tick_rate = 120;
        saved.time_scale = 0.5;
        saved.return_to_rest = true;
        saved.return_duration = 2.5;
        saved.return_easing = Easing::CubicOut;
        saved.physics_steps_per_second = 480;
        saved.up_axis = UpAxis::Z;
        saved.save_to_file().unwrap();

        let mut loaded = EngineConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, saved);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let path = temp_path("invalid");
        std::fs::write(
            &path,
            "[engine]\ntime_scale = -3\n[playback]\nreturn_easing = wobble\n[render]\nup_axis = w\n",
        )
        .unwrap();
        let mut config = EngineConfig::with_path(&path);
        config.load_from_file().unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(config.time_scale, DEFAULT_TIME_SCALE);
        assert_eq!(config.return_easing, Easing::SineInOut);
        assert_eq!(config.up_axis, UpAxis::Y);
    }
}
