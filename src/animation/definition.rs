//! Animation definitions and their parameter sets.
//!
//! An [`AnimationDefinition`] is an immutable template: a closed
//! [`MotionType`], a duration, loop flags and a [`ParameterSet`]. The engine
//! only ever reads definitions; replacing one in the
//! [`AnimationLibrary`](crate::resources::animationlibrary::AnimationLibrary)
//! bumps its revision and invalidates resolved track parameters.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use glam::DVec3;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::clock::PlaybackTiming;
use crate::animation::error::EngineError;

/// Closed set of supported motion models.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MotionType {
    Linear,
    Circular,
    Elliptical,
    Spiral,
    Random,
    Pendulum,
    Bounce,
    Spring,
    Wave,
    Lissajous,
    Helix,
    Bezier,
    CatmullRom,
    Zigzag,
    PerlinNoise,
    RoseCurve,
    Epicycloid,
    Orbit,
    CircularScan,
    Zoom,
    Doppler,
    AttractRepel,
    Custom,
}

impl MotionType {
    pub const ALL: [MotionType; 23] = [
        MotionType::Linear,
        MotionType::Circular,
        MotionType::Elliptical,
        MotionType::Spiral,
        MotionType::Random,
        MotionType::Pendulum,
        MotionType::Bounce,
        MotionType::Spring,
        MotionType::Wave,
        MotionType::Lissajous,
        MotionType::Helix,
        MotionType::Bezier,
        MotionType::CatmullRom,
        MotionType::Zigzag,
        MotionType::PerlinNoise,
        MotionType::RoseCurve,
        MotionType::Epicycloid,
        MotionType::Orbit,
        MotionType::CircularScan,
        MotionType::Zoom,
        MotionType::Doppler,
        MotionType::AttractRepel,
        MotionType::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MotionType::Linear => "linear",
            MotionType::Circular => "circular",
            MotionType::Elliptical => "elliptical",
            MotionType::Spiral => "spiral",
            MotionType::Random => "random",
            MotionType::Pendulum => "pendulum",
            MotionType::Bounce => "bounce",
            MotionType::Spring => "spring",
            MotionType::Wave => "wave",
            MotionType::Lissajous => "lissajous",
            MotionType::Helix => "helix",
            MotionType::Bezier => "bezier",
            MotionType::CatmullRom => "catmull-rom",
            MotionType::Zigzag => "zigzag",
            MotionType::PerlinNoise => "perlin-noise",
            MotionType::RoseCurve => "rose-curve",
            MotionType::Epicycloid => "epicycloid",
            MotionType::Orbit => "orbit",
            MotionType::CircularScan => "circular-scan",
            MotionType::Zoom => "zoom",
            MotionType::Doppler => "doppler",
            MotionType::AttractRepel => "attract-repel",
            MotionType::Custom => "custom",
        }
    }

    /// Models whose evaluation integrates a small per-track state.
    pub fn is_physics(self) -> bool {
        matches!(
            self,
            MotionType::Pendulum | MotionType::Spring | MotionType::Bounce
        )
    }
}

impl fmt::Display for MotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MotionType {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MotionType::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| EngineError::InvalidDefinition(format!("unknown motion type '{s}'")))
    }
}

/// A single model parameter value.
///
/// Serialized untagged, so JSON reads naturally: `2.5`, `true`, `"quad-in"`,
/// `[1, 2, 3]` or `[[0, 0, 0], [1, 0, 0]]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Flag(bool),
    Text(String),
    Vec3(DVec3),
    Points(Vec<DVec3>),
}

impl ParamValue {
    pub fn is_finite(&self) -> bool {
        match self {
            ParamValue::Number(n) => n.is_finite(),
            ParamValue::Vec3(v) => v.is_finite(),
            ParamValue::Points(points) => points.iter().all(|p| p.is_finite()),
            ParamValue::Flag(_) | ParamValue::Text(_) => true,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Number(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<DVec3> for ParamValue {
    fn from(value: DVec3) -> Self {
        ParamValue::Vec3(value)
    }
}

impl From<Vec<DVec3>> for ParamValue {
    fn from(value: Vec<DVec3>) -> Self {
        ParamValue::Points(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Model parameters by name.
///
/// Typed getters return `None` for missing keys, wrong types and non-finite
/// values alike, so a corrupted value can never reach an evaluator.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet(FxHashMap<String, ParamValue>);

impl ParameterSet {
    pub fn new() -> Self {
        ParameterSet(FxHashMap::default())
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        match self.0.get(key) {
            Some(ParamValue::Number(n)) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    pub fn vec3(&self, key: &str) -> Option<DVec3> {
        match self.0.get(key) {
            Some(ParamValue::Vec3(v)) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    pub fn points(&self, key: &str) -> Option<&[DVec3]> {
        match self.0.get(key) {
            Some(ParamValue::Points(p)) if p.iter().all(|v| v.is_finite()) => Some(p),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(ParamValue::Flag(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(ParamValue::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Fill every key missing from `self` with the value from `defaults`.
    pub fn merged_over(&self, defaults: &ParameterSet) -> ParameterSet {
        let mut merged = defaults.clone();
        for (key, value) in &self.0 {
            merged.0.insert(key.clone(), value.clone());
        }
        merged
    }

    /// First key holding a non-finite value, if any.
    pub fn first_non_finite(&self) -> Option<&str> {
        self.0
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(key, _)| key.as_str())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

/// Immutable animation template.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub motion_type: MotionType,
    #[serde(with = "duration_secs")]
    pub duration: Duration,
    #[serde(rename = "loop", default)]
    pub looping: bool,
    #[serde(default)]
    pub ping_pong: bool,
    #[serde(default)]
    pub parameters: ParameterSet,
}

impl AnimationDefinition {
    /// Build a definition, rejecting durations that are not strictly positive
    /// and finite.
    pub fn new(
        id: impl Into<String>,
        motion_type: MotionType,
        duration_secs: f64,
    ) -> Result<Self, EngineError> {
        let id = id.into();
        if !duration_secs.is_finite() || duration_secs <= 0.0 {
            return Err(EngineError::InvalidDefinition(format!(
                "'{id}': duration must be positive, got {duration_secs}"
            )));
        }
        Ok(AnimationDefinition {
            name: id.clone(),
            id,
            motion_type,
            duration: Duration::from_secs_f64(duration_secs),
            looping: false,
            ping_pong: false,
            parameters: ParameterSet::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_ping_pong(mut self, ping_pong: bool) -> Self {
        self.ping_pong = ping_pong;
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterSet) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key, value);
        self
    }

    /// Structural validation, run before a definition enters the library.
    ///
    /// Ping-pong without loop is accepted; it has no effect.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.is_empty() {
            return Err(EngineError::InvalidDefinition("empty id".into()));
        }
        if self.duration.is_zero() {
            return Err(EngineError::InvalidDefinition(format!(
                "'{}': duration must be positive",
                self.id
            )));
        }
        if let Some(key) = self.parameters.first_non_finite() {
            return Err(EngineError::InvalidDefinition(format!(
                "'{}': parameter '{key}' is not finite",
                self.id
            )));
        }
        Ok(())
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }

    pub fn timing(&self) -> PlaybackTiming {
        PlaybackTiming {
            duration: self.duration,
            looping: self.looping,
            ping_pong: self.looping && self.ping_pong,
        }
    }
}
