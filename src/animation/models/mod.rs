//! Motion model evaluators.
//!
//! One evaluator per [`MotionType`], selected by a single exhaustive match in
//! [`evaluate`]. Submodules group the models by family:
//! - [`paths`] – point-to-point and spline paths
//! - [`arcs`] – circles, ellipses, spirals and other closed curves
//! - [`periodic`] – waves, Lissajous figures and helices
//! - [`physics`] – fixed-step integrated pendulum, spring and bounce
//! - [`stochastic`] – seeded random walk and gradient noise
//!
//! Every model also describes its parameter layout: [`default_parameters`]
//! around an anchor, the [`origin`] that anchors the path, and the
//! [`position_keys`] that move with it when the path is relocated.
//!
//! Evaluators receive a normalized time already folded into
//! `[0, duration]` by the playback clock and never loop on their own.

pub mod arcs;
pub mod paths;
pub mod periodic;
pub mod physics;
pub mod stochastic;

use std::str::FromStr;

use glam::DVec3;
use log::debug;

use crate::animation::definition::{MotionType, ParamValue, ParameterSet};
use crate::animation::easing::Easing;
use crate::animation::error::EngineError;
use crate::components::track::TrackId;

pub use physics::IntegrationState;

/// Default fixed integration step for physics models, in seconds.
pub const DEFAULT_PHYSICS_STEP: f64 = 1.0 / 240.0;

/// Per-evaluation context.
pub struct EvalContext<'a> {
    pub track: TrackId,
    /// Position the default parameters are built around when a value is
    /// missing.
    pub anchor: DVec3,
    pub physics_step: f64,
    /// Integration state of physics models. `None` integrates from scratch.
    pub state: Option<&'a mut IntegrationState>,
}

impl<'a> EvalContext<'a> {
    pub fn new(track: TrackId, anchor: DVec3) -> Self {
        EvalContext {
            track,
            anchor,
            physics_step: DEFAULT_PHYSICS_STEP,
            state: None,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.physics_step = step;
        self
    }

    pub fn with_state(mut self, state: &'a mut IntegrationState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Where a model's path is anchored.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OriginKey {
    /// A point-valued parameter.
    Point(&'static str),
    /// First entry of a point-list parameter.
    FirstOf(&'static str),
}

impl OriginKey {
    pub fn key(self) -> &'static str {
        match self {
            OriginKey::Point(k) | OriginKey::FirstOf(k) => k,
        }
    }
}

pub fn origin_key(motion: MotionType) -> OriginKey {
    match motion {
        MotionType::Linear => OriginKey::Point("startPosition"),
        MotionType::Pendulum => OriginKey::Point("anchorPoint"),
        MotionType::Spring => OriginKey::Point("restPosition"),
        MotionType::Helix => OriginKey::Point("axisStart"),
        MotionType::Bezier => OriginKey::Point("bezierStart"),
        MotionType::CatmullRom => OriginKey::FirstOf("controlPoints"),
        MotionType::Zigzag => OriginKey::Point("zigzagStart"),
        MotionType::Doppler => OriginKey::Point("pathStart"),
        MotionType::AttractRepel => OriginKey::Point("targetPosition"),
        MotionType::Custom => OriginKey::FirstOf("waypoints"),
        MotionType::Circular
        | MotionType::Elliptical
        | MotionType::Spiral
        | MotionType::Random
        | MotionType::Bounce
        | MotionType::Wave
        | MotionType::Lissajous
        | MotionType::PerlinNoise
        | MotionType::RoseCurve
        | MotionType::Epicycloid
        | MotionType::Orbit
        | MotionType::CircularScan
        | MotionType::Zoom => OriginKey::Point("center"),
    }
}

/// Parameters holding absolute positions, translated together on relocation.
pub fn position_keys(motion: MotionType) -> &'static [&'static str] {
    match motion {
        MotionType::Linear => &["startPosition", "endPosition"],
        MotionType::Pendulum => &["anchorPoint"],
        MotionType::Spring => &["restPosition"],
        MotionType::Helix => &["axisStart", "axisEnd"],
        MotionType::Bezier => &["bezierStart", "bezierControl1", "bezierControl2", "bezierEnd"],
        MotionType::CatmullRom => &["controlPoints"],
        MotionType::Zigzag => &["zigzagStart", "zigzagEnd"],
        MotionType::Doppler => &["pathStart", "pathEnd"],
        MotionType::AttractRepel => &["origin", "targetPosition"],
        MotionType::Custom => &["waypoints"],
        MotionType::Circular
        | MotionType::Elliptical
        | MotionType::Spiral
        | MotionType::Random
        | MotionType::Bounce
        | MotionType::Wave
        | MotionType::Lissajous
        | MotionType::PerlinNoise
        | MotionType::RoseCurve
        | MotionType::Epicycloid
        | MotionType::Orbit
        | MotionType::CircularScan
        | MotionType::Zoom => &["center"],
    }
}

/// Read the origin of a path from its parameters.
pub fn origin(motion: MotionType, params: &ParameterSet) -> Option<DVec3> {
    match origin_key(motion) {
        OriginKey::Point(key) => params.vec3(key),
        OriginKey::FirstOf(key) => params.points(key).and_then(|p| p.first().copied()),
    }
}

/// Default parameters of a model, laid out around `anchor`.
pub fn default_parameters(motion: MotionType, anchor: DVec3) -> ParameterSet {
    let a = anchor;
    let p = ParameterSet::new();
    match motion {
        MotionType::Linear => p
            .with("startPosition", a)
            .with("endPosition", a + DVec3::new(5.0, 0.0, 0.0))
            .with("easing", "linear"),
        MotionType::Circular => p
            .with("center", a)
            .with("radius", 5.0)
            .with("startAngle", 0.0)
            .with("endAngle", 360.0)
            .with("plane", "xy"),
        MotionType::Elliptical => p
            .with("center", a)
            .with("radiusX", 6.0)
            .with("radiusY", 3.0)
            .with("radiusZ", 0.0)
            .with("startAngle", 0.0)
            .with("endAngle", 360.0),
        MotionType::Spiral => p
            .with("center", a)
            .with("startRadius", 1.0)
            .with("endRadius", 8.0)
            .with("rotations", 3.0)
            .with("clockwise", false)
            .with("plane", "xy"),
        MotionType::Random => p
            .with("center", a)
            .with("bounds", DVec3::new(5.0, 5.0, 2.0))
            .with("updateFrequency", 2.0)
            .with("smoothing", 0.5)
            .with("seed", 1.0),
        MotionType::Pendulum => p
            .with("anchorPoint", a + DVec3::new(0.0, 0.0, 5.0))
            .with("length", 5.0)
            .with("initialAngle", 45.0)
            .with("damping", 0.1)
            .with("gravity", 9.81)
            .with("swingAzimuth", 0.0),
        MotionType::Bounce => p
            .with("center", a)
            .with("startHeight", 5.0)
            .with("groundLevel", 0.0)
            .with("restitution", 0.7)
            .with("gravity", 9.81),
        MotionType::Spring => p
            .with("restPosition", a)
            .with("initialDisplacement", DVec3::new(3.0, 0.0, 0.0))
            .with("stiffness", 10.0)
            .with("damping", 0.5)
            .with("mass", 1.0),
        MotionType::Wave => p
            .with("center", a)
            .with("amplitude", DVec3::new(0.0, 0.0, 2.0))
            .with("frequency", 1.0)
            .with("phase", 0.0)
            .with("waveType", "sine"),
        MotionType::Lissajous => p
            .with("center", a)
            .with("frequencyRatioA", 3.0)
            .with("frequencyRatioB", 2.0)
            .with("phaseDifference", 90.0)
            .with("amplitudeX", 4.0)
            .with("amplitudeY", 4.0)
            .with("amplitudeZ", 0.0),
        MotionType::Helix => p
            .with("axisStart", a)
            .with("axisEnd", a + DVec3::new(0.0, 0.0, 6.0))
            .with("radius", 3.0)
            .with("rotations", 4.0)
            .with("clockwise", false),
        MotionType::Bezier => p
            .with("bezierStart", a)
            .with("bezierControl1", a + DVec3::new(2.0, 4.0, 0.0))
            .with("bezierControl2", a + DVec3::new(6.0, -4.0, 2.0))
            .with("bezierEnd", a + DVec3::new(8.0, 0.0, 0.0))
            .with("easing", "linear"),
        MotionType::CatmullRom => p
            .with(
                "controlPoints",
                vec![
                    a,
                    a + DVec3::new(3.0, 3.0, 0.0),
                    a + DVec3::new(6.0, -3.0, 1.0),
                    a + DVec3::new(9.0, 0.0, 0.0),
                ],
            )
            .with("tension", 0.5)
            .with("closedLoop", false),
        MotionType::Zigzag => p
            .with("zigzagStart", a)
            .with("zigzagEnd", a + DVec3::new(10.0, 0.0, 0.0))
            .with("zigzagCount", 5.0)
            .with("amplitude", 2.0)
            .with("plane", "xy"),
        MotionType::PerlinNoise => p
            .with("center", a)
            .with("bounds", DVec3::new(5.0, 5.0, 2.0))
            .with("frequency", 1.0)
            .with("octaves", 3.0)
            .with("persistence", 0.5)
            .with("scale", 1.0)
            .with("seed", 1.0),
        MotionType::RoseCurve => p
            .with("center", a)
            .with("radius", 5.0)
            .with("petalCount", 4.0)
            .with("rotation", 0.0)
            .with("plane", "xy"),
        MotionType::Epicycloid => p
            .with("center", a)
            .with("fixedRadius", 5.0)
            .with("rollingRadius", 1.5)
            .with("speed", 1.0)
            .with("hypocycloid", false)
            .with("plane", "xy"),
        MotionType::Orbit => p
            .with("center", a)
            .with("radius", 5.0)
            .with("inclination", 0.0)
            .with("phase", 0.0)
            .with("orbits", 1.0),
        MotionType::CircularScan => p
            .with("center", a)
            .with("radius", 6.0)
            .with("height", 0.0)
            .with("sweepCount", 1.0)
            .with("startAngle", 0.0),
        MotionType::Zoom => p
            .with("center", a)
            .with("startDistance", 10.0)
            .with("endDistance", 1.0)
            .with("azimuth", 0.0)
            .with("elevation", 0.0)
            .with("easing", "linear"),
        MotionType::Doppler => p
            .with("pathStart", a + DVec3::new(-10.0, 5.0, 0.0))
            .with("pathEnd", a + DVec3::new(10.0, 5.0, 0.0))
            .with("passBySpeed", 1.0),
        MotionType::AttractRepel => p
            .with("origin", a + DVec3::new(5.0, 0.0, 0.0))
            .with("targetPosition", a)
            .with("strength", 0.8)
            .with("repel", false)
            .with("cycles", 1.0),
        MotionType::Custom => p
            .with(
                "waypoints",
                vec![
                    a,
                    a + DVec3::new(4.0, 0.0, 0.0),
                    a + DVec3::new(4.0, 4.0, 1.0),
                    a + DVec3::new(0.0, 4.0, 0.0),
                ],
            )
            .with("smooth", true),
    }
}

/// Typed parameter access with per-key fallback to the model defaults.
///
/// The defaults are only built on the first miss, so a complete parameter set
/// (the normal case after resolution) costs nothing extra.
pub(crate) struct Params<'a> {
    motion: MotionType,
    params: &'a ParameterSet,
    anchor: DVec3,
    defaults: Option<ParameterSet>,
}

impl<'a> Params<'a> {
    pub(crate) fn new(motion: MotionType, params: &'a ParameterSet, anchor: DVec3) -> Self {
        Params {
            motion,
            params,
            anchor,
            defaults: None,
        }
    }

    fn fallback(&mut self, key: &str) -> Option<&ParamValue> {
        let missing = EngineError::MissingParameter {
            model: self.motion.as_str(),
            key: key.to_string(),
        };
        debug!("{missing}, using default");
        let (motion, anchor) = (self.motion, self.anchor);
        self.defaults
            .get_or_insert_with(|| default_parameters(motion, anchor))
            .get(key)
    }

    pub(crate) fn number(&mut self, key: &str) -> f64 {
        if let Some(n) = self.params.number(key) {
            return n;
        }
        match self.fallback(key) {
            Some(ParamValue::Number(n)) => *n,
            _ => 0.0,
        }
    }

    pub(crate) fn vec3(&mut self, key: &str) -> DVec3 {
        if let Some(v) = self.params.vec3(key) {
            return v;
        }
        let anchor = self.anchor;
        match self.fallback(key) {
            Some(ParamValue::Vec3(v)) => *v,
            _ => anchor,
        }
    }

    pub(crate) fn flag(&mut self, key: &str) -> bool {
        if let Some(b) = self.params.flag(key) {
            return b;
        }
        matches!(self.fallback(key), Some(ParamValue::Flag(true)))
    }

    pub(crate) fn points(&mut self, key: &str) -> Vec<DVec3> {
        if let Some(points) = self.params.points(key) {
            if !points.is_empty() {
                return points.to_vec();
            }
        }
        match self.fallback(key) {
            Some(ParamValue::Points(points)) => points.clone(),
            _ => Vec::new(),
        }
    }

    pub(crate) fn text(&self, key: &str) -> Option<&'a str> {
        self.params.text(key)
    }

    /// Unknown or missing easing names fall back to linear.
    pub(crate) fn easing(&self) -> Easing {
        self.text("easing")
            .and_then(|name| Easing::from_str(name).ok())
            .unwrap_or_default()
    }

    pub(crate) fn plane(&self) -> Plane {
        self.text("plane").map(Plane::parse).unwrap_or_default()
    }
}

/// Plane a 2D curve is drawn in.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Plane {
    /// Horizontal.
    #[default]
    Xy,
    Xz,
    Yz,
}

impl Plane {
    pub fn parse(name: &str) -> Plane {
        match name.to_ascii_lowercase().as_str() {
            "xz" => Plane::Xz,
            "yz" => Plane::Yz,
            _ => Plane::Xy,
        }
    }

    /// Lift plane coordinates `(u, v)` into 3D around `center`.
    pub fn point(self, center: DVec3, u: f64, v: f64) -> DVec3 {
        match self {
            Plane::Xy => center + DVec3::new(u, v, 0.0),
            Plane::Xz => center + DVec3::new(u, 0.0, v),
            Plane::Yz => center + DVec3::new(0.0, u, v),
        }
    }
}

/// Normalized progress `t / duration`, clamped to [0, 1].
pub(crate) fn progress(t: f64, duration: f64) -> f64 {
    if duration > 0.0 {
        (t / duration).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Evaluate a motion model at time `t` (seconds) within `duration`.
pub fn evaluate(
    motion: MotionType,
    params: &ParameterSet,
    t: f64,
    duration: f64,
    ctx: &mut EvalContext<'_>,
) -> Result<DVec3, EngineError> {
    let mut p = Params::new(motion, params, ctx.anchor);
    let u = progress(t, duration);
    let position = match motion {
        MotionType::Linear => paths::linear(&mut p, u),
        MotionType::Bezier => paths::bezier(&mut p, u),
        MotionType::CatmullRom => paths::catmull_rom(&mut p, u),
        MotionType::Zigzag => paths::zigzag(&mut p, u),
        MotionType::Doppler => paths::doppler(&mut p, u),
        MotionType::Zoom => paths::zoom(&mut p, u),
        MotionType::AttractRepel => paths::attract_repel(&mut p, u),
        MotionType::Custom => paths::custom(&mut p, u),
        MotionType::Circular => arcs::circular(&mut p, u),
        MotionType::Elliptical => arcs::elliptical(&mut p, u),
        MotionType::Spiral => arcs::spiral(&mut p, u),
        MotionType::RoseCurve => arcs::rose_curve(&mut p, u),
        MotionType::Epicycloid => arcs::epicycloid(&mut p, u),
        MotionType::Orbit => arcs::orbit(&mut p, u),
        MotionType::CircularScan => arcs::circular_scan(&mut p, u),
        MotionType::Wave => periodic::wave(&mut p, t),
        MotionType::Lissajous => periodic::lissajous(&mut p, u),
        MotionType::Helix => periodic::helix(&mut p, u),
        MotionType::Pendulum => physics::pendulum(&mut p, t, ctx),
        MotionType::Spring => physics::spring(&mut p, t, ctx),
        MotionType::Bounce => physics::bounce(&mut p, t, ctx),
        MotionType::Random => stochastic::random(&mut p, t, duration),
        MotionType::PerlinNoise => stochastic::perlin_noise(&mut p, t),
    };
    if position.is_finite() {
        Ok(position)
    } else {
        Err(EngineError::NonFinitePosition { track: ctx.track })
    }
}
