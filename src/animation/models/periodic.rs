//! Waves, Lissajous figures and helices.

use std::f64::consts::TAU;

use glam::DVec3;

use crate::animation::models::Params;

/// Waveform of the `wave` model, read from `waveType`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaveShape {
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveShape {
    pub fn parse(name: &str) -> WaveShape {
        match name.to_ascii_lowercase().as_str() {
            "square" => WaveShape::Square,
            "triangle" => WaveShape::Triangle,
            "sawtooth" => WaveShape::Sawtooth,
            _ => WaveShape::Sine,
        }
    }

    /// Value in [-1, 1] for a phase in cycles. Every shape is 0 at phase 0.
    pub fn sample(self, cycles: f64) -> f64 {
        let f = cycles - cycles.floor();
        match self {
            WaveShape::Sine => (TAU * cycles).sin(),
            WaveShape::Square => {
                if f == 0.0 || f == 0.5 {
                    0.0
                } else if f < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Triangle => {
                if f < 0.25 {
                    4.0 * f
                } else if f < 0.75 {
                    2.0 - 4.0 * f
                } else {
                    4.0 * f - 4.0
                }
            }
            WaveShape::Sawtooth => {
                if f < 0.5 {
                    2.0 * f
                } else {
                    2.0 * f - 2.0
                }
            }
        }
    }
}

/// Oscillation around `center` along the `amplitude` vector. Uses absolute
/// time `t` in seconds so `frequency` is in Hz.
pub(crate) fn wave(p: &mut Params, t: f64) -> DVec3 {
    let center = p.vec3("center");
    let amplitude = p.vec3("amplitude");
    let frequency = p.number("frequency");
    let phase = p.number("phase");
    let shape = p.text("waveType").map(WaveShape::parse).unwrap_or(WaveShape::Sine);
    let cycles = frequency * t + phase / 360.0;
    center + amplitude * shape.sample(cycles)
}

pub(crate) fn lissajous(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let a = p.number("frequencyRatioA");
    let b = p.number("frequencyRatioB");
    let delta = p.number("phaseDifference").to_radians();
    let ax = p.number("amplitudeX");
    let ay = p.number("amplitudeY");
    let az = p.number("amplitudeZ");
    let theta = TAU * u;
    center
        + DVec3::new(
            ax * (a * theta + delta).sin(),
            ay * (b * theta).sin(),
            az * ((a + b) * theta).sin(),
        )
}

pub(crate) fn helix(p: &mut Params, u: f64) -> DVec3 {
    let start = p.vec3("axisStart");
    let end = p.vec3("axisEnd");
    let radius = p.number("radius");
    let rotations = p.number("rotations");
    let sign = if p.flag("clockwise") { -1.0 } else { 1.0 };

    let axis = (end - start).try_normalize().unwrap_or(DVec3::Z);
    let (e1, e2) = axis.any_orthonormal_pair();
    let angle = sign * TAU * rotations * u;
    start.lerp(end, u) + (e1 * angle.cos() + e2 * angle.sin()) * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::definition::{MotionType, ParameterSet};

    const EPSILON: f64 = 1e-9;

    fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    #[test]
    fn test_wave_shapes_start_at_zero() {
        for shape in [
            WaveShape::Sine,
            WaveShape::Square,
            WaveShape::Triangle,
            WaveShape::Sawtooth,
        ] {
            assert!(shape.sample(0.0).abs() < EPSILON, "{shape:?}");
        }
    }

    #[test]
    fn test_wave_peak_at_quarter_period() {
        let set = ParameterSet::new()
            .with("center", DVec3::ZERO)
            .with("amplitude", DVec3::new(0.0, 0.0, 2.0))
            .with("frequency", 1.0)
            .with("phase", 0.0);
        let mut p = Params::new(MotionType::Wave, &set, DVec3::ZERO);
        assert!(vec_approx_eq(wave(&mut p, 0.25), DVec3::new(0.0, 0.0, 2.0)));
        assert!(vec_approx_eq(wave(&mut p, 0.75), DVec3::new(0.0, 0.0, -2.0)));
    }

    #[test]
    fn test_lissajous_closes() {
        let set = ParameterSet::new().with("center", DVec3::ONE);
        let mut p = Params::new(MotionType::Lissajous, &set, DVec3::ZERO);
        assert!(vec_approx_eq(lissajous(&mut p, 0.0), lissajous(&mut p, 1.0)));
    }

    #[test]
    fn test_helix_climbs_axis_at_constant_radius() {
        let set = ParameterSet::new()
            .with("axisStart", DVec3::ZERO)
            .with("axisEnd", DVec3::new(0.0, 0.0, 6.0))
            .with("radius", 3.0)
            .with("rotations", 4.0);
        let mut p = Params::new(MotionType::Helix, &set, DVec3::ZERO);
        for u in [0.0, 0.3, 0.5, 1.0] {
            let pos = helix(&mut p, u);
            assert!((pos.z - 6.0 * u).abs() < EPSILON);
            assert!((pos.truncate().length() - 3.0).abs() < EPSILON);
        }
    }
}
