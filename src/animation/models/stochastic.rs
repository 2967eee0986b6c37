//! Seeded random walk and gradient noise.
//!
//! Both models are pure functions of their parameters and `t`: every random
//! value comes from a [`fastrand::Rng`] seeded with the parameter `seed`
//! mixed with a lattice index, never from a shared generator.

use glam::DVec3;

use crate::animation::models::Params;

/// SplitMix64 finalizer, used to decorrelate neighbouring lattice indices.
fn mix(seed: u64, index: i64) -> u64 {
    let mut z = seed
        .wrapping_add(0x9E37_79B9_7F4A_7C15)
        .wrapping_add((index as u64).wrapping_mul(0xBF58_476D_1CE4_E5B9));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn seed_of(p: &mut Params) -> u64 {
    p.number("seed").abs().round() as u64
}

/// Uniform sample in [-1, 1].
fn signed_unit(rng: &mut fastrand::Rng) -> f64 {
    rng.f64() * 2.0 - 1.0
}

/// Smoothly interpolated random waypoints inside `bounds` around `center`.
///
/// `updateFrequency` waypoints are drawn per second; waypoint 0 is the
/// center itself, so the path starts at its origin.
pub(crate) fn random(p: &mut Params, t: f64, duration: f64) -> DVec3 {
    let center = p.vec3("center");
    let bounds = p.vec3("bounds");
    let frequency = p.number("updateFrequency").max(1e-3);
    let smoothing = p.number("smoothing").clamp(0.0, 1.0);
    let seed = seed_of(p);

    let waypoint = |k: i64| -> DVec3 {
        if k <= 0 {
            return center;
        }
        let mut rng = fastrand::Rng::with_seed(mix(seed, k));
        center
            + bounds
                * DVec3::new(
                    signed_unit(&mut rng),
                    signed_unit(&mut rng),
                    signed_unit(&mut rng),
                )
    };

    let x = t.clamp(0.0, duration.max(0.0)) * frequency;
    let k = x.floor();
    let s = x - k;
    let smooth = s * s * (3.0 - 2.0 * s);
    let blend = s + (smooth - s) * smoothing;
    let k = k as i64;
    waypoint(k).lerp(waypoint(k + 1), blend)
}

fn fade(f: f64) -> f64 {
    f * f * f * (f * (f * 6.0 - 15.0) + 10.0)
}

/// 1D gradient noise, zero at every integer lattice point, roughly in [-1, 1].
pub fn gradient_noise(seed: u64, x: f64) -> f64 {
    let i = x.floor();
    let f = x - i;
    let i = i as i64;
    let g0 = signed_unit(&mut fastrand::Rng::with_seed(mix(seed, i)));
    let g1 = signed_unit(&mut fastrand::Rng::with_seed(mix(seed, i + 1)));
    let a = g0 * f;
    let b = g1 * (f - 1.0);
    2.0 * (a + (b - a) * fade(f))
}

/// Fractal sum of `octaves` layers of gradient noise, normalized to the
/// total amplitude.
pub fn fractal_noise(seed: u64, x: f64, octaves: u32, persistence: f64) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut norm = 0.0;
    let mut frequency = 1.0;
    for octave in 0..octaves.max(1) {
        total += gradient_noise(seed.wrapping_add(u64::from(octave)), x * frequency) * amplitude;
        norm += amplitude;
        amplitude *= persistence;
        frequency *= 2.0;
    }
    if norm > 0.0 { total / norm } else { 0.0 }
}

/// Organic drift inside `bounds`: one independent noise channel per axis.
pub(crate) fn perlin_noise(p: &mut Params, t: f64) -> DVec3 {
    let center = p.vec3("center");
    let bounds = p.vec3("bounds");
    let frequency = p.number("frequency");
    let octaves = p.number("octaves").clamp(1.0, 8.0) as u32;
    let persistence = p.number("persistence").clamp(0.0, 1.0);
    let scale = p.number("scale");
    let seed = seed_of(p);

    let x = t.max(0.0) * frequency;
    let channel = |axis: u64| fractal_noise(mix(seed, axis as i64), x, octaves, persistence);
    center + bounds * scale * DVec3::new(channel(0), channel(1), channel(2))
}
