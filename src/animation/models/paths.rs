//! Point-to-point and spline paths.
//!
//! All functions take the normalized progress `u` in [0, 1].

use glam::DVec3;

use crate::animation::coords::from_aed;
use crate::animation::easing::lerp;
use crate::animation::models::{Params, Plane};

pub(crate) fn linear(p: &mut Params, u: f64) -> DVec3 {
    let start = p.vec3("startPosition");
    let end = p.vec3("endPosition");
    start.lerp(end, p.easing().apply(u))
}

pub(crate) fn bezier(p: &mut Params, u: f64) -> DVec3 {
    let p0 = p.vec3("bezierStart");
    let p1 = p.vec3("bezierControl1");
    let p2 = p.vec3("bezierControl2");
    let p3 = p.vec3("bezierEnd");
    let s = p.easing().apply(u);
    let r = 1.0 - s;
    p0 * (r * r * r) + p1 * (3.0 * r * r * s) + p2 * (3.0 * r * s * s) + p3 * (s * s * s)
}

pub(crate) fn catmull_rom(p: &mut Params, u: f64) -> DVec3 {
    let points = p.points("controlPoints");
    let tension = p.number("tension");
    let closed = p.flag("closedLoop");
    spline(&points, tension, closed, u)
}

pub(crate) fn zigzag(p: &mut Params, u: f64) -> DVec3 {
    let start = p.vec3("zigzagStart");
    let end = p.vec3("zigzagEnd");
    let count = p.number("zigzagCount").max(0.0);
    let amplitude = p.number("amplitude");
    let normal = match p.plane() {
        Plane::Xy => DVec3::Z,
        Plane::Xz => DVec3::Y,
        Plane::Yz => DVec3::X,
    };
    let dir = end - start;
    let mut side = dir.cross(normal).normalize_or_zero();
    if side == DVec3::ZERO {
        side = normal.any_orthonormal_vector();
    }
    start.lerp(end, u) + side * (amplitude * triangle(u * count))
}

pub(crate) fn doppler(p: &mut Params, u: f64) -> DVec3 {
    let start = p.vec3("pathStart");
    let end = p.vec3("pathEnd");
    let speed = p.number("passBySpeed").max(0.0);
    start.lerp(end, (u * speed).clamp(0.0, 1.0))
}

pub(crate) fn zoom(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let from = p.number("startDistance");
    let to = p.number("endDistance");
    let azimuth = p.number("azimuth");
    let elevation = p.number("elevation");
    let distance = lerp(from, to, p.easing().apply(u));
    center + from_aed(azimuth, elevation, distance)
}

pub(crate) fn attract_repel(p: &mut Params, u: f64) -> DVec3 {
    let origin = p.vec3("origin");
    let target = p.vec3("targetPosition");
    let strength = p.number("strength").clamp(0.0, 1.0);
    let cycles = p.number("cycles").max(0.0);
    let pull = (std::f64::consts::PI * cycles * u).sin().powi(2) * strength;
    if p.flag("repel") {
        origin + (origin - target) * pull
    } else {
        origin + (target - origin) * pull
    }
}

pub(crate) fn custom(p: &mut Params, u: f64) -> DVec3 {
    let waypoints = p.points("waypoints");
    if p.flag("smooth") {
        spline(&waypoints, 0.5, false, u)
    } else {
        polyline(&waypoints, u)
    }
}

/// Triangle wave with period 1: 0 → 1 → -1 → 0.
fn triangle(x: f64) -> f64 {
    let f = x - x.floor();
    if f < 0.25 {
        4.0 * f
    } else if f < 0.75 {
        2.0 - 4.0 * f
    } else {
        4.0 * f - 4.0
    }
}

/// Segment index and local parameter for `segments` equal segments.
fn segment(u: f64, segments: usize) -> (usize, f64) {
    let scaled = u.clamp(0.0, 1.0) * segments as f64;
    let index = (scaled.floor() as usize).min(segments - 1);
    (index, scaled - index as f64)
}

fn polyline(points: &[DVec3], u: f64) -> DVec3 {
    match points {
        [] => DVec3::ZERO,
        [only] => *only,
        _ => {
            let (i, s) = segment(u, points.len() - 1);
            points[i].lerp(points[i + 1], s)
        }
    }
}

/// Cardinal spline through `points`; `tension = 0.5` is Catmull-Rom.
fn spline(points: &[DVec3], tension: f64, closed: bool, u: f64) -> DVec3 {
    let n = points.len();
    if n < 2 {
        return points.first().copied().unwrap_or(DVec3::ZERO);
    }
    let segments = if closed { n } else { n - 1 };
    let (i, s) = segment(u, segments);

    let at = |k: isize| -> DVec3 {
        if closed {
            points[k.rem_euclid(n as isize) as usize]
        } else {
            points[k.clamp(0, n as isize - 1) as usize]
        }
    };
    let i = i as isize;
    let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
    let m1 = (p2 - p0) * tension;
    let m2 = (p3 - p1) * tension;

    let s2 = s * s;
    let s3 = s2 * s;
    p1 * (2.0 * s3 - 3.0 * s2 + 1.0)
        + m1 * (s3 - 2.0 * s2 + s)
        + p2 * (-2.0 * s3 + 3.0 * s2)
        + m2 * (s3 - s2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::definition::{MotionType, ParameterSet};

    const EPSILON: f64 = 1e-9;

    fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    fn params(motion: MotionType, set: &ParameterSet) -> Params<'_> {
        Params::new(motion, set, DVec3::ZERO)
    }

    #[test]
    fn test_linear_endpoints_and_midpoint() {
        let set = ParameterSet::new()
            .with("startPosition", DVec3::ZERO)
            .with("endPosition", DVec3::new(10.0, 0.0, 0.0));
        let mut p = params(MotionType::Linear, &set);
        assert!(vec_approx_eq(linear(&mut p, 0.0), DVec3::ZERO));
        assert!(vec_approx_eq(linear(&mut p, 0.5), DVec3::new(5.0, 0.0, 0.0)));
        assert!(vec_approx_eq(linear(&mut p, 1.0), DVec3::new(10.0, 0.0, 0.0)));
    }

    #[test]
    fn test_linear_uses_easing() {
        let set = ParameterSet::new()
            .with("startPosition", DVec3::ZERO)
            .with("endPosition", DVec3::new(10.0, 0.0, 0.0))
            .with("easing", "quad-in");
        let mut p = params(MotionType::Linear, &set);
        assert!(vec_approx_eq(linear(&mut p, 0.5), DVec3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn test_bezier_hits_endpoints() {
        let set = ParameterSet::new()
            .with("bezierStart", DVec3::ZERO)
            .with("bezierControl1", DVec3::new(1.0, 5.0, 0.0))
            .with("bezierControl2", DVec3::new(3.0, -5.0, 0.0))
            .with("bezierEnd", DVec3::new(4.0, 0.0, 0.0));
        let mut p = params(MotionType::Bezier, &set);
        assert!(vec_approx_eq(bezier(&mut p, 0.0), DVec3::ZERO));
        assert!(vec_approx_eq(bezier(&mut p, 1.0), DVec3::new(4.0, 0.0, 0.0)));
    }

    #[test]
    fn test_spline_passes_through_control_points() {
        let pts = vec![
            DVec3::ZERO,
            DVec3::new(1.0, 1.0, 0.0),
            DVec3::new(2.0, 0.0, 0.0),
        ];
        assert!(vec_approx_eq(spline(&pts, 0.5, false, 0.0), pts[0]));
        assert!(vec_approx_eq(spline(&pts, 0.5, false, 0.5), pts[1]));
        assert!(vec_approx_eq(spline(&pts, 0.5, false, 1.0), pts[2]));
    }

    #[test]
    fn test_closed_spline_returns_to_start() {
        let pts = vec![
            DVec3::ZERO,
            DVec3::new(1.0, 0.0, 0.0),
            DVec3::new(1.0, 1.0, 0.0),
        ];
        assert!(vec_approx_eq(spline(&pts, 0.5, true, 1.0), pts[0]));
    }

    #[test]
    fn test_polyline_equal_segments() {
        let pts = vec![DVec3::ZERO, DVec3::X, DVec3::X + DVec3::Y];
        assert!(vec_approx_eq(polyline(&pts, 0.25), DVec3::new(0.5, 0.0, 0.0)));
        assert!(vec_approx_eq(polyline(&pts, 0.75), DVec3::new(1.0, 0.5, 0.0)));
    }

    #[test]
    fn test_triangle_wave() {
        assert!((triangle(0.0)).abs() < EPSILON);
        assert!((triangle(0.25) - 1.0).abs() < EPSILON);
        assert!((triangle(0.75) + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_zigzag_stays_on_axis_at_ends() {
        let set = ParameterSet::new()
            .with("zigzagStart", DVec3::ZERO)
            .with("zigzagEnd", DVec3::new(10.0, 0.0, 0.0))
            .with("zigzagCount", 5.0)
            .with("amplitude", 2.0);
        let mut p = params(MotionType::Zigzag, &set);
        assert!(vec_approx_eq(zigzag(&mut p, 0.0), DVec3::ZERO));
        assert!(vec_approx_eq(zigzag(&mut p, 1.0), DVec3::new(10.0, 0.0, 0.0)));
        let peak = zigzag(&mut p, 0.05);
        assert!((peak.y.abs() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_zoom_moves_along_direction() {
        let set = ParameterSet::new()
            .with("center", DVec3::ZERO)
            .with("startDistance", 10.0)
            .with("endDistance", 2.0)
            .with("azimuth", 0.0)
            .with("elevation", 0.0);
        let mut p = params(MotionType::Zoom, &set);
        assert!(vec_approx_eq(zoom(&mut p, 0.0), DVec3::new(0.0, 10.0, 0.0)));
        assert!(vec_approx_eq(zoom(&mut p, 1.0), DVec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn test_attract_returns_to_origin_each_cycle() {
        let set = ParameterSet::new()
            .with("origin", DVec3::new(5.0, 0.0, 0.0))
            .with("targetPosition", DVec3::ZERO)
            .with("strength", 1.0)
            .with("cycles", 1.0);
        let mut p = params(MotionType::AttractRepel, &set);
        assert!(vec_approx_eq(attract_repel(&mut p, 0.0), DVec3::new(5.0, 0.0, 0.0)));
        assert!(vec_approx_eq(attract_repel(&mut p, 0.5), DVec3::ZERO));
    }
}
