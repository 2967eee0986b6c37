//! Circles, ellipses, spirals and related closed curves.

use std::f64::consts::TAU;

use glam::DVec3;

use crate::animation::easing::lerp;
use crate::animation::models::Params;

pub(crate) fn circular(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let radius = p.number("radius");
    let start = p.number("startAngle");
    let end = p.number("endAngle");
    let angle = lerp(start, end, u).to_radians();
    p.plane()
        .point(center, radius * angle.cos(), radius * angle.sin())
}

pub(crate) fn elliptical(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let rx = p.number("radiusX");
    let ry = p.number("radiusY");
    let rz = p.number("radiusZ");
    let start = p.number("startAngle");
    let end = p.number("endAngle");
    let angle = lerp(start, end, u).to_radians();
    center + DVec3::new(rx * angle.cos(), ry * angle.sin(), rz * angle.sin())
}

pub(crate) fn spiral(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let r0 = p.number("startRadius");
    let r1 = p.number("endRadius");
    let rotations = p.number("rotations");
    let sign = if p.flag("clockwise") { -1.0 } else { 1.0 };
    let radius = lerp(r0, r1, u);
    let angle = sign * TAU * rotations * u;
    p.plane()
        .point(center, radius * angle.cos(), radius * angle.sin())
}

/// Rhodonea curve. An even petal count `n` uses `k = n / 2`, which draws `n`
/// petals over a full turn.
pub(crate) fn rose_curve(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let radius = p.number("radius");
    let petals = p.number("petalCount").round().max(1.0);
    let rotation = p.number("rotation").to_radians();
    let k = if petals as i64 % 2 == 0 {
        petals / 2.0
    } else {
        petals
    };
    let theta = TAU * u;
    let r = radius * (k * theta).cos();
    p.plane().point(
        center,
        r * (theta + rotation).cos(),
        r * (theta + rotation).sin(),
    )
}

pub(crate) fn epicycloid(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let big = p.number("fixedRadius");
    let small = p.number("rollingRadius");
    let speed = p.number("speed");
    let hypo = p.flag("hypocycloid");
    let plane = p.plane();
    let theta = TAU * speed * u;

    if small.abs() < f64::EPSILON {
        return plane.point(center, big * theta.cos(), big * theta.sin());
    }
    let (x, y) = if hypo {
        let d = big - small;
        let ratio = d / small;
        (
            d * theta.cos() + small * (ratio * theta).cos(),
            d * theta.sin() - small * (ratio * theta).sin(),
        )
    } else {
        let s = big + small;
        let ratio = s / small;
        (
            s * theta.cos() - small * (ratio * theta).cos(),
            s * theta.sin() - small * (ratio * theta).sin(),
        )
    };
    plane.point(center, x, y)
}

/// Circular orbit tilted about the X axis by `inclination` degrees.
pub(crate) fn orbit(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let radius = p.number("radius");
    let inclination = p.number("inclination").to_radians();
    let phase = p.number("phase").to_radians();
    let orbits = p.number("orbits");
    let angle = phase + TAU * orbits * u;
    let x = radius * angle.cos();
    let y = radius * angle.sin();
    center + DVec3::new(x, y * inclination.cos(), y * inclination.sin())
}

/// Azimuth sweep around the listener: angle 0 is front (+Y), 90 is right.
pub(crate) fn circular_scan(p: &mut Params, u: f64) -> DVec3 {
    let center = p.vec3("center");
    let radius = p.number("radius");
    let height = p.number("height");
    let sweeps = p.number("sweepCount");
    let start = p.number("startAngle");
    let angle = (start + 360.0 * sweeps * u).to_radians();
    center + DVec3::new(radius * angle.sin(), radius * angle.cos(), height)
}
