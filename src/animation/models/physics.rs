//! Physics-integrated models: pendulum, spring and bounce.
//!
//! These models integrate with a fixed step `h`. The stored
//! [`IntegrationState`] only ever holds the state after a whole number of
//! steps; the sub-step remainder up to `t` is integrated on a copy. The
//! result therefore depends only on `(parameters, t, h)` and not on how often
//! the host ticks. When `t` moves backwards (loop wrap, ping-pong reversal)
//! integration resumes from the latest checkpoint at or before `t`, or from
//! the initial conditions when there is none.

use glam::DVec3;

use crate::animation::models::{EvalContext, Params};

/// Generalized coordinate and velocity: the swing angle for the pendulum (in
/// `q.x`), the displacement vector for the spring and the height above the
/// ground for bounce (in `q.z`).
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Phase {
    pub q: DVec3,
    pub v: DVec3,
}

/// Integration state of one physics-driven track.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegrationState {
    pub steps: u64,
    pub phase: Phase,
    /// Initial conditions the state was integrated from.
    initial: Option<Phase>,
    /// `(steps, phase)` every [`CHECKPOINT_INTERVAL`] steps, ascending.
    checkpoints: Vec<(u64, Phase)>,
}

impl IntegrationState {
    fn starting_at(initial: Phase) -> Self {
        IntegrationState {
            steps: 0,
            phase: initial,
            initial: Some(initial),
            checkpoints: Vec::new(),
        }
    }

    /// Move back to the latest checkpoint at or before `target`.
    fn rewind(&mut self, target: u64, initial: Phase) {
        let kept = self.checkpoints.partition_point(|(steps, _)| *steps <= target);
        match kept.checked_sub(1).map(|i| self.checkpoints[i]) {
            Some((steps, phase)) => {
                self.steps = steps;
                self.phase = phase;
            }
            None => {
                self.steps = 0;
                self.phase = initial;
            }
        }
    }
}

/// Upper bound on steps integrated per evaluation, so a corrupt `t` cannot
/// stall the tick.
const MAX_STEPS: u64 = 10_000_000;

/// Steps between two stored checkpoints.
const CHECKPOINT_INTERVAL: u64 = 256;

/// Advance `state` to time `t` with step `h` and return the phase at exactly
/// `t` (remainder integrated on a copy).
fn integrate_to(
    state: &mut IntegrationState,
    initial: Phase,
    t: f64,
    h: f64,
    step: impl Fn(&mut Phase, f64),
) -> Phase {
    let h = if h.is_finite() && h > 0.0 { h } else { super::DEFAULT_PHYSICS_STEP };
    let t = t.max(0.0);
    let target = ((t / h).floor() as u64).min(MAX_STEPS);

    if state.initial != Some(initial) {
        *state = IntegrationState::starting_at(initial);
    }
    if state.steps > target {
        state.rewind(target, initial);
    }
    while state.steps < target {
        step(&mut state.phase, h);
        state.steps += 1;
        let due = state.steps % CHECKPOINT_INTERVAL == 0
            && state.checkpoints.last().is_none_or(|(steps, _)| *steps < state.steps);
        if due {
            state.checkpoints.push((state.steps, state.phase));
        }
    }

    let mut exact = state.phase;
    let remainder = t - target as f64 * h;
    if remainder > 0.0 {
        step(&mut exact, remainder);
    }
    exact
}

/// Run the integration against the context state, or a scratch state when
/// the caller does not keep one.
fn run(
    ctx: &mut EvalContext<'_>,
    initial: Phase,
    t: f64,
    step: impl Fn(&mut Phase, f64),
) -> Phase {
    let h = ctx.physics_step;
    match ctx.state.as_deref_mut() {
        Some(state) => integrate_to(state, initial, t, h, step),
        None => {
            let mut scratch = IntegrationState::default();
            integrate_to(&mut scratch, initial, t, h, step)
        }
    }
}

/// Damped pendulum hanging from `anchorPoint`, swinging in the vertical plane
/// facing `swingAzimuth` degrees.
pub(crate) fn pendulum(p: &mut Params, t: f64, ctx: &mut EvalContext<'_>) -> DVec3 {
    let anchor = p.vec3("anchorPoint");
    let length = p.number("length").max(1e-6);
    let theta0 = p.number("initialAngle").to_radians();
    let damping = p.number("damping").max(0.0);
    let gravity = p.number("gravity");
    let azimuth = p.number("swingAzimuth").to_radians();

    let initial = Phase {
        q: DVec3::new(theta0, 0.0, 0.0),
        v: DVec3::ZERO,
    };
    let state = run(ctx, initial, t, |s, dt| {
        let accel = -(gravity / length) * s.q.x.sin() - damping * s.v.x;
        s.v.x += accel * dt;
        s.q.x += s.v.x * dt;
    });

    let theta = state.q.x;
    let swing = DVec3::new(azimuth.sin(), azimuth.cos(), 0.0);
    anchor + swing * (length * theta.sin()) - DVec3::Z * (length * theta.cos())
}

/// Damped harmonic oscillator released from `initialDisplacement`.
pub(crate) fn spring(p: &mut Params, t: f64, ctx: &mut EvalContext<'_>) -> DVec3 {
    let rest = p.vec3("restPosition");
    let displacement = p.vec3("initialDisplacement");
    let stiffness = p.number("stiffness").max(0.0);
    let damping = p.number("damping").max(0.0);
    let mass = p.number("mass").max(1e-6);

    let initial = Phase {
        q: displacement,
        v: DVec3::ZERO,
    };
    let state = run(ctx, initial, t, |s, dt| {
        let accel = (-stiffness * s.q - damping * s.v) / mass;
        s.v += accel * dt;
        s.q += s.v * dt;
    });
    rest + state.q
}

/// Ball dropped from `startHeight` above `center`, bouncing on `groundLevel`.
pub(crate) fn bounce(p: &mut Params, t: f64, ctx: &mut EvalContext<'_>) -> DVec3 {
    let center = p.vec3("center");
    let start = p.number("startHeight");
    let ground = p.number("groundLevel");
    let restitution = p.number("restitution").clamp(0.0, 1.0);
    let gravity = p.number("gravity").abs();

    let initial = Phase {
        q: DVec3::new(0.0, 0.0, start.max(ground)),
        v: DVec3::ZERO,
    };
    let state = run(ctx, initial, t, |s, dt| {
        s.v.z -= gravity * dt;
        s.q.z += s.v.z * dt;
        if s.q.z < ground {
            s.q.z = ground + (ground - s.q.z) * restitution;
            s.v.z = -s.v.z * restitution;
            // settle instead of jittering on the ground
            if s.v.z.abs() < gravity * dt {
                s.v.z = 0.0;
                s.q.z = ground;
            }
        }
    });
    center + DVec3::new(0.0, 0.0, state.q.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::definition::{MotionType, ParameterSet};
    use crate::animation::models::{default_parameters, evaluate};
    use crate::components::track::TrackId;

    const EPSILON: f64 = 1e-9;

    fn vec_approx_eq(a: DVec3, b: DVec3) -> bool {
        (a - b).abs().max_element() < EPSILON
    }

    /// Evaluate at `end` after ticking with `dt` from zero, keeping state.
    fn ticked(motion: MotionType, params: &ParameterSet, dt: f64, end: f64) -> DVec3 {
        let mut state = IntegrationState::default();
        let mut t = 0.0;
        let mut last = DVec3::ZERO;
        while t < end {
            t = (t + dt).min(end);
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            last = evaluate(motion, params, t, 10.0, &mut ctx).unwrap();
        }
        last
    }

    #[test]
    fn test_results_independent_of_tick_rate() {
        for motion in [MotionType::Pendulum, MotionType::Spring, MotionType::Bounce] {
            let params = default_parameters(motion, DVec3::ZERO);
            let at_60 = ticked(motion, &params, 1.0 / 60.0, 3.0);
            let at_144 = ticked(motion, &params, 1.0 / 144.0, 3.0);
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO);
            let direct = evaluate(motion, &params, 3.0, 10.0, &mut ctx).unwrap();
            assert!(vec_approx_eq(at_60, direct), "{motion} 60Hz");
            assert!(vec_approx_eq(at_144, direct), "{motion} 144Hz");
        }
    }

    #[test]
    fn test_state_resets_when_time_goes_backwards() {
        let params = default_parameters(MotionType::Spring, DVec3::ZERO);
        let mut state = IntegrationState::default();
        {
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            evaluate(MotionType::Spring, &params, 4.0, 10.0, &mut ctx).unwrap();
        }
        let steps_at_4 = state.steps;
        let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
        let pos = evaluate(MotionType::Spring, &params, 0.0, 10.0, &mut ctx).unwrap();
        assert!(vec_approx_eq(pos, DVec3::new(3.0, 0.0, 0.0)));
        assert!(state.steps < steps_at_4);
    }

    #[test]
    fn test_reversal_resumes_from_checkpoint() {
        let params = default_parameters(MotionType::Pendulum, DVec3::ZERO);
        let mut state = IntegrationState::default();
        {
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            evaluate(MotionType::Pendulum, &params, 30.0, 60.0, &mut ctx).unwrap();
        }
        let stored = state.checkpoints.len();
        assert!(stored > 20);

        // walk backwards like a ping-pong reversal
        let mut t = 30.0;
        for _ in 0..120 {
            t -= 1.0 / 60.0;
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            let pos = evaluate(MotionType::Pendulum, &params, t, 60.0, &mut ctx).unwrap();
            let mut fresh = EvalContext::new(TrackId(1), DVec3::ZERO);
            let direct = evaluate(MotionType::Pendulum, &params, t, 60.0, &mut fresh).unwrap();
            assert_eq!(pos, direct, "t={t}");
            assert!(state.steps > CHECKPOINT_INTERVAL);
        }
        assert_eq!(state.checkpoints.len(), stored);
    }

    #[test]
    fn test_new_initial_conditions_restart_integration() {
        let mut state = IntegrationState::default();
        let soft = default_parameters(MotionType::Spring, DVec3::ZERO);
        {
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            evaluate(MotionType::Spring, &soft, 2.0, 10.0, &mut ctx).unwrap();
        }
        let moved = soft.clone().with("initialDisplacement", DVec3::new(0.0, 1.0, 0.0));
        let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
        let pos = evaluate(MotionType::Spring, &moved, 0.0, 10.0, &mut ctx).unwrap();
        assert!(vec_approx_eq(pos, DVec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_pendulum_starts_at_initial_angle() {
        let params = ParameterSet::new()
            .with("anchorPoint", DVec3::new(0.0, 0.0, 5.0))
            .with("length", 5.0)
            .with("initialAngle", 90.0)
            .with("swingAzimuth", 90.0);
        let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO);
        let pos = evaluate(MotionType::Pendulum, &params, 0.0, 10.0, &mut ctx).unwrap();
        assert!(vec_approx_eq(pos, DVec3::new(5.0, 0.0, 5.0)));
    }

    #[test]
    fn test_spring_settles_toward_rest() {
        let params = default_parameters(MotionType::Spring, DVec3::ZERO).with("damping", 4.0);
        let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO);
        let pos = evaluate(MotionType::Spring, &params, 10.0, 10.0, &mut ctx).unwrap();
        assert!(pos.length() < 0.05);
    }

    #[test]
    fn test_bounce_never_goes_below_ground() {
        let params = default_parameters(MotionType::Bounce, DVec3::ZERO);
        let mut state = IntegrationState::default();
        for i in 0..600 {
            let t = f64::from(i) / 60.0;
            let mut ctx = EvalContext::new(TrackId(1), DVec3::ZERO).with_state(&mut state);
            let pos = evaluate(MotionType::Bounce, &params, t, 10.0, &mut ctx).unwrap();
            assert!(pos.z >= -1e-6, "t={t} z={}", pos.z);
        }
    }
}
