//! Critically-damped smoothing primitives (scalar, angular, coupled 2D).
#![forbid(unsafe_code)]

use rapier3d::prelude::Real;

/// Sentinel smooth time meaning "do not move at all".
///
/// `smooth_damp` and friends return the current value unchanged when given
/// it. Callers use this instead of dividing a base smooth time by a zero
/// responsiveness factor.
pub const FROZEN_SMOOTH_TIME: Real = Real::MAX;

const MIN_SMOOTH_TIME: Real = 1.0e-4;

/// Moves `current` toward `target` with critical damping (no overshoot).
///
/// `velocity` is the filter's rate memory from the previous call, not a
/// physical velocity; feed the returned value back in next tick.
/// `smooth_time` approximates the settling time in seconds.
pub fn smooth_damp(
    current: Real,
    target: Real,
    velocity: Real,
    smooth_time: Real,
    dt: Real,
) -> (Real, Real) {
    if dt <= 0.0 || smooth_time >= FROZEN_SMOOTH_TIME {
        return (current, velocity);
    }
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (velocity + omega * change) * dt;
    let mut next_velocity = (velocity - omega * temp) * decay;
    let mut next = (current - change) + (change + temp) * decay;
    // The filter is critically damped, but the polynomial decay
    // approximation can still cross the target; clamp exactly onto it.
    if (target - current > 0.0) == (next > target) {
        next = target;
        next_velocity = 0.0;
    }
    (next, next_velocity)
}

/// Shortest signed angular difference from `current` to `target`,
/// in degrees, in (-180, 180].
pub fn delta_angle(current: Real, target: Real) -> Real {
    let mut delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta -= 360.0;
    }
    delta
}

/// `smooth_damp` over degrees, always traversing the short arc across the
/// +/-180 wrap. The result accumulates freely (it is not renormalized).
pub fn smooth_damp_angle(
    current: Real,
    target: Real,
    velocity: Real,
    smooth_time: Real,
    dt: Real,
) -> (Real, Real) {
    let near_target = current + delta_angle(current, target);
    smooth_damp(current, near_target, velocity, smooth_time, dt)
}

/// Coupled 2-vector `smooth_damp`: both components share one damped
/// approach, so diagonal motion curves toward the target instead of
/// settling each axis independently.
pub fn smooth_damp2(
    current: [Real; 2],
    target: [Real; 2],
    velocity: [Real; 2],
    smooth_time: Real,
    dt: Real,
) -> ([Real; 2], [Real; 2]) {
    if dt <= 0.0 || smooth_time >= FROZEN_SMOOTH_TIME {
        return (current, velocity);
    }
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = [current[0] - target[0], current[1] - target[1]];
    let temp = [
        (velocity[0] + omega * change[0]) * dt,
        (velocity[1] + omega * change[1]) * dt,
    ];
    let mut next_velocity = [
        (velocity[0] - omega * temp[0]) * decay,
        (velocity[1] - omega * temp[1]) * decay,
    ];
    let mut next = [
        (current[0] - change[0]) + (change[0] + temp[0]) * decay,
        (current[1] - change[1]) + (change[1] + temp[1]) * decay,
    ];
    // Overshoot test on the whole vector: has the output passed the target
    // along the original approach direction?
    let to_target = [target[0] - current[0], target[1] - current[1]];
    let past = [next[0] - target[0], next[1] - target[1]];
    if to_target[0] * past[0] + to_target[1] * past[1] > 0.0 {
        next = target;
        next_velocity = [0.0, 0.0];
    }
    (next, next_velocity)
}
