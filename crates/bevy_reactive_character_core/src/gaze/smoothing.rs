use bevy::math::Vec3;

/// Critically damped spring towards `target`, reaching it in roughly `smooth_time` seconds.
///
/// `velocity` carries the spring state between calls. The result never overshoots the target.
pub fn smooth_damp(
    current: Vec3,
    target: Vec3,
    velocity: &mut Vec3,
    smooth_time: f32,
    delta: f32,
) -> Vec3 {
    if delta <= 0. {
        return current;
    }

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2. / smooth_time;
    let x = omega * delta;
    let decay = 1. / (1. + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * delta;
    *velocity = (*velocity - omega * temp) * decay;

    let output = target + (change + temp) * decay;

    if (target - current).dot(output - target) > 0. {
        *velocity = Vec3::ZERO;
        return target;
    }

    output
}

/// Moves `current` towards `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}
