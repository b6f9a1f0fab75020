/// Hermite smoothstep of `t`, clamped to `[0, 1]`.
///
/// Symmetric around one half: `smoothstep(t) + smoothstep(1 - t) == 1`.
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0., 1.);
    t * t * (3. - 2. * t)
}
