//! World-side signal sources read by the condition evaluators.

use bevy::{
    ecs::{
        component::Component,
        entity::Entity,
        query::With,
        reflect::{ReflectComponent, ReflectResource},
        resource::Resource,
        system::{Query, Res, SystemParam},
    },
    log::trace,
    math::Vec3,
    reflect::{Reflect, std_traits::ReflectDefault},
    time::Time,
    transform::components::GlobalTransform,
};
use bevy_reactive_character_core::condition::WorldSignals;

/// Speed of an entity, measured from its `GlobalTransform` every frame and exponentially
/// smoothed.
#[derive(Component, Reflect, Clone, Debug, PartialEq)]
#[reflect(Component, Default)]
pub struct TrackedVelocity {
    /// Time constant of the smoothing, in seconds
    pub smoothing: f32,
    speed: f32,
    last_position: Option<Vec3>,
}

impl Default for TrackedVelocity {
    fn default() -> Self {
        Self::with_smoothing(0.25)
    }
}

impl TrackedVelocity {
    pub fn with_smoothing(smoothing: f32) -> Self {
        Self {
            smoothing,
            speed: 0.,
            last_position: None,
        }
    }

    /// Smoothed speed in units per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn sample(&mut self, position: Vec3, delta: f32) {
        let Some(last_position) = self.last_position.replace(position) else {
            return;
        };
        if delta <= 0. {
            return;
        }

        let raw = last_position.distance(position) / delta;
        let blend = if self.smoothing > 0. {
            1. - (-delta / self.smoothing).exp()
        } else {
            1.
        };
        self.speed += (raw - self.speed) * blend;
    }
}

/// Spectrum of the sound currently emitted by an entity, one magnitude per frequency bin.
///
/// Whatever plays the entity's audio is expected to refresh `bins` every frame.
#[derive(Component, Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Component, Default)]
pub struct AudioSpectrum {
    pub playing: bool,
    pub bins: Vec<f32>,
}

impl AudioSpectrum {
    /// Sum of the magnitudes in `min_band..=max_band`, `None` while nothing is playing.
    pub fn energy(&self, min_band: usize, max_band: usize) -> Option<f32> {
        if !self.playing {
            return None;
        }
        let end = max_band.saturating_add(1).min(self.bins.len());
        let start = min_band.min(end);
        Some(self.bins[start..end].iter().sum())
    }
}

/// Marks the rig of the user. Audio interrupters read [`MicrophoneLoudness`] for it.
#[derive(Component, Reflect, Clone, Copy, Debug, Default)]
#[reflect(Component, Default)]
pub struct UserAnchor;

/// Live loudness of the user's microphone, written once per frame by the capture backend.
#[derive(Resource, Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Resource, Default)]
pub struct MicrophoneLoudness(pub f32);

pub fn sample_velocities(
    time: Res<Time>,
    mut tracked: Query<(Entity, &GlobalTransform, &mut TrackedVelocity)>,
) {
    let delta = time.delta_secs();
    for (entity, transform, mut velocity) in &mut tracked {
        velocity.sample(transform.translation(), delta);
        trace!("{entity} speed {:.3}", velocity.speed());
    }
}

/// [`WorldSignals`] backed by ECS components
#[derive(SystemParam)]
pub struct SceneSignals<'w, 's> {
    pub transform_query: Query<'w, 's, &'static GlobalTransform>,
    pub velocity_query: Query<'w, 's, &'static TrackedVelocity>,
    pub spectrum_query: Query<'w, 's, &'static AudioSpectrum>,
    pub anchor_query: Query<'w, 's, (), With<UserAnchor>>,
    pub microphone: Res<'w, MicrophoneLoudness>,
}

impl WorldSignals for SceneSignals<'_, '_> {
    fn position(&self, entity: Entity) -> Option<Vec3> {
        self.transform_query
            .get(entity)
            .ok()
            .map(GlobalTransform::translation)
    }

    fn forward(&self, entity: Entity) -> Option<Vec3> {
        self.transform_query
            .get(entity)
            .ok()
            .map(|transform| transform.forward().as_vec3())
    }

    fn smoothed_speed(&self, entity: Entity) -> Option<f32> {
        self.velocity_query
            .get(entity)
            .ok()
            .map(TrackedVelocity::speed)
    }

    fn spectral_energy(&self, entity: Entity, min_band: usize, max_band: usize) -> Option<f32> {
        self.spectrum_query
            .get(entity)
            .ok()
            .and_then(|spectrum| spectrum.energy(min_band, max_band))
    }

    fn microphone_loudness(&self) -> f32 {
        self.microphone.0
    }

    fn is_user_anchor(&self, entity: Entity) -> bool {
        self.anchor_query.contains(entity)
    }
}
