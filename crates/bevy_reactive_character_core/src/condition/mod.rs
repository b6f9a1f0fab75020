//! Condition evaluation for the four interrupter variants.

pub mod tracker;

use bevy::{ecs::entity::Entity, math::Vec3};

use crate::interrupter::InterrupterKind;

pub use tracker::{ConditionTracker, TrackerEdge, TrackerPhase};

/// Read-only view of the world signals consumed by the evaluators.
///
/// Every lookup may fail (despawned entity, missing component). Evaluators treat a failed lookup
/// as the condition being false for that tick.
pub trait WorldSignals {
    fn position(&self, entity: Entity) -> Option<Vec3>;
    fn forward(&self, entity: Entity) -> Option<Vec3>;
    /// Smoothed speed in units per second
    fn smoothed_speed(&self, entity: Entity) -> Option<f32>;
    /// Sum of spectral magnitudes in the bands `min_band..=max_band`, `None` when the entity has
    /// no playing audio emitter
    fn spectral_energy(&self, entity: Entity, min_band: usize, max_band: usize) -> Option<f32>;
    /// Live microphone loudness, updated once per tick
    fn microphone_loudness(&self) -> f32;
    fn is_user_anchor(&self, entity: Entity) -> bool;
}

/// World-space pose of the character that owns the evaluators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CharacterPose {
    pub position: Vec3,
    pub forward: Vec3,
    /// Position of the character's head bone, falls back to `position`
    pub head: Vec3,
}

impl CharacterPose {
    pub fn new(position: Vec3, forward: Vec3, head: Vec3) -> Self {
        Self {
            position,
            forward,
            head,
        }
    }
}

/// Outcome of evaluating one interrupter against one entity for a single tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ConditionSample {
    pub holds: bool,
    pub signal: f32,
    pub distance: f32,
    pub target_position: Vec3,
}

impl ConditionSample {
    fn absent() -> Self {
        Self {
            holds: false,
            signal: 0.,
            distance: f32::INFINITY,
            target_position: Vec3::ZERO,
        }
    }
}

impl InterrupterKind {
    pub fn evaluate(
        &self,
        max_distance: f32,
        character: &CharacterPose,
        entity: Entity,
        signals: &impl WorldSignals,
    ) -> ConditionSample {
        let Some(target_position) = signals.position(entity) else {
            return ConditionSample::absent();
        };
        let distance = character.position.distance(target_position);

        let (holds, signal) = match self {
            InterrupterKind::Proximity => (distance < max_distance, distance),
            InterrupterKind::Audio {
                volume_threshold,
                min_band,
                max_band,
            } => {
                let signal = if signals.is_user_anchor(entity) {
                    Some(signals.microphone_loudness())
                } else {
                    signals.spectral_energy(entity, *min_band, *max_band)
                };
                match signal {
                    Some(signal) => (
                        distance <= max_distance && signal >= *volume_threshold,
                        signal,
                    ),
                    None => (false, 0.),
                }
            }
            InterrupterKind::Velocity { velocity_threshold } => {
                match signals.smoothed_speed(entity) {
                    Some(speed) => (
                        distance <= max_distance && speed >= *velocity_threshold,
                        speed,
                    ),
                    None => (false, 0.),
                }
            }
            InterrupterKind::LookAt { max_angle } => {
                match view_angle(signals.forward(entity), target_position, character.head) {
                    Some(angle) => (distance < max_distance && angle < *max_angle, angle),
                    None => (false, 180.),
                }
            }
        };

        ConditionSample {
            holds,
            signal,
            distance,
            target_position,
        }
    }
}

/// Angle in degrees between the entity's forward vector and the direction from the entity to the
/// character's head.
fn view_angle(forward: Option<Vec3>, eye: Vec3, head: Vec3) -> Option<f32> {
    let forward = forward?.try_normalize()?;
    let to_head = (head - eye).try_normalize()?;
    Some(forward.angle_between(to_head).to_degrees())
}

#[cfg(test)]
pub(crate) mod test_signals {
    use bevy::{ecs::entity::Entity, math::Vec3, platform::collections::HashMap};

    use super::WorldSignals;

    #[derive(Default, Clone, Debug)]
    pub struct FakeEntity {
        pub position: Vec3,
        pub forward: Vec3,
        pub speed: Option<f32>,
        pub energy: Option<f32>,
    }

    /// In-memory signal source for tests
    #[derive(Default, Clone, Debug)]
    pub struct FakeSignals {
        pub entities: HashMap<Entity, FakeEntity>,
        pub microphone: f32,
        pub anchor: Option<Entity>,
    }

    impl FakeSignals {
        pub fn entity_mut(&mut self, entity: Entity) -> &mut FakeEntity {
            self.entities.entry(entity).or_default()
        }
    }

    impl WorldSignals for FakeSignals {
        fn position(&self, entity: Entity) -> Option<Vec3> {
            self.entities.get(&entity).map(|e| e.position)
        }

        fn forward(&self, entity: Entity) -> Option<Vec3> {
            self.entities.get(&entity).map(|e| e.forward)
        }

        fn smoothed_speed(&self, entity: Entity) -> Option<f32> {
            self.entities.get(&entity).and_then(|e| e.speed)
        }

        fn spectral_energy(&self, entity: Entity, _min: usize, _max: usize) -> Option<f32> {
            self.entities.get(&entity).and_then(|e| e.energy)
        }

        fn microphone_loudness(&self) -> f32 {
            self.microphone
        }

        fn is_user_anchor(&self, entity: Entity) -> bool {
            self.anchor == Some(entity)
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::{ecs::world::World, math::Vec3};

    use super::{test_signals::FakeSignals, *};

    fn pose() -> CharacterPose {
        CharacterPose::new(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0., 1.6, 0.))
    }

    #[test]
    fn proximity_is_strict() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut signals = FakeSignals::default();
        signals.entity_mut(entity).position = Vec3::new(3., 0., 0.);

        let kind = InterrupterKind::Proximity;
        assert!(!kind.evaluate(3., &pose(), entity, &signals).holds);
        assert!(kind.evaluate(3.5, &pose(), entity, &signals).holds);
    }

    #[test]
    fn audio_uses_microphone_for_anchor() {
        let mut world = World::new();
        let user = world.spawn_empty().id();
        let speaker = world.spawn_empty().id();
        let mut signals = FakeSignals {
            microphone: 0.7,
            anchor: Some(user),
            ..Default::default()
        };
        signals.entity_mut(user).position = Vec3::X;
        signals.entity_mut(speaker).position = Vec3::Z;

        let kind = InterrupterKind::Audio {
            volume_threshold: 0.5,
            min_band: 0,
            max_band: 8,
        };

        let sample = kind.evaluate(5., &pose(), user, &signals);
        assert!(sample.holds);
        assert_eq!(sample.signal, 0.7);

        // No playing emitter on the speaker
        assert!(!kind.evaluate(5., &pose(), speaker, &signals).holds);

        signals.entity_mut(speaker).energy = Some(0.5);
        assert!(kind.evaluate(5., &pose(), speaker, &signals).holds);
    }

    #[test]
    fn velocity_threshold_is_inclusive() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut signals = FakeSignals::default();
        let fake = signals.entity_mut(entity);
        fake.position = Vec3::new(0., 0., 5.);
        fake.speed = Some(2.);

        let kind = InterrupterKind::Velocity {
            velocity_threshold: 2.,
        };
        assert!(kind.evaluate(5., &pose(), entity, &signals).holds);
        assert!(!kind.evaluate(4.9, &pose(), entity, &signals).holds);
    }

    #[test]
    fn look_at_measures_angle_towards_head() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let mut signals = FakeSignals::default();
        let fake = signals.entity_mut(entity);
        fake.position = Vec3::new(0., 1.6, -2.);
        // Looking straight at the head
        fake.forward = Vec3::Z;

        let kind = InterrupterKind::LookAt { max_angle: 30. };
        let sample = kind.evaluate(5., &pose(), entity, &signals);
        assert!(sample.holds);
        assert!(sample.signal < 1e-3);

        // Looking away
        signals.entity_mut(entity).forward = Vec3::NEG_Z;
        assert!(!kind.evaluate(5., &pose(), entity, &signals).holds);
    }

    #[test]
    fn missing_entity_never_holds() {
        let mut world = World::new();
        let entity = world.spawn_empty().id();
        let signals = FakeSignals::default();

        assert!(
            !InterrupterKind::Proximity
                .evaluate(100., &pose(), entity, &signals)
                .holds
        );
    }
}
