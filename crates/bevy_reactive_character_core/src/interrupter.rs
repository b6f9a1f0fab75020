use bevy::{ecs::entity::Entity, math::Vec3, reflect::Reflect};
use serde::{Deserialize, Serialize};

use crate::errors::ProfileValidationError;

/// Name shown to authors for the user's own rig.
pub const USER_ALIAS: &str = "User";
/// Reserved scene name of the user's rig. [`USER_ALIAS`] is substituted by this when a profile is
/// applied.
pub const USER_ANCHOR_NAME: &str = "UserAnchor";

pub(crate) fn default_max_distance() -> f32 {
    5.
}

pub(crate) fn default_min_duration() -> f32 {
    0.5
}

fn default_max_band() -> usize {
    32
}

/// Opaque reference to an animation clip.
///
/// The core never inspects clip data, it only needs a stable identity and the clip length.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipRef {
    pub name: String,
    /// Length of the clip in seconds
    pub duration: f32,
    /// Asset path used by the animation player driver, e.g. `"models/Idle.glb#Animation0"`
    #[serde(default)]
    pub path: Option<String>,
}

impl ClipRef {
    pub fn new(name: impl Into<String>, duration: f32) -> Self {
        Self {
            name: name.into(),
            duration,
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterruptionType {
    Proximity,
    Audio,
    Velocity,
    LookAt,
}

/// Variant-specific part of an interrupter.
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum InterrupterKind {
    /// Fires while the entity is closer than `max_distance`.
    Proximity,
    /// Fires while the entity is loud enough within `max_distance`.
    ///
    /// Loudness is the sum of spectral magnitudes in the bins `min_band..=max_band`, or the live
    /// microphone loudness for the user anchor.
    Audio {
        volume_threshold: f32,
        #[serde(default)]
        min_band: usize,
        #[serde(default = "default_max_band")]
        max_band: usize,
    },
    /// Fires while the entity moves fast enough within `max_distance`.
    Velocity { velocity_threshold: f32 },
    /// Fires while the entity looks at the character's head, `max_angle` is in degrees.
    LookAt { max_angle: f32 },
}

impl InterrupterKind {
    pub fn interruption_type(&self) -> InterruptionType {
        match self {
            InterrupterKind::Proximity => InterruptionType::Proximity,
            InterrupterKind::Audio { .. } => InterruptionType::Audio,
            InterrupterKind::Velocity { .. } => InterruptionType::Velocity,
            InterrupterKind::LookAt { .. } => InterruptionType::LookAt,
        }
    }
}

/// Configured rule that can request a reactive animation
#[derive(Reflect, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Interrupter {
    pub name: String,
    /// Names of the world entities this interrupter watches, resolved when the character is
    /// instantiated
    #[serde(default)]
    pub relevant_entities: Vec<String>,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Seconds the condition must hold before firing
    #[serde(default = "default_min_duration")]
    pub min_duration: f32,
    /// Higher wins
    #[serde(default)]
    pub priority: i32,
    /// Only the first clip is played. An empty list makes this a look-only interrupter.
    #[serde(default)]
    pub reactive_animations: Vec<ClipRef>,
    pub kind: InterrupterKind,
}

impl Interrupter {
    pub fn new(name: impl Into<String>, kind: InterrupterKind) -> Self {
        Self {
            name: name.into(),
            relevant_entities: Vec::new(),
            max_distance: default_max_distance(),
            min_duration: default_min_duration(),
            priority: 0,
            reactive_animations: Vec::new(),
            kind,
        }
    }

    pub fn with_entity(mut self, name: impl Into<String>) -> Self {
        self.relevant_entities.push(name.into());
        self
    }

    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_min_duration(mut self, min_duration: f32) -> Self {
        self.min_duration = min_duration;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_reactive_animation(mut self, clip: ClipRef) -> Self {
        self.reactive_animations.push(clip);
        self
    }

    pub fn reactive_animation(&self) -> Option<&ClipRef> {
        self.reactive_animations.first()
    }

    pub fn interruption_type(&self) -> InterruptionType {
        self.kind.interruption_type()
    }

    /// Entity names with the user alias replaced by the reserved anchor name.
    pub fn resolved_entity_names(&self) -> impl Iterator<Item = &str> {
        self.relevant_entities.iter().map(|name| {
            if name == USER_ALIAS {
                USER_ANCHOR_NAME
            } else {
                name.as_str()
            }
        })
    }

    pub fn validate(&self) -> Result<(), ProfileValidationError> {
        if self.name.trim().is_empty() {
            return Err(ProfileValidationError::EmptyName);
        }
        if !(self.min_duration >= 0.) {
            return Err(ProfileValidationError::NegativeMinDuration {
                name: self.name.clone(),
                value: self.min_duration,
            });
        }
        if !(self.max_distance > 0.) {
            return Err(ProfileValidationError::NonPositiveMaxDistance {
                name: self.name.clone(),
                value: self.max_distance,
            });
        }
        if let InterrupterKind::Audio {
            min_band, max_band, ..
        } = self.kind
            && min_band > max_band
        {
            return Err(ProfileValidationError::InvertedBandRange {
                name: self.name.clone(),
                min: min_band,
                max: max_band,
            });
        }
        if let Some(clip) = self.reactive_animation()
            && !(clip.duration > 0.)
        {
            return Err(ProfileValidationError::NonPositiveClipDuration {
                name: self.name.clone(),
                clip: clip.name.clone(),
                value: clip.duration,
            });
        }
        Ok(())
    }
}

/// Identifies one bound interrupter clone within a character.
#[derive(Reflect, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InterrupterId(pub usize);

/// An interrupter cloned for exactly one world entity, so that timers of different entities do
/// not mix.
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct BoundInterrupter {
    pub id: InterrupterId,
    pub interrupter: Interrupter,
    pub entity: Entity,
    pub entity_name: String,
}

impl BoundInterrupter {
    pub fn priority(&self) -> i32 {
        self.interrupter.priority
    }
}

/// Request sent to the arbiter when an interrupter fires
#[derive(Reflect, Clone, Debug, PartialEq)]
pub struct InterruptionConfig {
    pub interruption_type: InterruptionType,
    pub target_position: Vec3,
    pub min_duration: f32,
    pub priority: i32,
    pub signal_value: f32,
    pub source_entity: Entity,
    pub active_distance: f32,
    pub reactive_animation: Option<ClipRef>,
}

impl InterruptionConfig {
    pub fn is_look_only(&self) -> bool {
        self.reactive_animation.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_alias_is_substituted() {
        let interrupter = Interrupter::new("near", InterrupterKind::Proximity)
            .with_entity("User")
            .with_entity("Dog");

        let names: Vec<&str> = interrupter.resolved_entity_names().collect();
        assert_eq!(names, vec![USER_ANCHOR_NAME, "Dog"]);
    }

    #[test]
    fn validation_rejects_inverted_bands() {
        let interrupter = Interrupter::new(
            "loud",
            InterrupterKind::Audio {
                volume_threshold: 0.5,
                min_band: 10,
                max_band: 2,
            },
        );

        assert_eq!(
            interrupter.validate(),
            Err(ProfileValidationError::InvertedBandRange {
                name: "loud".into(),
                min: 10,
                max: 2
            })
        );
    }

    #[test]
    fn validation_rejects_empty_clip() {
        let interrupter = Interrupter::new("wave", InterrupterKind::Proximity)
            .with_reactive_animation(ClipRef::new("wave", 0.));

        assert!(matches!(
            interrupter.validate(),
            Err(ProfileValidationError::NonPositiveClipDuration { .. })
        ));
    }

    #[test]
    fn first_clip_is_the_reaction() {
        let interrupter = Interrupter::new("wave", InterrupterKind::Proximity)
            .with_reactive_animation(ClipRef::new("wave", 1.))
            .with_reactive_animation(ClipRef::new("nod", 2.));

        assert_eq!(interrupter.reactive_animation().map(|c| c.name.as_str()), Some("wave"));
        assert!(interrupter.validate().is_ok());
    }
}
