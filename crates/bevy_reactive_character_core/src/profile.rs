use bevy::{
    asset::Asset,
    ecs::entity::Entity,
    log::warn,
    reflect::Reflect,
};
use serde::{Deserialize, Serialize};

use crate::{
    arbiter::InterruptionArbiter,
    gaze::GazeSettings,
    interrupter::{BoundInterrupter, ClipRef, Interrupter, InterrupterId},
};

/// Authored configuration of a reactive character, stored in `*.reactive.ron` files.
///
/// ```ron
/// (
///     main_animation: Some((name: "idle", duration: 4.0, path: Some("models/Idle.glb#Animation0"))),
///     interrupters: [
///         (
///             name: "wave at visitors",
///             relevant_entities: ["User"],
///             max_distance: 3.0,
///             min_duration: 1.0,
///             priority: 5,
///             reactive_animations: [(name: "wave", duration: 2.0)],
///             kind: Proximity,
///         ),
///     ],
/// )
/// ```
#[derive(Asset, Reflect, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactiveProfile {
    #[serde(default)]
    pub main_animation: Option<ClipRef>,
    #[serde(default)]
    pub interrupters: Vec<Interrupter>,
    #[serde(default)]
    pub gaze: GazeSettings,
}

impl ReactiveProfile {
    /// Clones every valid interrupter once per relevant entity that `resolve` can find.
    ///
    /// Invalid interrupters and unresolved entity names are logged and skipped.
    pub fn bind(&self, mut resolve: impl FnMut(&str) -> Option<Entity>) -> Vec<BoundInterrupter> {
        let mut bound = Vec::new();

        for interrupter in &self.interrupters {
            if let Err(error) = interrupter.validate() {
                warn!("Skipping interrupter {:?}: {}", interrupter.name, error);
                continue;
            }

            for entity_name in interrupter.resolved_entity_names() {
                let Some(entity) = resolve(entity_name) else {
                    warn!(
                        "Interrupter {:?} could not find an entity named {:?}",
                        interrupter.name, entity_name
                    );
                    continue;
                };

                bound.push(BoundInterrupter {
                    id: InterrupterId(bound.len()),
                    interrupter: interrupter.clone(),
                    entity,
                    entity_name: entity_name.to_string(),
                });
            }
        }

        bound
    }

    pub fn instantiate(&self, resolve: impl FnMut(&str) -> Option<Entity>) -> InterruptionArbiter {
        InterruptionArbiter::new(
            self.bind(resolve),
            self.main_animation.clone(),
            self.gaze.clone(),
        )
    }

    /// Every clip referenced by the profile, main first, without duplicates
    pub fn clips(&self) -> Vec<ClipRef> {
        let mut clips: Vec<ClipRef> = Vec::new();
        let candidates = self.main_animation.iter().chain(
            self.interrupters
                .iter()
                .flat_map(|interrupter| interrupter.reactive_animations.first()),
        );
        for clip in candidates {
            if !clips.iter().any(|known| known.name == clip.name) {
                clips.push(clip.clone());
            }
        }
        clips
    }
}

#[cfg(test)]
mod tests {
    use bevy::{ecs::world::World, platform::collections::HashMap};

    use super::*;
    use crate::interrupter::{InterrupterKind, USER_ANCHOR_NAME};

    const PROFILE: &str = r#"(
        main_animation: Some((name: "idle", duration: 4.0)),
        interrupters: [
            (
                name: "loud",
                relevant_entities: ["Radio", "User"],
                min_duration: 1.0,
                priority: 5,
                reactive_animations: [(name: "cover ears", duration: 2.0)],
                kind: Audio(volume_threshold: 0.5, max_band: 12),
            ),
            (
                name: "stare",
                relevant_entities: ["User", "Ghost"],
                kind: LookAt(max_angle: 30.0),
            ),
            (
                name: "",
                relevant_entities: ["User"],
                kind: Proximity,
            ),
        ],
        gaze: (follow_target_smooth_time: 0.1),
    )"#;

    #[test]
    fn parses_with_defaults() {
        let profile: ReactiveProfile = ron::de::from_str(PROFILE).unwrap();

        assert_eq!(profile.interrupters.len(), 3);
        let loud = &profile.interrupters[0];
        assert_eq!(
            loud.kind,
            InterrupterKind::Audio {
                volume_threshold: 0.5,
                min_band: 0,
                max_band: 12
            }
        );
        let stare = &profile.interrupters[1];
        assert_eq!(stare.max_distance, 5.);
        assert_eq!(stare.min_duration, 0.5);
        assert_eq!(stare.priority, 0);
        assert!(stare.reactive_animation().is_none());

        assert_eq!(profile.gaze.follow_target_smooth_time, 0.1);
        assert_eq!(profile.gaze.first_look_smooth_time, 0.6);
    }

    #[test]
    fn binds_one_clone_per_resolved_entity() {
        let profile: ReactiveProfile = ron::de::from_str(PROFILE).unwrap();
        let mut world = World::new();
        let names: HashMap<String, Entity> = ["Radio", USER_ANCHOR_NAME]
            .into_iter()
            .map(|name| (name.to_string(), world.spawn_empty().id()))
            .collect();

        let bound = profile.bind(|name| names.get(name).copied());

        let summary: Vec<(usize, &str, &str)> = bound
            .iter()
            .map(|b| (b.id.0, b.interrupter.name.as_str(), b.entity_name.as_str()))
            .collect();
        // "Ghost" is missing and the unnamed interrupter is invalid
        assert_eq!(
            summary,
            vec![
                (0, "loud", "Radio"),
                (1, "loud", USER_ANCHOR_NAME),
                (2, "stare", USER_ANCHOR_NAME),
            ]
        );
        assert_eq!(bound[1].entity, names[USER_ANCHOR_NAME]);
    }

    #[test]
    fn collects_unique_clips() {
        let profile: ReactiveProfile = ron::de::from_str(PROFILE).unwrap();
        let names: Vec<String> = profile.clips().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["idle".to_string(), "cover ears".to_string()]);
    }
}
