use bevy::{
    asset::{Assets, Handle},
    ecs::{
        component::Component,
        entity::Entity,
        name::Name,
        query::Without,
        reflect::ReflectComponent,
        system::{Commands, Query, Res},
    },
    log::{info, warn},
    platform::collections::{HashMap, HashSet},
    reflect::{Reflect, std_traits::ReflectDefault},
    transform::components::Transform,
};
use bevy_reactive_character_core::{
    arbiter::InterruptionArbiter,
    blend::SlotPlayback,
    gaze::{EntityHierarchy, LookAtOutput, find_head},
    interrupter::{ClipRef, InterrupterId},
    profile::ReactiveProfile,
};

/// Profile to instantiate on this entity once the asset is loaded
#[derive(Component, Reflect, Clone, Debug, Default)]
#[reflect(Component, Default)]
pub struct ReactiveCharacterHandle(pub Handle<ReactiveProfile>);

/// Runtime state of a reactive character.
///
/// Added by [`instantiate_reactive_characters`] for entities with a [`ReactiveCharacterHandle`],
/// or inserted directly with [`ReactiveCharacter::from_profile`].
#[derive(Component, Clone, Debug)]
#[require(Transform, LookAtIk, ReactiveBlendOutput)]
pub struct ReactiveCharacter {
    arbiter: InterruptionArbiter,
    clips: Vec<ClipRef>,
    head: Option<Entity>,
    target_heads: HashMap<Entity, Entity>,
    reported_missing_heads: HashSet<Entity>,
}

impl ReactiveCharacter {
    pub fn from_profile(
        profile: &ReactiveProfile,
        resolve: impl FnMut(&str) -> Option<Entity>,
    ) -> Self {
        Self {
            arbiter: profile.instantiate(resolve),
            clips: profile.clips(),
            head: None,
            target_heads: HashMap::default(),
            reported_missing_heads: HashSet::default(),
        }
    }

    pub fn arbiter(&self) -> &InterruptionArbiter {
        &self.arbiter
    }

    pub fn arbiter_mut(&mut self) -> &mut InterruptionArbiter {
        &mut self.arbiter
    }

    /// Every clip the character can play, main first
    pub fn clips(&self) -> &[ClipRef] {
        &self.clips
    }

    /// Head bone of the character itself, once found
    pub fn head(&self) -> Option<Entity> {
        self.head
    }

    /// Head bone of `root`, searched again every call until found. Falls back to `root`.
    pub fn own_head(&mut self, root: Entity, hierarchy: &impl EntityHierarchy) -> Entity {
        if let Some(head) = self.head {
            return head;
        }
        match find_head(root, hierarchy) {
            Some(head) => {
                self.head = Some(head);
                head
            }
            None => {
                self.report_missing_head(root);
                root
            }
        }
    }

    /// Head bone of a gaze target, with the same fallback as [`Self::own_head`]
    pub fn target_head(&mut self, target: Entity, hierarchy: &impl EntityHierarchy) -> Entity {
        if let Some(head) = self.target_heads.get(&target) {
            return *head;
        }
        match find_head(target, hierarchy) {
            Some(head) => {
                self.target_heads.insert(target, head);
                head
            }
            None => {
                self.report_missing_head(target);
                target
            }
        }
    }

    fn report_missing_head(&mut self, entity: Entity) {
        if self.reported_missing_heads.insert(entity) {
            warn!("No head bone found below {entity}, using the entity itself");
        }
    }
}

/// Look-at target for the IK solver of the character, refreshed every frame
#[derive(Component, Reflect, Clone, Copy, Debug, Default, PartialEq)]
#[reflect(Component, Default)]
pub struct LookAtIk(pub LookAtOutput);

/// Snapshot of the three blend slots, refreshed every frame
#[derive(Component, Reflect, Clone, Debug, Default, PartialEq)]
#[reflect(Component, Default)]
pub struct ReactiveBlendOutput {
    /// Main, reactive A and reactive B, in that order
    pub slots: [SlotPlayback; 3],
    pub active: Option<InterrupterId>,
}

impl ReactiveBlendOutput {
    pub fn weights(&self) -> [f32; 3] {
        self.slots.each_ref().map(|slot| slot.weight)
    }
}

pub fn instantiate_reactive_characters(
    mut commands: Commands,
    profiles: Res<Assets<ReactiveProfile>>,
    pending: Query<(Entity, &ReactiveCharacterHandle), Without<ReactiveCharacter>>,
    names: Query<(Entity, &Name)>,
) {
    for (entity, handle) in &pending {
        let Some(profile) = profiles.get(&handle.0) else {
            continue;
        };

        let character = ReactiveCharacter::from_profile(profile, |wanted| {
            names
                .iter()
                .find(|(_, name)| name.as_str() == wanted)
                .map(|(entity, _)| entity)
        });
        info!(
            "Reactive character {entity} ready with {} interrupters",
            character.arbiter().interrupters().len()
        );

        commands.entity(entity).insert(character);
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::world::World;

    use super::*;

    struct Rig {
        children: HashMap<Entity, Vec<Entity>>,
        names: HashMap<Entity, String>,
    }

    impl EntityHierarchy for Rig {
        fn children(&self, entity: Entity) -> &[Entity] {
            self.children.get(&entity).map(Vec::as_slice).unwrap_or(&[])
        }

        fn name(&self, entity: Entity) -> Option<&str> {
            self.names.get(&entity).map(String::as_str)
        }
    }

    #[test]
    fn heads_fall_back_to_the_entity_and_are_cached() {
        let mut world = World::new();
        let root = world.spawn_empty().id();
        let bone = world.spawn_empty().id();
        let bare = world.spawn_empty().id();
        let mut rig = Rig {
            children: HashMap::from_iter([(root, vec![bone])]),
            names: HashMap::from_iter([(bone, "mixamorig:Head".to_string())]),
        };

        let mut character = ReactiveCharacter::from_profile(&ReactiveProfile::default(), |_| None);
        assert_eq!(character.own_head(root, &rig), bone);
        assert_eq!(character.target_head(bare, &rig), bare);
        assert!(character.reported_missing_heads.contains(&bare));

        rig.names.clear();
        assert_eq!(character.head(), Some(bone));
        assert_eq!(character.own_head(root, &rig), bone);
    }
}
