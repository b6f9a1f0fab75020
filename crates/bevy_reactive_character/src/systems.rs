use bevy::{
    ecs::{
        entity::Entity,
        message::{Message, MessageWriter},
        system::{Query, Res},
    },
    log::trace,
    time::Time,
    transform::components::GlobalTransform,
};
use bevy_reactive_character_core::{
    arbiter::ArbiterEvent,
    blend::BlendSlot,
    condition::{CharacterPose, WorldSignals},
};

use crate::{
    character::{LookAtIk, ReactiveBlendOutput, ReactiveCharacter},
    hierarchy::SceneHierarchy,
    signals::SceneSignals,
};

/// An arbitration decision taken for `character` this frame
#[derive(Message, Clone, Debug, PartialEq)]
pub struct ReactionMessage {
    pub character: Entity,
    pub event: ArbiterEvent,
}

/// Evaluates the interrupters of every character, arbitrates, and advances timers, blends and
/// gaze. Publishes the results to [`LookAtIk`] and [`ReactiveBlendOutput`].
pub fn update_reactive_characters(
    time: Res<Time>,
    signals: SceneSignals,
    hierarchy: SceneHierarchy,
    mut characters: Query<(
        Entity,
        &GlobalTransform,
        &mut ReactiveCharacter,
        &mut LookAtIk,
        &mut ReactiveBlendOutput,
    )>,
    mut reactions: MessageWriter<ReactionMessage>,
) {
    let delta = time.delta_secs();

    for (entity, transform, mut character, mut look_at, mut blend_output) in &mut characters {
        let position = transform.translation();
        let head = character.own_head(entity, &hierarchy);
        let pose = CharacterPose::new(
            position,
            transform.forward().as_vec3(),
            signals.position(head).unwrap_or(position),
        );

        character
            .arbiter_mut()
            .evaluate_conditions(delta, &pose, &signals);
        character.arbiter_mut().advance(delta);

        let target = character.arbiter().gaze().target();
        let target_position = target
            .map(|target| character.target_head(target, &hierarchy))
            .and_then(|head| signals.position(head));
        look_at.0 = character
            .arbiter_mut()
            .update_gaze(delta, target_position, &pose);

        let arbiter = character.arbiter();
        let blend = arbiter.blend();
        blend_output.slots = BlendSlot::ALL.map(|slot| blend.slot(slot).clone());
        blend_output.active = arbiter.active().map(|active| active.id);
        trace!(
            "{entity} weights {:?}, gaze weight {:.2}",
            blend.weights(),
            look_at.0.weight
        );

        reactions.write_batch(
            character
                .arbiter_mut()
                .drain_events()
                .into_iter()
                .map(|event| ReactionMessage {
                    character: entity,
                    event,
                }),
        );
    }
}
