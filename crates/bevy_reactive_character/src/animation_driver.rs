//! Plays the blend of a reactive character on a Bevy [`AnimationPlayer`].
//!
//! Every clip with an asset path becomes one node of an [`AnimationGraph`]. The blend controller
//! stays the source of truth: each frame the nodes get the weight and playback time of the slots
//! holding their clip and are kept paused, so the player never advances them on its own.

use bevy::{
    animation::{
        AnimationClip, AnimationPlayer,
        graph::{AnimationGraph, AnimationGraphHandle, AnimationNodeIndex},
    },
    asset::{AssetServer, Assets, Handle},
    ecs::{
        component::Component,
        entity::Entity,
        hierarchy::Children,
        query::{With, Without},
        system::{Commands, Query, Res, ResMut},
    },
    log::{debug, warn},
    platform::collections::HashMap,
};
use bevy_reactive_character_core::blend::{AnimationBlendController, BlendSlot};

use crate::character::ReactiveCharacter;

/// Links a character to the animation player playing its clips
#[derive(Component, Clone, Debug)]
pub struct ReactiveAnimationBinding {
    pub player: Entity,
    nodes: HashMap<String, AnimationNodeIndex>,
}

impl ReactiveAnimationBinding {
    pub fn node(&self, clip_name: &str) -> Option<AnimationNodeIndex> {
        self.nodes.get(clip_name).copied()
    }
}

pub fn bind_animation_players(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut graphs: ResMut<Assets<AnimationGraph>>,
    characters: Query<(Entity, &ReactiveCharacter), Without<ReactiveAnimationBinding>>,
    children_query: Query<&Children>,
    players: Query<(), With<AnimationPlayer>>,
) {
    for (entity, character) in &characters {
        // Scenes spawn asynchronously, try again next frame
        let Some(player) = find_player(entity, &children_query, &players) else {
            continue;
        };

        let mut names = Vec::new();
        let mut handles: Vec<Handle<AnimationClip>> = Vec::new();
        for clip in character.clips() {
            let Some(path) = &clip.path else {
                warn!(
                    "Clip {:?} of {entity} has no asset path, it will not be played",
                    clip.name
                );
                continue;
            };
            names.push(clip.name.clone());
            handles.push(asset_server.load(path.clone()));
        }

        let (graph, indices) = AnimationGraph::from_clips(handles);
        let nodes: HashMap<String, AnimationNodeIndex> = names.into_iter().zip(indices).collect();
        debug!(
            "Bound {} clips of {entity} to the animation player {player}",
            nodes.len()
        );

        commands
            .entity(player)
            .insert(AnimationGraphHandle(graphs.add(graph)));
        commands
            .entity(entity)
            .insert(ReactiveAnimationBinding { player, nodes });
    }
}

pub fn drive_animation_players(
    characters: Query<(&ReactiveCharacter, &ReactiveAnimationBinding)>,
    mut players: Query<&mut AnimationPlayer>,
) {
    for (character, binding) in &characters {
        let Ok(mut player) = players.get_mut(binding.player) else {
            continue;
        };
        let targets = node_targets(character.arbiter().blend(), binding);

        for node in binding.nodes.values() {
            match targets.get(node) {
                Some(target) => {
                    player
                        .play(*node)
                        .set_weight(target.weight)
                        .seek_to(target.time)
                        .pause();
                }
                None => {
                    if player.is_playing_animation(*node) {
                        player.stop(*node);
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct NodeTarget {
    weight: f32,
    time: f32,
    /// Weight of the slot `time` was taken from
    leading_weight: f32,
}

/// Weight and time per graph node. A clip held by both reactive slots sums their weights and
/// follows the heavier one.
fn node_targets(
    blend: &AnimationBlendController,
    binding: &ReactiveAnimationBinding,
) -> HashMap<AnimationNodeIndex, NodeTarget> {
    let mut targets: HashMap<AnimationNodeIndex, NodeTarget> = HashMap::default();

    for slot in BlendSlot::ALL {
        let playback = blend.slot(slot);
        let Some(node) = playback
            .clip
            .as_ref()
            .and_then(|clip| binding.node(&clip.name))
        else {
            continue;
        };

        let target = targets.entry(node).or_insert(NodeTarget {
            weight: 0.,
            time: playback.time,
            leading_weight: playback.weight,
        });
        target.weight += playback.weight;
        if playback.weight > target.leading_weight {
            target.time = playback.time;
            target.leading_weight = playback.weight;
        }
    }

    targets
}

fn find_player(
    root: Entity,
    children_query: &Query<&Children>,
    players: &Query<(), With<AnimationPlayer>>,
) -> Option<Entity> {
    let mut pending = vec![root];
    while let Some(entity) = pending.pop() {
        if players.contains(entity) {
            return Some(entity);
        }
        if let Ok(children) = children_query.get(entity) {
            pending.extend(children.iter().rev());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use bevy_reactive_character_core::interrupter::ClipRef;

    use super::*;

    fn binding() -> ReactiveAnimationBinding {
        ReactiveAnimationBinding {
            player: Entity::PLACEHOLDER,
            nodes: HashMap::from_iter([
                ("idle".to_string(), AnimationNodeIndex::new(1)),
                ("wave".to_string(), AnimationNodeIndex::new(2)),
            ]),
        }
    }

    #[test]
    fn crossfade_maps_to_two_nodes() {
        let mut blend = AnimationBlendController::new();
        blend.play_main(ClipRef::new("idle", 4.));
        blend.tick(1.);
        blend.play_reactive(ClipRef::new("wave", 2.), 0.5).unwrap();
        blend.tick(0.25);

        let targets = node_targets(&blend, &binding());
        let idle = targets[&AnimationNodeIndex::new(1)];
        let wave = targets[&AnimationNodeIndex::new(2)];
        assert_eq!(idle.time, 1.25);
        assert_eq!(wave.time, 0.25);
        assert!((idle.weight + wave.weight - 1.).abs() < 1e-5);
    }

    #[test]
    fn shared_clip_sums_slot_weights() {
        let mut blend = AnimationBlendController::new();
        blend.play_main(ClipRef::new("idle", 4.));
        blend.play_reactive(ClipRef::new("wave", 2.), 0.5).unwrap();
        blend.tick(0.5);
        blend.tick(0.25);
        blend.play_reactive(ClipRef::new("wave", 2.), 0.5).unwrap();
        blend.tick(0.125);

        let targets = node_targets(&blend, &binding());
        let wave = targets[&AnimationNodeIndex::new(2)];
        assert!((wave.weight - 1.).abs() < 1e-5);
        // The fading slot is still the heavier one
        assert_eq!(wave.time, 0.875);
        assert_eq!(targets[&AnimationNodeIndex::new(1)].weight, 0.);
    }

    #[test]
    fn unknown_clips_are_skipped() {
        let mut blend = AnimationBlendController::new();
        blend.play_main(ClipRef::new("dance", 4.));

        assert!(node_targets(&blend, &binding()).is_empty());
    }
}
