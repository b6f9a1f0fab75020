use bevy::{
    color::palettes::css::{GOLD, ORANGE_RED, SKY_BLUE},
    ecs::{
        reflect::ReflectResource,
        resource::Resource,
        system::{Query, Res},
    },
    gizmos::gizmos::Gizmos,
    math::Isometry3d,
    reflect::{Reflect, std_traits::ReflectDefault},
    transform::components::GlobalTransform,
};

use crate::character::{LookAtIk, ReactiveCharacter};

/// Toggles the debug drawing added by `ReactiveCharacterPlugin::debug_gizmos`
#[derive(Resource, Reflect, Clone, Debug, PartialEq)]
#[reflect(Resource, Default)]
pub struct ReactiveDebugSettings {
    pub enabled: bool,
    /// Radius of the sphere drawn at the virtual look-at point
    pub point_radius: f32,
}

impl Default for ReactiveDebugSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            point_radius: 0.05,
        }
    }
}

pub fn debug_gizmos_enabled(settings: Res<ReactiveDebugSettings>) -> bool {
    settings.enabled
}

/// Draws the look-at point of every character and a line to the source of its active reaction.
pub fn draw_reactive_gizmos(
    settings: Res<ReactiveDebugSettings>,
    characters: Query<(&GlobalTransform, &ReactiveCharacter, &LookAtIk)>,
    transforms: Query<&GlobalTransform>,
    mut gizmos: Gizmos,
) {
    for (transform, character, look_at) in &characters {
        let head = character
            .head()
            .and_then(|head| transforms.get(head).ok())
            .map_or(transform.translation(), GlobalTransform::translation);

        let color = if look_at.0.weight > 0. { GOLD } else { SKY_BLUE };
        gizmos.line(head, look_at.0.position, color);
        gizmos.sphere(
            Isometry3d::from_translation(look_at.0.position),
            settings.point_radius,
            color,
        );

        if let Some(active) = character.arbiter().active()
            && let Ok(source) = transforms.get(active.config.source_entity)
        {
            gizmos.line(transform.translation(), source.translation(), ORANGE_RED);
        }
    }
}
