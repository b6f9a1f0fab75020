use bevy::ecs::{
    entity::Entity,
    hierarchy::Children,
    name::Name,
    system::{Query, SystemParam},
};
use bevy_reactive_character_core::gaze::EntityHierarchy;

/// [`EntityHierarchy`] over the `Children` and `Name` components of the world
#[derive(SystemParam)]
pub struct SceneHierarchy<'w, 's> {
    pub children_query: Query<'w, 's, &'static Children>,
    pub names_query: Query<'w, 's, &'static Name>,
}

impl EntityHierarchy for SceneHierarchy<'_, '_> {
    fn children(&self, entity: Entity) -> &[Entity] {
        self.children_query
            .get(entity)
            .map(|children| &**children)
            .unwrap_or(&[])
    }

    fn name(&self, entity: Entity) -> Option<&str> {
        self.names_query.get(entity).ok().map(Name::as_str)
    }
}
