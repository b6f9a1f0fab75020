use bevy::ecs::entity::Entity;

/// Read-only access to a transform hierarchy.
pub trait EntityHierarchy {
    fn children(&self, entity: Entity) -> &[Entity];
    fn name(&self, entity: Entity) -> Option<&str>;
}

pub fn is_head_name(name: &str) -> bool {
    name.to_lowercase().contains("head")
}

/// Depth-first search below `root` for the first node whose name contains `"head"`, ignoring
/// case. The root itself is not considered.
pub fn find_head(root: Entity, hierarchy: &impl EntityHierarchy) -> Option<Entity> {
    let mut pending: Vec<Entity> = hierarchy.children(root).iter().rev().copied().collect();

    while let Some(entity) = pending.pop() {
        if hierarchy.name(entity).is_some_and(is_head_name) {
            return Some(entity);
        }
        pending.extend(hierarchy.children(entity).iter().rev().copied());
    }

    None
}

#[cfg(test)]
mod tests {
    use bevy::{ecs::world::World, platform::collections::HashMap};

    use super::*;

    #[derive(Default)]
    struct FakeHierarchy {
        children: HashMap<Entity, Vec<Entity>>,
        names: HashMap<Entity, String>,
    }

    impl EntityHierarchy for FakeHierarchy {
        fn children(&self, entity: Entity) -> &[Entity] {
            self.children.get(&entity).map(Vec::as_slice).unwrap_or(&[])
        }

        fn name(&self, entity: Entity) -> Option<&str> {
            self.names.get(&entity).map(String::as_str)
        }
    }

    #[test]
    fn matches_case_insensitively() {
        assert!(is_head_name("mixamorig:Head"));
        assert!(is_head_name("HEAD_end"));
        assert!(is_head_name("forehead"));
        assert!(!is_head_name("Neck"));
    }

    #[test]
    fn depth_first_first_match_wins() {
        let mut world = World::new();
        let [root, hips, spine, deep_head, shoulder_head] =
            std::array::from_fn(|_| world.spawn_empty().id());

        let mut hierarchy = FakeHierarchy::default();
        hierarchy.children.insert(root, vec![hips, shoulder_head]);
        hierarchy.children.insert(hips, vec![spine]);
        hierarchy.children.insert(spine, vec![deep_head]);
        hierarchy.names.insert(root, "Head root".into());
        hierarchy.names.insert(hips, "Hips".into());
        hierarchy.names.insert(spine, "Spine".into());
        hierarchy.names.insert(deep_head, "Head".into());
        hierarchy.names.insert(shoulder_head, "ShoulderHead".into());

        assert_eq!(find_head(root, &hierarchy), Some(deep_head));
        assert_eq!(find_head(spine, &hierarchy), Some(deep_head));
        assert_eq!(find_head(deep_head, &hierarchy), None);
    }
}
