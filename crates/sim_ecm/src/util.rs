//! Entity-tree helpers built on the [`EntityComponentManager`] queries.

use std::collections::HashSet;

use sim_component::Entity;

use crate::components::{Model, Name, World};
use crate::manager::EntityComponentManager;

/// The model directly below the world that contains `entity`.
///
/// Returns `entity` itself if it is such a model, and `None` if the entity is
/// not inside any model.
#[must_use]
pub fn top_level_model(ecm: &EntityComponentManager, entity: Entity) -> Option<Entity> {
    let mut top = None;
    let mut visited = HashSet::new();
    let mut current = entity;
    while visited.insert(current) {
        if ecm.has_component::<World>(current) {
            break;
        }
        if ecm.has_component::<Model>(current) {
            top = Some(current);
        }
        match ecm.parent_entity(current) {
            Some(parent) => current = parent,
            None => break,
        }
    }
    top
}

/// The names of `entity` and its ancestors joined by `delimiter`, outermost
/// first. The world and unnamed entities are skipped.
///
/// ```rust
/// use sim_ecm::{EntityComponentManager, components::Name, util::scoped_name};
///
/// let mut ecm = EntityComponentManager::new();
/// let model = ecm.create_entity();
/// let link = ecm.create_entity();
/// ecm.create_component(model, Name::new("robot".into())).unwrap();
/// ecm.create_component(link, Name::new("base".into())).unwrap();
/// ecm.set_parent_entity(link, model).unwrap();
///
/// assert_eq!(scoped_name(&ecm, link, "::"), "robot::base");
/// ```
#[must_use]
pub fn scoped_name(ecm: &EntityComponentManager, entity: Entity, delimiter: &str) -> String {
    let mut names = Vec::new();
    let mut visited = HashSet::new();
    let mut current = Some(entity);
    while let Some(e) = current {
        if !visited.insert(e) || ecm.has_component::<World>(e) {
            break;
        }
        if let Some(name) = ecm.component::<Name>(e) {
            names.push(name.data().as_str());
        }
        current = ecm.parent_entity(e);
    }
    names.reverse();
    names.join(delimiter)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scene {
        ecm: EntityComponentManager,
        world: Entity,
        outer: Entity,
        inner: Entity,
        link: Entity,
    }

    fn scene() -> Scene {
        let mut ecm = EntityComponentManager::new();
        let world = ecm.create_entity();
        ecm.create_component(world, World::default()).unwrap();
        ecm.create_component(world, Name::new("default".into())).unwrap();

        let outer = ecm.create_entity();
        ecm.create_component(outer, Model::default()).unwrap();
        ecm.create_component(outer, Name::new("outer".into())).unwrap();
        ecm.set_parent_entity(outer, world).unwrap();

        let inner = ecm.create_entity();
        ecm.create_component(inner, Model::default()).unwrap();
        ecm.create_component(inner, Name::new("inner".into())).unwrap();
        ecm.set_parent_entity(inner, outer).unwrap();

        let link = ecm.create_entity();
        ecm.create_component(link, Name::new("link".into())).unwrap();
        ecm.set_parent_entity(link, inner).unwrap();

        Scene {
            ecm,
            world,
            outer,
            inner,
            link,
        }
    }

    #[test]
    fn test_top_level_model_walks_past_nested_models() {
        let s = scene();
        assert_eq!(top_level_model(&s.ecm, s.link), Some(s.outer));
        assert_eq!(top_level_model(&s.ecm, s.inner), Some(s.outer));
        assert_eq!(top_level_model(&s.ecm, s.outer), Some(s.outer));
        assert_eq!(top_level_model(&s.ecm, s.world), None);
    }

    #[test]
    fn test_scoped_name_skips_world() {
        let s = scene();
        assert_eq!(scoped_name(&s.ecm, s.link, "::"), "outer::inner::link");
        assert_eq!(scoped_name(&s.ecm, s.outer, "/"), "outer");
        assert_eq!(scoped_name(&s.ecm, s.world, "::"), "");
    }

    #[test]
    fn test_helpers_stop_on_cycles() {
        let mut ecm = EntityComponentManager::new();
        let a = ecm.create_entity();
        let b = ecm.create_entity();
        ecm.create_component(a, Name::new("a".into())).unwrap();
        ecm.create_component(b, Name::new("b".into())).unwrap();
        ecm.set_parent_entity(a, b).unwrap();
        ecm.set_parent_entity(b, a).unwrap();
        assert_eq!(scoped_name(&ecm, a, "::"), "b::a");
        assert_eq!(top_level_model(&ecm, a), None);
    }
}
