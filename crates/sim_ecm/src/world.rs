//! Read-only view over the root entity of a simulated world.

use sim_component::Entity;
use sim_math::DVec3;

use crate::components::{self, Gravity, MagneticField, Model, Name, ParentEntity};
use crate::manager::EntityComponentManager;

/// A world entity together with the manager that holds its components.
///
/// Owns no state; every accessor delegates to the manager and reports missing
/// data as `None`.
#[derive(Debug, Clone, Copy)]
pub struct World<'a> {
    entity: Entity,
    ecm: &'a EntityComponentManager,
}

impl<'a> World<'a> {
    /// Wrap `entity` as a world view. Use [`valid`](Self::valid) to check it.
    #[must_use]
    pub fn new(entity: Entity, ecm: &'a EntityComponentManager) -> Self {
        Self { entity, ecm }
    }

    /// The first entity carrying the world marker, if any.
    #[must_use]
    pub fn find(ecm: &'a EntityComponentManager) -> Option<Self> {
        ecm.each::<components::World>()
            .next()
            .map(|(entity, _)| Self::new(entity, ecm))
    }

    /// Returns the world's root entity.
    #[must_use]
    pub fn entity(&self) -> Entity {
        self.entity
    }

    /// Returns `true` if the entity exists and carries the world marker.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.ecm.has_component::<components::World>(self.entity)
    }

    /// Returns the world's name.
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.ecm
            .component::<Name>(self.entity)
            .map(|name| name.data().as_str())
    }

    /// Returns the world's gravity, in m/s².
    #[must_use]
    pub fn gravity(&self) -> Option<DVec3> {
        self.ecm.component_data::<Gravity>(self.entity)
    }

    /// Returns the world's magnetic field, in tesla.
    #[must_use]
    pub fn magnetic_field(&self) -> Option<DVec3> {
        self.ecm.component_data::<MagneticField>(self.entity)
    }

    /// The model directly below the world whose name is `name`.
    #[must_use]
    pub fn model_by_name(&self, name: &str) -> Option<Entity> {
        self.model_entities()
            .find(|model| {
                self.ecm
                    .component::<Name>(*model)
                    .is_some_and(|n| n.data() == name)
            })
    }

    /// Models directly below the world, ascending.
    #[must_use]
    pub fn models(&self) -> Vec<Entity> {
        self.model_entities().collect()
    }

    /// Returns the number of models directly below the world.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.model_entities().count()
    }

    fn model_entities(&self) -> impl Iterator<Item = Entity> + 'a {
        let ecm = self.ecm;
        let world = self.entity;
        ecm.each::<ParentEntity>()
            .filter(move |(_, parent)| *parent.data() == world)
            .map(|(child, _)| child)
            .filter(move |child| ecm.has_component::<Model>(*child))
    }
}
