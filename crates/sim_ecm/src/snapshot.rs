//! Entity snapshots and cloning through the component registry.
//!
//! A snapshot stores each component as its registered name plus the
//! MessagePack encoding of its payload, so it can be restored by code that
//! does not know the component types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sim_component::{AnyComponent, Entity};
use tracing::debug;

use crate::components::ParentEntity;
use crate::error::EcmError;
use crate::manager::EntityComponentManager;

/// One serialised component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Registered component name.
    pub name: String,
    /// MessagePack-encoded payload.
    pub data: Vec<u8>,
}

/// All components of one entity, sorted by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// The entity the snapshot was taken from.
    pub entity: Entity,
    pub components: Vec<ComponentRecord>,
}

impl EntityComponentManager {
    /// Serialise every component of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::EntityNotFound`] if the entity does not exist, or
    /// [`EcmError::Registry`] if a component fails to encode.
    pub fn snapshot_entity(&self, entity: Entity) -> Result<EntitySnapshot, EcmError> {
        self.ensure_entity(entity)?;
        let mut components = Vec::new();
        for storage in self.storages.values() {
            let Some(component) = storage.get_dyn(entity) else {
                continue;
            };
            components.push(ComponentRecord {
                name: component.dyn_name().to_string(),
                data: self.registry.serialize(component)?,
            });
        }
        components.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(EntitySnapshot { entity, components })
    }

    /// Create a new entity holding the components of `snapshot`.
    ///
    /// Every record is decoded before the entity is created, so a bad record
    /// leaves the manager untouched.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::Registry`] if a record names an unknown kind or
    /// fails to decode.
    pub fn restore_entity(&mut self, snapshot: &EntitySnapshot) -> Result<Entity, EcmError> {
        let decoded = snapshot
            .components
            .iter()
            .map(|record| self.registry.deserialize(&record.name, &record.data))
            .collect::<Result<Vec<_>, _>>()?;
        let entity = self.create_entity();
        self.attach_all(entity, decoded)?;
        debug!(%entity, source = %snapshot.entity, "restored entity");
        Ok(entity)
    }

    /// Deep-copy `entity` and its descendants.
    ///
    /// The copy keeps the original's parent; copied children are parented to
    /// their copied parents. Every copied component starts unchanged. Each
    /// entity is copied at most once, even when parent links form a cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::EntityNotFound`] if the entity does not exist, or
    /// [`EcmError::Registry`] if a component is not registered.
    pub fn clone_entity(&mut self, entity: Entity) -> Result<Entity, EcmError> {
        let mut seen = HashSet::new();
        self.clone_tree(entity, None, &mut seen)
    }

    /// `seen` holds both the originals already copied and their copies.
    fn clone_tree(
        &mut self,
        entity: Entity,
        parent: Option<Entity>,
        seen: &mut HashSet<Entity>,
    ) -> Result<Entity, EcmError> {
        self.ensure_entity(entity)?;
        seen.insert(entity);
        let children = self.children(entity);

        let mut copies = Vec::new();
        for storage in self.storages.values() {
            if let Some(component) = storage.get_dyn(entity) {
                copies.push(self.registry.clone_component(component)?);
            }
        }
        if let Some(parent) = parent {
            for component in &mut copies {
                if let Some(link) = component.downcast_mut::<ParentEntity>() {
                    *link = ParentEntity::new(parent);
                }
            }
        }
        let copy = self.create_entity();
        seen.insert(copy);
        self.attach_all(copy, copies)?;
        debug!(%entity, %copy, "cloned entity");

        for child in children {
            if !seen.contains(&child) {
                self.clone_tree(child, Some(copy), seen)?;
            }
        }
        Ok(copy)
    }

    fn attach_all(
        &mut self,
        entity: Entity,
        components: Vec<Box<dyn AnyComponent>>,
    ) -> Result<(), EcmError> {
        for component in components {
            self.create_component_erased(entity, component)?;
        }
        Ok(())
    }
}
