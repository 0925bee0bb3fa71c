//! The entity-component manager.
//!
//! [`EntityComponentManager`] owns every entity and every component cell of a
//! simulation session. Components of one kind share a
//! [`TypedStorage`](sim_component::TypedStorage), keyed by the kind's
//! [`ComponentTypeId`].
//!
//! ## Step-scoped changes
//!
//! Entities and components created since the last
//! [`clear_step_changes`](EntityComponentManager::clear_step_changes) are
//! "new"; components detached since then are "removed" and keep their last
//! value until the clear. The runner clears at the end of each step, after its
//! systems have consumed that step's change queries.
//!
//! ## Deferred removal
//!
//! [`request_remove_entity`](EntityComponentManager::request_remove_entity)
//! only marks an entity. It stays fully queryable until
//! [`process_remove_entity_requests`](EntityComponentManager::process_remove_entity_requests)
//! detaches its components and frees it. A freed id is dead for the rest of
//! the session: the allocator never hands it out again, so a system still
//! holding it after the removal step finds nothing instead of a newer entity.

use std::collections::{BTreeSet, HashMap, HashSet};

use sim_component::{
    AnyComponent, ComponentKind, ComponentRegistry, ComponentStorage, ComponentTypeId, Entity,
    EntityAllocator, RegistryError, TypedStorage,
};
use tracing::{debug, warn};

use crate::components::{self, ParentEntity};
use crate::error::EcmError;

/// Owner of all entities and their components.
#[derive(Debug)]
pub struct EntityComponentManager {
    pub(crate) registry: &'static ComponentRegistry,
    allocator: EntityAllocator,
    entities: BTreeSet<Entity>,
    new_entities: BTreeSet<Entity>,
    removal_requests: BTreeSet<Entity>,
    pub(crate) storages: HashMap<ComponentTypeId, Box<dyn ComponentStorage>>,
}

impl EntityComponentManager {
    /// Create an empty manager backed by the process-wide registry.
    ///
    /// # Panics
    ///
    /// Panics if a built-in component name is already bound to a different
    /// kind in the global registry.
    #[must_use]
    pub fn new() -> Self {
        components::ensure_builtin_components();
        Self::from_registry(ComponentRegistry::global())
    }

    /// Create an empty manager backed by `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::Registry`] if the built-in kinds cannot be registered.
    pub fn with_registry(registry: &'static ComponentRegistry) -> Result<Self, EcmError> {
        components::register_builtin_components(registry)?;
        Ok(Self::from_registry(registry))
    }

    fn from_registry(registry: &'static ComponentRegistry) -> Self {
        Self {
            registry,
            allocator: EntityAllocator::new(),
            entities: BTreeSet::new(),
            new_entities: BTreeSet::new(),
            removal_requests: BTreeSet::new(),
            storages: HashMap::new(),
        }
    }

    /// The registry this manager resolves component names against.
    #[must_use]
    pub fn registry(&self) -> &'static ComponentRegistry {
        self.registry
    }

    // -- Entity lifecycle --

    /// Allocate a fresh entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.entities.insert(entity);
        self.new_entities.insert(entity);
        debug!(%entity, "created entity");
        entity
    }

    /// Returns `true` if the entity is live.
    #[must_use]
    pub fn has_entity(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All live entities, ascending.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Entities created during the current step, ascending.
    pub fn new_entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.new_entities.iter().copied()
    }

    /// Returns `true` if the entity was created during the current step.
    #[must_use]
    pub fn is_new_entity(&self, entity: Entity) -> bool {
        self.new_entities.contains(&entity)
    }

    /// Mark an entity for removal at the next
    /// [`process_remove_entity_requests`](Self::process_remove_entity_requests).
    ///
    /// Requests for unknown or already-marked entities are ignored.
    pub fn request_remove_entity(&mut self, entity: Entity) {
        if !self.has_entity(entity) {
            warn!(%entity, "ignoring removal request for unknown entity");
            return;
        }
        if self.removal_requests.insert(entity) {
            debug!(%entity, "entity marked for removal");
        }
    }

    /// Mark an entity and all of its descendants for removal.
    pub fn request_remove_entity_recursive(&mut self, entity: Entity) {
        for descendant in self.descendants(entity) {
            self.request_remove_entity(descendant);
        }
        self.request_remove_entity(entity);
    }

    /// Returns `true` if a removal request for the entity is pending.
    #[must_use]
    pub fn is_marked_for_removal(&self, entity: Entity) -> bool {
        self.removal_requests.contains(&entity)
    }

    /// Apply all pending removal requests.
    ///
    /// Every component of a removed entity is detached (and reported by
    /// [`each_removed`](Self::each_removed) until the step is cleared), then
    /// the entity is freed. Returns the number of entities removed.
    pub fn process_remove_entity_requests(&mut self) -> usize {
        let requests = std::mem::take(&mut self.removal_requests);
        let mut removed = 0;
        for entity in requests {
            if !self.entities.remove(&entity) {
                continue;
            }
            for storage in self.storages.values_mut() {
                storage.remove(entity);
            }
            self.new_entities.remove(&entity);
            removed += 1;
            debug!(%entity, "removed entity");
        }
        removed
    }

    // -- Components --

    /// Attach `value` to `entity`, overwriting any component of the same kind.
    ///
    /// Kinds declared with `component!` are already registered. Any other
    /// kind is registered on first use.
    ///
    /// # Errors
    ///
    /// - [`EcmError::EntityNotFound`] if the entity does not exist.
    /// - [`EcmError::Registry`] if `K::NAME` is bound to a different kind.
    pub fn create_component<K: ComponentKind>(
        &mut self,
        entity: Entity,
        value: K,
    ) -> Result<&mut K, EcmError> {
        self.ensure_entity(entity)?;
        let storage = self.storage_mut::<K>()?;
        debug!(%entity, component = K::NAME, "attached component");
        Ok(storage.insert(entity, value))
    }

    /// Attach a type-erased component, resolving its kind through the registry.
    ///
    /// # Errors
    ///
    /// - [`EcmError::EntityNotFound`] if the entity does not exist.
    /// - [`EcmError::Registry`] if the kind is not registered or the instance
    ///   does not match the registered kind.
    pub fn create_component_erased(
        &mut self,
        entity: Entity,
        component: Box<dyn AnyComponent>,
    ) -> Result<(), EcmError> {
        self.ensure_entity(entity)?;
        let name = component.dyn_name();
        let descriptor = self
            .registry
            .descriptor(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;
        self.storages
            .entry(descriptor.type_id)
            .or_insert_with(|| descriptor.new_storage())
            .insert_dyn(entity, component)?;
        debug!(%entity, component = name, "attached component");
        Ok(())
    }

    /// The component of kind `K` on `entity`, if any.
    ///
    /// Unknown entities simply have no components.
    #[must_use]
    pub fn component<K: ComponentKind>(&self, entity: Entity) -> Option<&K> {
        self.storage::<K>()?.get(entity)
    }

    /// Like [`component`](Self::component), but distinguishes an unknown
    /// entity from a missing component.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::EntityNotFound`] if the entity does not exist.
    pub fn try_component<K: ComponentKind>(&self, entity: Entity) -> Result<Option<&K>, EcmError> {
        self.ensure_entity(entity)?;
        Ok(self.component::<K>(entity))
    }

    /// Mutable access to the component of kind `K` on `entity`, if any.
    #[must_use]
    pub fn component_mut<K: ComponentKind>(&mut self, entity: Entity) -> Option<&mut K> {
        self.storages
            .get_mut(&K::component_type_id())?
            .typed_mut::<K>()?
            .get_mut(entity)
    }

    /// A copy of the payload of kind `K` on `entity`.
    #[must_use]
    pub fn component_data<K: ComponentKind>(&self, entity: Entity) -> Option<K::Data> {
        self.component::<K>(entity).map(|c| c.payload().clone())
    }

    /// Returns `true` if `entity` holds a component of kind `K`.
    #[must_use]
    pub fn has_component<K: ComponentKind>(&self, entity: Entity) -> bool {
        self.component::<K>(entity).is_some()
    }

    /// Write the payload of kind `K` on `entity`, creating the component if
    /// needed.
    ///
    /// Returns `true` if the stored payload changed. An equal payload leaves
    /// the component untouched and its changed flag as it was.
    ///
    /// # Errors
    ///
    /// Same as [`create_component`](Self::create_component).
    pub fn set_component_data<K: ComponentKind>(
        &mut self,
        entity: Entity,
        data: K::Data,
    ) -> Result<bool, EcmError> {
        self.ensure_entity(entity)?;
        if let Some(existing) = self.component_mut::<K>(entity) {
            if *existing.payload() == data {
                return Ok(false);
            }
            existing.set_payload(data);
            return Ok(true);
        }
        self.create_component(entity, K::from_data(data))?;
        Ok(true)
    }

    /// Detach the component of kind `K` from `entity`.
    ///
    /// Returns `false` if the entity had no such component.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::EntityNotFound`] if the entity does not exist.
    pub fn remove_component<K: ComponentKind>(&mut self, entity: Entity) -> Result<bool, EcmError> {
        self.ensure_entity(entity)?;
        let removed = self
            .storages
            .get_mut(&K::component_type_id())
            .is_some_and(|storage| storage.remove(entity));
        if removed {
            debug!(%entity, component = K::NAME, "removed component");
        }
        Ok(removed)
    }

    /// Type-erased view of the component registered as `name` on `entity`.
    #[must_use]
    pub fn component_dyn(&self, entity: Entity, name: &str) -> Option<&dyn AnyComponent> {
        self.storages
            .get(&ComponentTypeId::from_name(name))?
            .get_dyn(entity)
    }

    /// Names of every component on `entity`, sorted.
    #[must_use]
    pub fn component_names(&self, entity: Entity) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .storages
            .values()
            .filter(|storage| storage.contains(entity))
            .map(|storage| storage.name())
            .collect();
        names.sort_unstable();
        names
    }

    // -- Queries --

    /// Every entity holding kind `K`, including components new this step.
    pub fn each<K: ComponentKind>(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.storage::<K>().into_iter().flat_map(TypedStorage::iter)
    }

    /// Mutable iteration over every entity holding kind `K`.
    pub fn each_mut<K: ComponentKind>(&mut self) -> impl Iterator<Item = (Entity, &mut K)> + '_ {
        self.storages
            .get_mut(&K::component_type_id())
            .and_then(|storage| storage.typed_mut::<K>())
            .into_iter()
            .flat_map(TypedStorage::iter_mut)
    }

    /// Components of kind `K` attached during the current step.
    pub fn each_new<K: ComponentKind>(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.storage::<K>().into_iter().flat_map(TypedStorage::iter_new)
    }

    /// Last values of components of kind `K` detached during the current step.
    pub fn each_removed<K: ComponentKind>(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.storage::<K>()
            .into_iter()
            .flat_map(TypedStorage::iter_removed)
    }

    /// Components of kind `K` whose changed flag is raised.
    pub fn each_changed<K: ComponentKind>(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.storage::<K>()
            .into_iter()
            .flat_map(TypedStorage::iter_changed)
    }

    /// End the current step: new entities and components become existing,
    /// removed components are forgotten and every changed flag is cleared.
    pub fn clear_step_changes(&mut self) {
        self.new_entities.clear();
        for storage in self.storages.values_mut() {
            storage.clear_step();
        }
    }

    // -- Entity tree --

    /// Make `parent` the parent of `child`.
    ///
    /// # Errors
    ///
    /// Returns [`EcmError::EntityNotFound`] if either entity does not exist.
    pub fn set_parent_entity(&mut self, child: Entity, parent: Entity) -> Result<(), EcmError> {
        self.ensure_entity(parent)?;
        self.set_component_data::<ParentEntity>(child, parent)?;
        Ok(())
    }

    /// Returns the parent of `entity` in the tree, if it has one.
    #[must_use]
    pub fn parent_entity(&self, entity: Entity) -> Option<Entity> {
        self.component_data::<ParentEntity>(entity)
    }

    /// Immediate children of `entity`, ascending.
    #[must_use]
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.each::<ParentEntity>()
            .filter(|(_, parent)| *parent.data() == entity)
            .map(|(child, _)| child)
            .collect()
    }

    /// Every entity below `entity` in the tree, breadth first. The entity
    /// itself is not included.
    #[must_use]
    pub fn descendants(&self, entity: Entity) -> Vec<Entity> {
        let mut visited = HashSet::from([entity]);
        let mut out = Vec::new();
        let mut cursor = 0;
        let mut frontier = vec![entity];
        while cursor < frontier.len() {
            let current = frontier[cursor];
            cursor += 1;
            for child in self.children(current) {
                if visited.insert(child) {
                    out.push(child);
                    frontier.push(child);
                }
            }
        }
        out
    }

    // -- Internals --

    pub(crate) fn ensure_entity(&self, entity: Entity) -> Result<(), EcmError> {
        if self.has_entity(entity) {
            Ok(())
        } else {
            Err(EcmError::EntityNotFound(entity))
        }
    }

    fn storage<K: ComponentKind>(&self) -> Option<&TypedStorage<K>> {
        self.storages.get(&K::component_type_id())?.typed::<K>()
    }

    fn storage_mut<K: ComponentKind>(&mut self) -> Result<&mut TypedStorage<K>, EcmError> {
        let type_id = K::component_type_id();
        if !self.storages.contains_key(&type_id) {
            self.registry.register::<K>()?;
            self.storages
                .insert(type_id, Box::new(TypedStorage::<K>::new()));
        }
        self.storages
            .get_mut(&type_id)
            .and_then(|storage| storage.typed_mut::<K>())
            .ok_or_else(|| {
                EcmError::Registry(RegistryError::KindMismatch {
                    name: K::NAME.to_string(),
                    expected: std::any::type_name::<K>(),
                })
            })
    }
}

impl Default for EntityComponentManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use sim_component::component;

    use super::*;
    use crate::components::{EngineType, Name};

    component! {
        type Counter = Component<u32, CounterTag>, "test.ecm.Counter";
        type Unused = Component<String, UnusedTag>, "test.ecm.Unused";
    }

    // Same name as `Counter`, declared by hand so it is never bound globally.
    #[derive(Debug)]
    enum ShadowTag {}

    impl sim_component::ComponentTag for ShadowTag {
        const NAME: &'static str = "test.ecm.Counter";
    }

    type Shadow = sim_component::Component<i64, ShadowTag>;

    fn ids<'a, K: 'a>(it: impl Iterator<Item = (Entity, &'a K)>) -> Vec<u64> {
        it.map(|(e, _)| e.id()).collect()
    }

    #[test]
    fn test_engine_type_scenario() {
        let mut ecm = EntityComponentManager::new();
        let e1 = ecm.create_entity();
        ecm.create_component(e1, EngineType::new("ode".into()))
            .unwrap();
        assert_eq!(ecm.component::<EngineType>(e1).unwrap().data(), "ode");

        assert!(ecm.remove_component::<EngineType>(e1).unwrap());
        assert!(ecm.component::<EngineType>(e1).is_none());

        let e2 = Entity::from_raw(e1.id() + 1000);
        assert!(ecm.component::<EngineType>(e2).is_none());
        assert!(matches!(
            ecm.try_component::<EngineType>(e2),
            Err(EcmError::EntityNotFound(e)) if e == e2
        ));
    }

    #[test]
    fn test_fresh_entity_has_no_components() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        assert!(ecm.component::<Name>(e).is_none());
        assert!(ecm.component_names(e).is_empty());
        assert!(ecm.is_new_entity(e));
        assert_eq!(ecm.new_entities().collect::<Vec<_>>(), vec![e]);
    }

    #[test]
    fn test_entities_are_never_reused() {
        let mut ecm = EntityComponentManager::new();
        let a = ecm.create_entity();
        ecm.request_remove_entity(a);
        ecm.process_remove_entity_requests();
        let b = ecm.create_entity();
        assert_ne!(a, b);
        assert!(!ecm.has_entity(a));
    }

    #[test]
    fn test_create_component_on_missing_entity_fails() {
        let mut ecm = EntityComponentManager::new();
        let err = ecm
            .create_component(Entity::from_raw(42), Counter::new(1))
            .unwrap_err();
        assert!(matches!(err, EcmError::EntityNotFound(_)));
        assert!(matches!(
            ecm.remove_component::<Counter>(Entity::from_raw(42)),
            Err(EcmError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_create_component_overwrites() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(1)).unwrap();
        ecm.create_component(e, Counter::new(7)).unwrap();
        assert_eq!(ecm.component_data::<Counter>(e), Some(7));
        assert_eq!(ids(ecm.each::<Counter>()), vec![e.id()]);
    }

    #[test]
    fn test_remove_component_twice_is_noop() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(3)).unwrap();
        assert!(ecm.remove_component::<Counter>(e).unwrap());
        assert!(!ecm.remove_component::<Counter>(e).unwrap());
        assert!(!ecm.has_component::<Counter>(e));
        assert_eq!(ids(ecm.each_removed::<Counter>()), vec![e.id()]);
    }

    #[test]
    fn test_new_then_existing_across_steps() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(1)).unwrap();

        assert_eq!(ids(ecm.each_new::<Counter>()), vec![e.id()]);
        assert_eq!(ids(ecm.each::<Counter>()), vec![e.id()]);

        for _ in 0..3 {
            ecm.clear_step_changes();
            assert!(ids(ecm.each_new::<Counter>()).is_empty());
            assert_eq!(ids(ecm.each::<Counter>()), vec![e.id()]);
        }
        assert!(!ecm.is_new_entity(e));
    }

    #[test]
    fn test_removed_visible_only_for_one_step() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(5)).unwrap();
        ecm.clear_step_changes();

        ecm.remove_component::<Counter>(e).unwrap();
        let removed: Vec<u32> = ecm
            .each_removed::<Counter>()
            .map(|(_, c)| *c.data())
            .collect();
        assert_eq!(removed, vec![5]);

        ecm.clear_step_changes();
        assert_eq!(ecm.each_removed::<Counter>().count(), 0);
    }

    #[test]
    fn test_deferred_removal_keeps_entity_queryable() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Name::new("box".into())).unwrap();
        ecm.create_component(e, Counter::new(2)).unwrap();

        ecm.request_remove_entity(e);
        ecm.request_remove_entity(e);
        assert!(ecm.is_marked_for_removal(e));
        assert!(ecm.has_entity(e));
        assert_eq!(ecm.component::<Name>(e).unwrap().data(), "box");
        assert_eq!(ids(ecm.each::<Counter>()), vec![e.id()]);

        assert_eq!(ecm.process_remove_entity_requests(), 1);
        assert!(!ecm.has_entity(e));
        assert!(ecm.component::<Name>(e).is_none());
        assert!(ecm.component::<Counter>(e).is_none());
        assert_eq!(ids(ecm.each_removed::<Counter>()), vec![e.id()]);
        assert_eq!(ecm.process_remove_entity_requests(), 0);
    }

    #[test]
    fn test_request_remove_unknown_entity_is_ignored() {
        let mut ecm = EntityComponentManager::new();
        ecm.request_remove_entity(Entity::from_raw(999));
        assert!(!ecm.is_marked_for_removal(Entity::from_raw(999)));
        assert_eq!(ecm.process_remove_entity_requests(), 0);
    }

    #[test]
    fn test_readd_in_same_step_reports_removed_and_new() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(1)).unwrap();
        ecm.clear_step_changes();

        assert!(ecm.remove_component::<Counter>(e).unwrap());
        ecm.create_component(e, Counter::new(2)).unwrap();

        let removed: Vec<u32> = ecm
            .each_removed::<Counter>()
            .map(|(_, c)| *c.data())
            .collect();
        assert_eq!(removed, vec![1]);
        assert_eq!(ids(ecm.each_new::<Counter>()), vec![e.id()]);
        assert_eq!(ecm.component_data::<Counter>(e), Some(2));

        ecm.clear_step_changes();
        assert_eq!(ecm.each_removed::<Counter>().count(), 0);
        assert_eq!(ecm.each_new::<Counter>().count(), 0);
    }

    #[test]
    fn test_declared_kind_attaches_by_name_before_first_use() {
        let mut ecm = EntityComponentManager::new();
        assert!(ecm.registry().components().contains(&"test.ecm.Unused"));

        let e = ecm.create_entity();
        let built = ecm.registry().construct("test.ecm.Unused").unwrap();
        ecm.create_component_erased(e, built).unwrap();
        assert_eq!(ecm.component_names(e), vec!["test.ecm.Unused"]);
        assert_eq!(ecm.component::<Unused>(e).unwrap().data(), "");
    }

    #[test]
    fn test_set_component_data_reports_change() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        assert!(ecm.set_component_data::<Counter>(e, 1).unwrap());
        ecm.clear_step_changes();

        assert!(!ecm.set_component_data::<Counter>(e, 1).unwrap());
        assert_eq!(ecm.each_changed::<Counter>().count(), 0);

        assert!(ecm.set_component_data::<Counter>(e, 2).unwrap());
        assert_eq!(ids(ecm.each_changed::<Counter>()), vec![e.id()]);

        ecm.clear_step_changes();
        assert_eq!(ecm.each_changed::<Counter>().count(), 0);
    }

    #[test]
    fn test_each_mut_updates_in_place() {
        let mut ecm = EntityComponentManager::new();
        let a = ecm.create_entity();
        let b = ecm.create_entity();
        ecm.create_component(a, Counter::new(1)).unwrap();
        ecm.create_component(b, Counter::new(10)).unwrap();

        for (_, counter) in ecm.each_mut::<Counter>() {
            let next = *counter.data() + 1;
            counter.set_data(next);
        }
        assert_eq!(ecm.component_data::<Counter>(a), Some(2));
        assert_eq!(ecm.component_data::<Counter>(b), Some(11));
    }

    #[test]
    fn test_conflicting_kind_is_rejected() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        ecm.create_component(e, Counter::new(1)).unwrap();
        let err = ecm.create_component(e, Shadow::new(1)).unwrap_err();
        assert!(matches!(err, EcmError::Registry(_)));
        assert!(ecm.component::<Shadow>(e).is_none());
    }

    #[test]
    fn test_erased_component_attach() {
        let mut ecm = EntityComponentManager::new();
        let e = ecm.create_entity();
        let built = ecm.registry().construct("sim.components.Name").unwrap();
        ecm.create_component_erased(e, built).unwrap();
        assert_eq!(ecm.component::<Name>(e).unwrap().data(), "");
        assert_eq!(ecm.component_names(e), vec!["sim.components.Name"]);
        assert!(ecm.component_dyn(e, "sim.components.Name").is_some());
    }

    #[test]
    fn test_tree_helpers() {
        let mut ecm = EntityComponentManager::new();
        let root = ecm.create_entity();
        let a = ecm.create_entity();
        let b = ecm.create_entity();
        let c = ecm.create_entity();
        ecm.set_parent_entity(a, root).unwrap();
        ecm.set_parent_entity(b, root).unwrap();
        ecm.set_parent_entity(c, a).unwrap();

        assert_eq!(ecm.parent_entity(c), Some(a));
        assert_eq!(ecm.parent_entity(root), None);
        assert_eq!(ecm.children(root), vec![a, b]);
        assert_eq!(ecm.descendants(root), vec![a, b, c]);

        ecm.request_remove_entity_recursive(a);
        assert_eq!(ecm.process_remove_entity_requests(), 2);
        assert_eq!(ecm.children(root), vec![b]);
    }

    #[test]
    fn test_descendants_tolerates_cycles() {
        let mut ecm = EntityComponentManager::new();
        let a = ecm.create_entity();
        let b = ecm.create_entity();
        ecm.set_parent_entity(a, b).unwrap();
        ecm.set_parent_entity(b, a).unwrap();
        assert_eq!(ecm.descendants(a), vec![b]);
    }
}
