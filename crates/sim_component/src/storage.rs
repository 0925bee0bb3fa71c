//! Per-kind component storage with step-scoped change tracking.
//!
//! Each component kind lives in its own [`TypedStorage`], keyed by entity in
//! ascending order. Besides the live cells, a storage remembers which entities
//! gained the kind during the current step and the last value of every cell
//! removed during it, so "what changed this step" queries are exact. Both sets
//! are emptied by [`ComponentStorage::clear_step`].
//!
//! Per-cell state machine: absent → new (this step) → existing → removed
//! (this step) → absent. A cell removed and attached again within one step
//! is reported twice: as removed with the value it had, and as new.

use std::any::{Any, type_name};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::component::{AnyComponent, ComponentKind};
use crate::entity::Entity;
use crate::error::RegistryError;

/// Type-erased handle on one kind's storage.
pub trait ComponentStorage: Any + Send + Sync + fmt::Debug {
    /// Registered name of the stored kind.
    fn name(&self) -> &'static str;

    /// Number of live cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, entity: Entity) -> bool;

    fn get_dyn(&self, entity: Entity) -> Option<&dyn AnyComponent>;

    /// Insert an erased cell, overwriting any live cell for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::KindMismatch`] if the cell is not of the stored kind.
    fn insert_dyn(
        &mut self,
        entity: Entity,
        component: Box<dyn AnyComponent>,
    ) -> Result<(), RegistryError>;

    /// Detach the cell for `entity`. Returns `false` if there was none.
    fn remove(&mut self, entity: Entity) -> bool;

    /// Forget this step's additions and removals and clear every changed flag.
    fn clear_step(&mut self);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Storage for a single component kind `K`.
#[derive(Debug)]
pub struct TypedStorage<K> {
    cells: BTreeMap<Entity, K>,
    added: BTreeSet<Entity>,
    removed: BTreeMap<Entity, K>,
}

impl<K: ComponentKind> TypedStorage<K> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            added: BTreeSet::new(),
            removed: BTreeMap::new(),
        }
    }

    /// Attach `value` to `entity`.
    ///
    /// A live cell is overwritten in place: it keeps its new/existing state and
    /// is marked changed. Attaching to an entity whose cell was removed this
    /// step keeps that removal on record.
    pub fn insert(&mut self, entity: Entity, value: K) -> &mut K {
        use std::collections::btree_map::Entry;

        match self.cells.entry(entity) {
            Entry::Occupied(slot) => {
                let cell = slot.into_mut();
                cell.set_payload(value.into_payload());
                cell
            }
            Entry::Vacant(slot) => {
                self.added.insert(entity);
                slot.insert(value)
            }
        }
    }

    /// Returns the live cell for `entity`.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&K> {
        self.cells.get(&entity)
    }

    /// Returns the live cell for `entity` mutably.
    #[must_use]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut K> {
        self.cells.get_mut(&entity)
    }

    /// All live cells, ascending by entity.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.cells.iter().map(|(e, c)| (*e, c))
    }

    /// All live cells, mutably, ascending by entity.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut K)> + '_ {
        self.cells.iter_mut().map(|(e, c)| (*e, c))
    }

    /// Cells attached during the current step.
    pub fn iter_new(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.added
            .iter()
            .filter_map(|e| self.cells.get(e).map(|c| (*e, c)))
    }

    /// Last values of cells removed during the current step.
    pub fn iter_removed(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.removed.iter().map(|(e, c)| (*e, c))
    }

    /// Live cells whose changed flag is raised.
    pub fn iter_changed(&self) -> impl Iterator<Item = (Entity, &K)> + '_ {
        self.iter().filter(|(_, c)| AnyComponent::is_changed(*c))
    }

    /// Returns `true` if the cell was attached during the current step.
    #[must_use]
    pub fn is_new(&self, entity: Entity) -> bool {
        self.added.contains(&entity)
    }

    /// Returns `true` if a cell was removed from `entity` during the current step.
    #[must_use]
    pub fn is_removed(&self, entity: Entity) -> bool {
        self.removed.contains_key(&entity)
    }
}

impl<K: ComponentKind> Default for TypedStorage<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: ComponentKind> ComponentStorage for TypedStorage<K> {
    fn name(&self) -> &'static str {
        K::NAME
    }

    fn len(&self) -> usize {
        self.cells.len()
    }

    fn contains(&self, entity: Entity) -> bool {
        self.cells.contains_key(&entity)
    }

    fn get_dyn(&self, entity: Entity) -> Option<&dyn AnyComponent> {
        self.cells.get(&entity).map(|c| c as &dyn AnyComponent)
    }

    fn insert_dyn(
        &mut self,
        entity: Entity,
        component: Box<dyn AnyComponent>,
    ) -> Result<(), RegistryError> {
        let value = component
            .into_any()
            .downcast::<K>()
            .map_err(|_| RegistryError::KindMismatch {
                name: K::NAME.to_string(),
                expected: type_name::<K>(),
            })?;
        self.insert(entity, *value);
        Ok(())
    }

    fn remove(&mut self, entity: Entity) -> bool {
        match self.cells.remove(&entity) {
            Some(value) => {
                self.added.remove(&entity);
                self.removed.insert(entity, value);
                true
            }
            None => false,
        }
    }

    fn clear_step(&mut self) {
        self.added.clear();
        self.removed.clear();
        for cell in self.cells.values_mut() {
            AnyComponent::clear_changed(cell);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl dyn ComponentStorage {
    /// Downcast to the typed storage of kind `K`.
    #[must_use]
    pub fn typed<K: ComponentKind>(&self) -> Option<&TypedStorage<K>> {
        self.as_any().downcast_ref()
    }

    /// Mutably downcast to the typed storage of kind `K`.
    #[must_use]
    pub fn typed_mut<K: ComponentKind>(&mut self) -> Option<&mut TypedStorage<K>> {
        self.as_any_mut().downcast_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::component! {
        type Speed = Component<f64, SpeedTag>, "test.storage.Speed";
        type Label = Component<String, LabelTag>, "test.storage.Label";
    }

    fn entities<'a>(it: impl Iterator<Item = (Entity, &'a Speed)>) -> Vec<u64> {
        it.map(|(e, _)| e.id()).collect()
    }

    #[test]
    fn test_insert_is_new_until_step_cleared() {
        let mut storage = TypedStorage::<Speed>::new();
        storage.insert(Entity(2), Speed::new(1.0));
        storage.insert(Entity(1), Speed::new(2.0));

        assert_eq!(entities(storage.iter_new()), vec![1, 2]);
        assert_eq!(entities(storage.iter()), vec![1, 2]);

        storage.clear_step();
        assert_eq!(entities(storage.iter_new()), Vec::<u64>::new());
        assert_eq!(entities(storage.iter()), vec![1, 2]);
    }

    #[test]
    fn test_overwrite_marks_changed_and_keeps_state() {
        let mut storage = TypedStorage::<Speed>::new();
        storage.insert(Entity(1), Speed::new(1.0));
        storage.clear_step();

        storage.insert(Entity(1), Speed::new(5.0));
        assert_eq!(*storage.get(Entity(1)).unwrap().data(), 5.0);
        assert!(!storage.is_new(Entity(1)));
        assert_eq!(entities(storage.iter_changed()), vec![1]);
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_remove_keeps_last_value_for_the_step() {
        let mut storage = TypedStorage::<Speed>::new();
        storage.insert(Entity(3), Speed::new(9.0));
        storage.clear_step();

        assert!(storage.remove(Entity(3)));
        assert!(!storage.remove(Entity(3)));
        assert!(storage.get(Entity(3)).is_none());
        let removed: Vec<(u64, f64)> = storage
            .iter_removed()
            .map(|(e, c)| (e.id(), *c.data()))
            .collect();
        assert_eq!(removed, vec![(3, 9.0)]);

        storage.clear_step();
        assert_eq!(storage.iter_removed().count(), 0);
    }

    #[test]
    fn test_readd_after_remove_reports_both() {
        let mut storage = TypedStorage::<Speed>::new();
        storage.insert(Entity(1), Speed::new(1.0));
        storage.clear_step();
        storage.remove(Entity(1));
        storage.insert(Entity(1), Speed::new(2.0));

        assert!(storage.is_new(Entity(1)));
        assert!(storage.is_removed(Entity(1)));
        let removed: Vec<(u64, f64)> = storage
            .iter_removed()
            .map(|(e, c)| (e.id(), *c.data()))
            .collect();
        assert_eq!(removed, vec![(1, 1.0)]);
        assert_eq!(entities(storage.iter_new()), vec![1]);
        assert_eq!(*storage.get(Entity(1)).unwrap().data(), 2.0);

        storage.clear_step();
        assert!(!storage.is_new(Entity(1)));
        assert!(!storage.is_removed(Entity(1)));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_insert_dyn_rejects_other_kind() {
        let mut erased: Box<dyn ComponentStorage> = Box::new(TypedStorage::<Speed>::new());
        let err = erased
            .insert_dyn(Entity(1), Box::new(Label::new("x".into())))
            .unwrap_err();
        assert!(matches!(err, RegistryError::KindMismatch { .. }));

        erased
            .insert_dyn(Entity(1), Box::new(Speed::new(4.0)))
            .unwrap();
        assert!(erased.contains(Entity(1)));
        let typed = erased.typed::<Speed>().unwrap();
        assert_eq!(*typed.get(Entity(1)).unwrap().data(), 4.0);
        assert!(erased.typed::<Label>().is_none());
    }
}
