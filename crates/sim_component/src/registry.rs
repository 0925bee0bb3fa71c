//! Name-indexed component registry and factory.
//!
//! The registry maps a kind's unique string name to a [`ComponentDescriptor`]:
//! the Rust type identity of the kind plus function pointers that construct a
//! default instance, decode one from MessagePack, and allocate empty storage. Generic code
//! (serialisation, scripting bindings) uses it to create and copy components
//! it does not know at compile time.
//!
//! ## Invariants
//! - A name is bound to exactly one Rust type for the lifetime of the registry.
//! - Re-registering the same `(name, type)` pair is a no-op, so registration
//!   order across modules does not matter.
//! - Entries are never removed.
//!
//! ## Declared kinds
//! Every kind declared with [`component!`](crate::component!) submits a
//! [`ComponentRegistration`] at link time. [`ComponentRegistry::global`]
//! applies all of them when it is first accessed, so a declared kind can be
//! constructed and decoded by name before any code has touched its type.
//!
//! ## Concurrency
//! Both indexes are [`DashMap`]s, so registration from any thread during
//! start-up and lock-sharded O(1) lookups on the step thread are safe.

use std::any::{Any, TypeId, type_name};
use std::sync::OnceLock;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, error, warn};

use crate::component::{AnyComponent, ComponentKind, ComponentTypeId};
use crate::error::RegistryError;
use crate::storage::{ComponentStorage, TypedStorage};

type ConstructFn = fn() -> Box<dyn AnyComponent>;
type StorageFn = fn() -> Box<dyn ComponentStorage>;
type DeserializeFn = fn(&[u8]) -> Result<Box<dyn AnyComponent>, rmp_serde::decode::Error>;

/// Everything the registry knows about one component kind.
#[derive(Debug, Clone, Copy)]
pub struct ComponentDescriptor {
    /// The registered name (e.g. `"sim.components.EngineType"`).
    pub name: &'static str,
    /// FNV-1a id derived from `name`.
    pub type_id: ComponentTypeId,
    /// Rust type identity of the kind.
    pub rust_type: TypeId,
    /// Rust type name, for diagnostics.
    pub rust_type_name: &'static str,
    construct_fn: ConstructFn,
    deserialize_fn: DeserializeFn,
    storage_fn: StorageFn,
}

fn construct<K: ComponentKind>() -> Box<dyn AnyComponent> {
    Box::new(K::default())
}

fn deserialize<K: ComponentKind>(
    bytes: &[u8],
) -> Result<Box<dyn AnyComponent>, rmp_serde::decode::Error> {
    let value: K = rmp_serde::from_slice(bytes)?;
    Ok(Box::new(value))
}

fn new_storage<K: ComponentKind>() -> Box<dyn ComponentStorage> {
    Box::new(TypedStorage::<K>::new())
}

impl ComponentDescriptor {
    /// Build the descriptor for kind `K`.
    #[must_use]
    pub fn of<K: ComponentKind>() -> Self {
        Self {
            name: K::NAME,
            type_id: K::component_type_id(),
            rust_type: TypeId::of::<K>(),
            rust_type_name: type_name::<K>(),
            construct_fn: construct::<K>,
            deserialize_fn: deserialize::<K>,
            storage_fn: new_storage::<K>,
        }
    }

    /// Create a default-initialised instance of this kind.
    #[must_use]
    pub fn construct(&self) -> Box<dyn AnyComponent> {
        (self.construct_fn)()
    }

    /// Create empty storage for this kind.
    #[must_use]
    pub fn new_storage(&self) -> Box<dyn ComponentStorage> {
        (self.storage_fn)()
    }

    /// Decode an instance of this kind from MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Decode`] if the bytes do not hold this kind's payload.
    pub fn deserialize(&self, bytes: &[u8]) -> Result<Box<dyn AnyComponent>, RegistryError> {
        (self.deserialize_fn)(bytes).map_err(|source| RegistryError::Decode {
            name: self.name.to_string(),
            source,
        })
    }
}

/// Link-time record of one declared component kind.
///
/// Emitted by [`component!`](crate::component!); not meant to be built by hand.
#[derive(Debug)]
pub struct ComponentRegistration {
    register: fn(&ComponentRegistry) -> Result<ComponentTypeId, RegistryError>,
}

impl ComponentRegistration {
    #[doc(hidden)]
    #[must_use]
    pub const fn new(
        register: fn(&ComponentRegistry) -> Result<ComponentTypeId, RegistryError>,
    ) -> Self {
        Self { register }
    }
}

inventory::collect!(ComponentRegistration);

/// Registry of all component kinds known to the process.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    by_name: DashMap<&'static str, ComponentDescriptor>,
    by_type_id: DashMap<ComponentTypeId, &'static str>,
}

static GLOBAL: OnceLock<ComponentRegistry> = OnceLock::new();

impl ComponentRegistry {
    /// Create an empty, independent registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first access with every kind
    /// declared through [`component!`](crate::component!) already bound.
    ///
    /// A declared kind whose name or id conflicts with one bound earlier is
    /// logged and skipped. Registering it later returns the conflict as an error.
    pub fn global() -> &'static ComponentRegistry {
        GLOBAL.get_or_init(|| {
            let registry = ComponentRegistry::new();
            registry.register_declared();
            registry
        })
    }

    /// Bind every kind declared through [`component!`](crate::component!) in
    /// the linked program. Returns how many declarations were accepted.
    ///
    /// Conflicting declarations are logged and skipped.
    pub fn register_declared(&self) -> usize {
        let mut accepted = 0;
        for declared in inventory::iter::<ComponentRegistration> {
            match (declared.register)(self) {
                Ok(_) => accepted += 1,
                Err(err) => warn!(%err, "skipping declared component"),
            }
        }
        debug!(accepted, total = self.len(), "declared components registered");
        accepted
    }

    /// Bind `K::NAME` to kind `K`.
    ///
    /// Registering the identical kind again returns its id without changing
    /// anything.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateRegistration`] if the name is bound to a different kind.
    /// - [`RegistryError::TypeIdCollision`] if another name hashes to the same id.
    pub fn register<K: ComponentKind>(&self) -> Result<ComponentTypeId, RegistryError> {
        let descriptor = ComponentDescriptor::of::<K>();
        match self.by_name.entry(K::NAME) {
            Entry::Occupied(existing) => {
                let existing = existing.get();
                if existing.rust_type == descriptor.rust_type {
                    return Ok(existing.type_id);
                }
                error!(
                    name = K::NAME,
                    existing = existing.rust_type_name,
                    attempted = descriptor.rust_type_name,
                    "conflicting component registration"
                );
                Err(RegistryError::DuplicateRegistration {
                    name: K::NAME.to_string(),
                    existing: existing.rust_type_name,
                    attempted: descriptor.rust_type_name,
                })
            }
            Entry::Vacant(slot) => {
                match self.by_type_id.entry(descriptor.type_id) {
                    Entry::Occupied(other) => {
                        return Err(RegistryError::TypeIdCollision {
                            name: K::NAME.to_string(),
                            other: (*other.get()).to_string(),
                            id: descriptor.type_id.0,
                        });
                    }
                    Entry::Vacant(id_slot) => {
                        id_slot.insert(K::NAME);
                    }
                }
                slot.insert(descriptor);
                debug!(name = K::NAME, type_id = %descriptor.type_id, "registered component");
                Ok(descriptor.type_id)
            }
        }
    }

    /// Returns the descriptor registered under `name`.
    #[must_use]
    pub fn descriptor(&self, name: &str) -> Option<ComponentDescriptor> {
        self.by_name.get(name).map(|d| *d)
    }

    /// Returns the name registered for a type id.
    #[must_use]
    pub fn name_of(&self, type_id: ComponentTypeId) -> Option<&'static str> {
        self.by_type_id.get(&type_id).map(|n| *n)
    }

    /// Returns `true` if a kind is registered under `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Create a default instance of the kind registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownComponent`] if nothing is registered under `name`.
    pub fn construct(&self, name: &str) -> Result<Box<dyn AnyComponent>, RegistryError> {
        self.lookup(name).map(|d| d.construct())
    }

    /// Deep-copy a type-erased component after checking it against the registry.
    ///
    /// The copy starts with its changed flag cleared.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownComponent`] or [`RegistryError::KindMismatch`].
    pub fn clone_component(
        &self,
        component: &dyn AnyComponent,
    ) -> Result<Box<dyn AnyComponent>, RegistryError> {
        self.check(component)?;
        let mut copy = component.clone_boxed();
        copy.clear_changed();
        Ok(copy)
    }

    /// Encode a type-erased component as MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownComponent`], [`RegistryError::KindMismatch`]
    /// or [`RegistryError::Encode`].
    pub fn serialize(&self, component: &dyn AnyComponent) -> Result<Vec<u8>, RegistryError> {
        self.check(component)?;
        component.to_msgpack().map_err(|source| RegistryError::Encode {
            name: component.dyn_name().to_string(),
            source,
        })
    }

    /// Decode a component of the kind registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownComponent`] or [`RegistryError::Decode`].
    pub fn deserialize(
        &self,
        name: &str,
        bytes: &[u8],
    ) -> Result<Box<dyn AnyComponent>, RegistryError> {
        self.lookup(name)?.deserialize(bytes)
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn components(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.by_name.iter().map(|e| *e.key()).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns `true` if no kinds are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<ComponentDescriptor, RegistryError> {
        self.descriptor(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))
    }

    fn check(&self, component: &dyn AnyComponent) -> Result<(), RegistryError> {
        let descriptor = self.lookup(component.dyn_name())?;
        if Any::type_id(component.as_any()) != descriptor.rust_type {
            return Err(RegistryError::KindMismatch {
                name: descriptor.name.to_string(),
                expected: descriptor.rust_type_name,
            });
        }
        Ok(())
    }
}
