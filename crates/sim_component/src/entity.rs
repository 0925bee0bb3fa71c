//! Entity identifiers for the simulation scene.
//!
//! Every world, model, link and joint of a session is an [`Entity`]: a bare
//! id whose meaning comes entirely from the components attached to it. The
//! entity-component manager hands ids out through its [`EntityAllocator`]
//! and defines how long an id stays live.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of a node in the scene's entity tree.
///
/// Ordered by id, so ascending iteration visits entities in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u64);

impl Entity {
    /// Placeholder id that no live entity has. A default-constructed
    /// `ParentEntity` points here, meaning "no parent yet".
    pub const NULL: Entity = Entity(0);

    #[must_use]
    pub const fn from_raw(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }

    /// `false` only for [`Entity::NULL`]. Says nothing about whether the
    /// entity is still live in a manager.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::NULL.0
    }
}

impl Default for Entity {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Sequential id source owned by one entity-component manager.
///
/// The first id is 1. Each call to [`allocate`](Self::allocate) returns the
/// next id, regardless of which entities have been removed since.
#[derive(Debug)]
pub struct EntityAllocator {
    next: u64,
}

impl EntityAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: Entity::NULL.0 + 1,
        }
    }

    /// Returns the next id.
    pub fn allocate(&mut self) -> Entity {
        let entity = Entity(self.next);
        self.next += 1;
        entity
    }

    /// How many ids this allocator has handed out.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next - 1
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
