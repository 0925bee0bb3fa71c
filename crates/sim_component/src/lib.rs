//! # sim_component
//!
//! The "C" in ECS: component kinds, their storage, and the runtime registry
//! that looks kinds up by name.
//!
//! This crate provides:
//!
//! - [`Entity`]: `u64` ids of scene nodes.
//! - [`EntityAllocator`]: the sequential id source of a manager.
//! - [`Component`]: the typed storage cell, `Component<T, Tag>`.
//! - [`component!`]: declaration macro binding a unique name to a kind and
//!   registering it with the global registry.
//! - [`ComponentRegistry`]: name-indexed construct/clone/serialise factory.
//! - [`TypedStorage`]: per-kind cells with step-scoped new/removed tracking.

pub mod component;
pub mod entity;
pub mod error;
pub mod registry;
pub mod storage;

pub use component::{
    AnyComponent, Component, ComponentData, ComponentKind, ComponentTag, ComponentTypeId,
};
pub use entity::{Entity, EntityAllocator};
pub use error::RegistryError;
pub use registry::{ComponentDescriptor, ComponentRegistration, ComponentRegistry};
pub use storage::{ComponentStorage, TypedStorage};

#[doc(hidden)]
pub use inventory;
