//! # sim_ecm
//!
//! The entity-component manager of the simulation core.
//!
//! - [`EntityComponentManager`] owns entities and their typed components and
//!   answers per-step queries (new, existing, removed, changed).
//! - [`components`] declares the built-in component kinds.
//! - [`World`] is a read-only view scoped to a world's root entity.
//! - [`util`] holds entity-tree helpers such as [`util::scoped_name`].
//!
//! Snapshots ([`EntitySnapshot`]) serialise an entity's components by
//! registered name so they can be restored without static type knowledge.
//!
//! The manager has no internal locking. Structural changes are applied on the
//! simulation step thread.

pub mod components;
pub mod error;
pub mod manager;
pub mod snapshot;
pub mod util;
pub mod world;

pub use error::EcmError;
pub use manager::EntityComponentManager;
pub use snapshot::{ComponentRecord, EntitySnapshot};
pub use world::World;
