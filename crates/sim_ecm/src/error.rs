//! Entity-component manager errors.

use sim_component::{Entity, RegistryError};

/// Errors raised by the [`EntityComponentManager`](crate::EntityComponentManager).
///
/// Absence of a component is never an error; reads return `Option`.
#[derive(Debug, thiserror::Error)]
pub enum EcmError {
    /// The entity was never created or has already been removed.
    #[error("{0} not found")]
    EntityNotFound(Entity),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
