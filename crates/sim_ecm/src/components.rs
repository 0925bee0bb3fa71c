//! Built-in component kinds.
//!
//! These are the kinds every simulation session understands: naming, the
//! entity tree, world-level physical quantities and poses. Like any kind
//! declared with `component!`, they are bound in the process-wide registry
//! when it starts. [`EntityComponentManager::new`](crate::EntityComponentManager::new)
//! additionally checks that no other declaration took one of their names.

use std::sync::Once;

use sim_component::{ComponentRegistry, Entity, RegistryError, component};
use sim_math::{DVec3, Pose3};
use tracing::debug;

component! {
    /// Human-readable name of an entity, unique among its siblings.
    pub type Name = Component<String, NameTag>, "sim.components.Name";

    /// Name of the physics engine driving a world (e.g. `"ode"`).
    pub type EngineType = Component<String, EngineTypeTag>, "sim.components.EngineType";

    /// Gravity acceleration of a world, in m/s².
    pub type Gravity = Component<DVec3, GravityTag>, "sim.components.Gravity";

    /// Magnetic field of a world, in tesla.
    pub type MagneticField = Component<DVec3, MagneticFieldTag>, "sim.components.MagneticField";

    /// Parent of an entity in the entity tree.
    pub type ParentEntity = Component<Entity, ParentEntityTag>, "sim.components.ParentEntity";

    /// Marks the root entity of a simulated world.
    pub type World = Component<(), WorldTag>, "sim.components.World";

    /// Marks a model entity.
    pub type Model = Component<(), ModelTag>, "sim.components.Model";

    /// Pose of an entity relative to its parent.
    pub type Pose = Component<Pose3, PoseTag>, "sim.components.Pose";

    /// Path of the file the entity was loaded from.
    pub type SourceFilePath = Component<String, SourceFilePathTag>, "sim.components.SourceFilePath";
}

/// Register every built-in kind in `registry`.
///
/// Safe to call repeatedly; already-registered kinds are left untouched.
///
/// # Errors
///
/// Returns a [`RegistryError`] if a built-in name is already bound to a
/// different kind.
pub fn register_builtin_components(registry: &ComponentRegistry) -> Result<(), RegistryError> {
    registry.register::<Name>()?;
    registry.register::<EngineType>()?;
    registry.register::<Gravity>()?;
    registry.register::<MagneticField>()?;
    registry.register::<ParentEntity>()?;
    registry.register::<World>()?;
    registry.register::<Model>()?;
    registry.register::<Pose>()?;
    registry.register::<SourceFilePath>()?;
    debug!(count = registry.len(), "built-in components registered");
    Ok(())
}

/// Confirm the built-in kinds own their names in the global registry, once
/// per process.
///
/// # Panics
///
/// Panics if a built-in name was already bound to a different kind. That is a
/// startup programming error and the session cannot run with it.
pub(crate) fn ensure_builtin_components() {
    static BUILTINS: Once = Once::new();
    BUILTINS.call_once(|| {
        if let Err(err) = register_builtin_components(ComponentRegistry::global()) {
            panic!("built-in component registration failed: {err}");
        }
    });
}

#[cfg(test)]
mod tests {
    use sim_component::ComponentKind;

    use super::*;

    #[test]
    fn test_register_builtins_is_idempotent() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry).unwrap();
        let first = registry.len();
        register_builtin_components(&registry).unwrap();
        assert_eq!(registry.len(), first);
        assert_eq!(first, 9);
    }

    #[test]
    fn test_builtin_names_are_namespaced() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry).unwrap();
        assert!(
            registry
                .components()
                .iter()
                .all(|name| name.starts_with("sim.components."))
        );
        assert_eq!(
            <EngineType as ComponentKind>::NAME,
            "sim.components.EngineType"
        );
    }

    #[test]
    fn test_construct_builtin_by_name() {
        let registry = ComponentRegistry::new();
        register_builtin_components(&registry).unwrap();
        let gravity = registry.construct("sim.components.Gravity").unwrap();
        assert_eq!(*gravity.downcast_ref::<Gravity>().unwrap().data(), DVec3::ZERO);
    }

    #[test]
    fn test_ensure_builtins_fills_global_registry() {
        ensure_builtin_components();
        ensure_builtin_components();
        assert!(ComponentRegistry::global().is_registered("sim.components.Pose"));
    }

    #[test]
    fn test_builtins_are_bound_by_declaration() {
        let registry = ComponentRegistry::new();
        registry.register_declared();
        for name in [
            "sim.components.Name",
            "sim.components.EngineType",
            "sim.components.Gravity",
            "sim.components.MagneticField",
            "sim.components.ParentEntity",
            "sim.components.World",
            "sim.components.Model",
            "sim.components.Pose",
            "sim.components.SourceFilePath",
        ] {
            assert!(registry.is_registered(name), "{name} not declared");
        }
        // Already bound, so explicit registration adds nothing.
        let before = registry.len();
        register_builtin_components(&registry).unwrap();
        assert_eq!(registry.len(), before);
    }
}
