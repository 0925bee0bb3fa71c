//! # sim_runner
//!
//! Owns a simulation session: the [`EntityComponentManager`], the
//! [`EventManager`] and the [`System`]s that advance the world.
//!
//! ## Step Lifecycle
//!
//! 1. Apply deferred entity removals.
//! 2. Emit [`events::PreStep`], then run every system's `pre_update`.
//! 3. Run `update` (skipped while paused).
//! 4. Run `post_update`, then emit [`events::PostStep`] and, if the scene
//!    changed, [`events::SceneUpdate`].
//! 5. Clear the step's change set (new/removed entities and components,
//!    changed flags).
//!
//! [`EntityComponentManager`]: sim_ecm::EntityComponentManager
//! [`EventManager`]: sim_events::EventManager

pub mod config;
pub mod error;
pub mod events;
pub mod runner;
pub mod system;

pub use config::RunnerConfig;
pub use error::RunnerError;
pub use runner::SimulationRunner;
pub use system::{System, UpdateInfo};
