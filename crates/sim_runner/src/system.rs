//! The system interface driven by the runner.

use std::time::Duration;

use sim_component::Entity;
use sim_ecm::EntityComponentManager;
use sim_events::EventManager;

/// Timing information passed to every system hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateInfo {
    /// Number of unpaused steps taken so far, including the current one.
    pub iterations: u64,
    /// Simulated time at the end of the current step.
    pub sim_time: Duration,
    /// Simulated time advanced by the current step; zero while paused.
    pub dt: Duration,
    pub paused: bool,
}

/// A unit of simulation logic.
///
/// Every hook has an empty default so a system implements only the phases it
/// needs. Hooks run in registration order within each phase.
pub trait System {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Called once when the system is added to a runner.
    ///
    /// Systems that need to emit events later can keep
    /// [`EventManager::sender`].
    fn configure(
        &mut self,
        _world: Entity,
        _ecm: &mut EntityComponentManager,
        _events: &EventManager,
    ) {
    }

    /// Prepare for the step: apply commands, create or remove entities.
    fn pre_update(&mut self, _info: &UpdateInfo, _ecm: &mut EntityComponentManager) {}

    /// Advance the simulation state. Skipped while paused.
    fn update(&mut self, _info: &UpdateInfo, _ecm: &mut EntityComponentManager) {}

    /// Observe the results of the step.
    fn post_update(&mut self, _info: &UpdateInfo, _ecm: &EntityComponentManager) {}
}
