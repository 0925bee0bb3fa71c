//! Events emitted or consumed by the runner.

use crate::system::UpdateInfo;

/// Emitted before the systems' `pre_update` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreStep(pub UpdateInfo);

/// Emitted after the systems' `post_update` phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostStep(pub UpdateInfo);

/// Pause (`true`) or resume (`false`) the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause(pub bool);

/// Ask a running [`run`](crate::SimulationRunner::run) loop to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stop;

/// Emitted at the end of a step in which entities were created or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneUpdate {
    pub created: usize,
    pub removed: usize,
}
