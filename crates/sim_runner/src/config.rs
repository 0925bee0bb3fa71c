//! Runner configuration.

use std::time::Duration;

use sim_math::DVec3;

/// Configuration for a [`SimulationRunner`](crate::SimulationRunner).
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// Simulated time advanced by one step.
    pub step_size: Duration,
    /// Maximum number of unpaused iterations to run (0 = unlimited).
    pub max_iterations: u64,
    /// Pace [`run`](crate::SimulationRunner::run) to wall-clock time.
    pub real_time: bool,
    /// Name given to the world entity.
    pub world_name: String,
    /// Gravity of the world, in m/s².
    pub gravity: DVec3,
    /// Magnetic field of the world, in tesla.
    pub magnetic_field: DVec3,
    /// Physics engine recorded on the world entity.
    pub physics_engine: String,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            step_size: Duration::from_millis(1),
            max_iterations: 0,
            real_time: true,
            world_name: "default".to_string(),
            gravity: DVec3::new(0.0, 0.0, -9.8),
            magnetic_field: DVec3::new(5.5645e-6, 22.8758e-6, -42.3884e-6),
            physics_engine: "ode".to_string(),
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn with_step_size(mut self, step_size: Duration) -> Self {
        self.step_size = step_size;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    #[must_use]
    pub fn with_real_time(mut self, real_time: bool) -> Self {
        self.real_time = real_time;
        self
    }

    #[must_use]
    pub fn with_world_name(mut self, name: impl Into<String>) -> Self {
        self.world_name = name.into();
        self
    }

    #[must_use]
    pub fn with_gravity(mut self, gravity: DVec3) -> Self {
        self.gravity = gravity;
        self
    }

    #[must_use]
    pub fn with_magnetic_field(mut self, field: DVec3) -> Self {
        self.magnetic_field = field;
        self
    }

    #[must_use]
    pub fn with_physics_engine(mut self, engine: impl Into<String>) -> Self {
        self.physics_engine = engine.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.step_size, Duration::from_millis(1));
        assert_eq!(config.max_iterations, 0);
        assert_eq!(config.physics_engine, "ode");
        assert_eq!(config.gravity.z, -9.8);
    }

    #[test]
    fn test_builder_overrides() {
        let config = RunnerConfig::default()
            .with_world_name("shapes")
            .with_max_iterations(10)
            .with_real_time(false)
            .with_physics_engine("dart");
        assert_eq!(config.world_name, "shapes");
        assert_eq!(config.max_iterations, 10);
        assert!(!config.real_time);
        assert_eq!(config.physics_engine, "dart");
    }
}
