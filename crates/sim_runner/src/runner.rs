//! Simulation step loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use sim_component::Entity;
use sim_ecm::components::{EngineType, Gravity, MagneticField, Name, World as WorldMarker};
use sim_ecm::{EntityComponentManager, World};
use sim_events::{Connection, EventManager};
use tracing::{debug, info, warn};

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::events::{Pause, PostStep, PreStep, SceneUpdate, Stop};
use crate::system::{System, UpdateInfo};

/// A simulation session.
///
/// Owns the entity-component manager, the event manager and the registered
/// systems, and advances simulated time one fixed step at a time.
pub struct SimulationRunner {
    config: RunnerConfig,
    ecm: EntityComponentManager,
    events: EventManager,
    systems: Vec<Box<dyn System>>,
    world: Entity,
    info: UpdateInfo,
    paused: Rc<Cell<bool>>,
    stop_requested: Rc<Cell<bool>>,
    _connections: Vec<Connection>,
}

impl SimulationRunner {
    /// Create a session and its world entity.
    ///
    /// The world carries the world marker, its name, gravity, magnetic field
    /// and engine type from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ZeroStepSize`] for a zero step size, or
    /// [`RunnerError::Ecm`] if the world entity cannot be built.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        if config.step_size.is_zero() {
            return Err(RunnerError::ZeroStepSize);
        }

        let mut ecm = EntityComponentManager::new();
        let world = ecm.create_entity();
        ecm.create_component(world, WorldMarker::default())?;
        ecm.create_component(world, Name::new(config.world_name.clone()))?;
        ecm.create_component(world, Gravity::new(config.gravity))?;
        ecm.create_component(world, MagneticField::new(config.magnetic_field))?;
        ecm.create_component(world, EngineType::new(config.physics_engine.clone()))?;

        let events = EventManager::new();
        let paused = Rc::new(Cell::new(false));
        let stop_requested = Rc::new(Cell::new(false));
        let connections = vec![
            events.connect({
                let paused = Rc::clone(&paused);
                move |event: &Pause| paused.set(event.0)
            }),
            events.connect({
                let stop_requested = Rc::clone(&stop_requested);
                move |_: &Stop| stop_requested.set(true)
            }),
        ];

        info!(
            world = %config.world_name,
            %world,
            engine = %config.physics_engine,
            "simulation session created"
        );

        Ok(Self {
            config,
            ecm,
            events,
            systems: Vec::new(),
            world,
            info: UpdateInfo::default(),
            paused,
            stop_requested,
            _connections: connections,
        })
    }

    /// Returns the configuration the runner was built with.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Returns a reference to the entity-component manager.
    #[must_use]
    pub fn ecm(&self) -> &EntityComponentManager {
        &self.ecm
    }

    /// Returns a mutable reference to the entity-component manager.
    pub fn ecm_mut(&mut self) -> &mut EntityComponentManager {
        &mut self.ecm
    }

    /// Returns the event manager systems subscribe through.
    #[must_use]
    pub fn events(&self) -> &EventManager {
        &self.events
    }

    /// Returns the root entity of the world.
    #[must_use]
    pub fn world_entity(&self) -> Entity {
        self.world
    }

    /// Read-only view of the session's world.
    #[must_use]
    pub fn world(&self) -> World<'_> {
        World::new(self.world, &self.ecm)
    }

    /// Timing of the most recent step.
    #[must_use]
    pub fn update_info(&self) -> UpdateInfo {
        self.info
    }

    /// Returns the number of unpaused steps run so far.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.info.iterations
    }

    /// Returns `true` while the session is paused.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    /// Pause or resume through the event manager, so other subscribers see it.
    pub fn set_paused(&self, paused: bool) {
        self.events.emit(&Pause(paused));
    }

    /// Make the current or next [`run`](Self::run) return after its step.
    pub fn request_stop(&self) {
        self.events.emit(&Stop);
    }

    /// Register a system and run its `configure` hook.
    pub fn add_system(&mut self, mut system: Box<dyn System>) {
        system.configure(self.world, &mut self.ecm, &self.events);
        info!(system = system.name(), "system added");
        self.systems.push(system);
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    /// Run one step and return its timing.
    pub fn step(&mut self) -> UpdateInfo {
        let removed = self.ecm.process_remove_entity_requests();

        let paused = self.paused.get();
        if paused {
            self.info.dt = Duration::ZERO;
        } else {
            self.info.iterations += 1;
            self.info.sim_time += self.config.step_size;
            self.info.dt = self.config.step_size;
        }
        self.info.paused = paused;
        let info = self.info;

        debug!(
            iterations = info.iterations,
            sim_time_ms = info.sim_time.as_millis() as u64,
            paused,
            removed,
            "step start"
        );

        self.events.emit(&PreStep(info));
        for system in &mut self.systems {
            system.pre_update(&info, &mut self.ecm);
        }
        if !paused {
            for system in &mut self.systems {
                system.update(&info, &mut self.ecm);
            }
        }
        for system in &mut self.systems {
            system.post_update(&info, &self.ecm);
        }
        self.events.emit(&PostStep(info));

        let created = self.ecm.new_entities().count();
        if created > 0 || removed > 0 {
            self.events.emit(&SceneUpdate { created, removed });
        }

        self.ecm.clear_step_changes();
        info
    }

    /// Step until `max_iterations` unpaused steps have run or a [`Stop`]
    /// event arrives. Returns the number of steps taken by this call.
    ///
    /// With `max_iterations == 0` only a [`Stop`] ends the loop. A paused
    /// session does not advance its iteration count.
    pub fn run(&mut self) -> u64 {
        let step_budget = self.config.step_size;
        let mut steps = 0u64;

        info!(
            world = %self.config.world_name,
            step_ms = step_budget.as_secs_f64() * 1000.0,
            max_iterations = self.config.max_iterations,
            real_time = self.config.real_time,
            "simulation starting"
        );

        loop {
            if self.stop_requested.get() {
                info!(iterations = self.info.iterations, "stop requested");
                break;
            }
            if self.config.max_iterations > 0 && self.info.iterations >= self.config.max_iterations
            {
                break;
            }

            let start = Instant::now();
            self.step();
            steps += 1;

            if self.config.real_time {
                let elapsed = start.elapsed();
                if elapsed < step_budget {
                    std::thread::sleep(step_budget - elapsed);
                } else {
                    warn!(
                        iterations = self.info.iterations,
                        elapsed_us = elapsed.as_micros() as u64,
                        budget_us = step_budget.as_micros() as u64,
                        "step exceeded real-time budget"
                    );
                }
            }
        }
        self.stop_requested.set(false);

        info!(
            steps,
            iterations = self.info.iterations,
            sim_time_s = self.info.sim_time.as_secs_f64(),
            "simulation stopped"
        );
        steps
    }
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("config", &self.config)
            .field("world", &self.world)
            .field("info", &self.info)
            .field("systems", &self.systems.len())
            .field("entities", &self.ecm.entity_count())
            .finish()
    }
}
