//! # sim_runner
//!
//! Demo session: a world with two models, one of which is removed halfway
//! through the run. A small observer system logs scene changes.

use anyhow::Result;
use sim_component::Entity;
use sim_ecm::{EcmError, EntityComponentManager};
use sim_ecm::components::{Model, Name, Pose};
use sim_ecm::util::scoped_name;
use sim_events::{EventManager, EventSender};
use sim_math::{DVec3, Pose3};
use sim_runner::events::Stop;
use sim_runner::{RunnerConfig, SimulationRunner, System, UpdateInfo};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const ITERATIONS: u64 = 1000;

/// Spawns the demo models and removes the first one at the halfway point.
struct Scene {
    models: Vec<Entity>,
    sender: Option<EventSender>,
}

impl System for Scene {
    fn name(&self) -> &str {
        "scene"
    }

    fn configure(&mut self, world: Entity, ecm: &mut EntityComponentManager, events: &EventManager) {
        for (name, x) in [("box", 0.0), ("sphere", 2.0)] {
            match place_model(ecm, world, name, DVec3::new(x, 0.0, 0.5)) {
                Ok(model) => self.models.push(model),
                Err(err) => error!(%err, model = name, "failed to place model"),
            }
        }
        self.sender = Some(events.sender());
    }

    fn pre_update(&mut self, info: &UpdateInfo, ecm: &mut EntityComponentManager) {
        if info.iterations != ITERATIONS / 2 {
            return;
        }
        if let Some(first) = self.models.first() {
            ecm.request_remove_entity_recursive(*first);
        }
    }

    fn post_update(&mut self, info: &UpdateInfo, ecm: &EntityComponentManager) {
        for (entity, _) in ecm.each_new::<Model>() {
            info!(
                model = %scoped_name(ecm, entity, "::"),
                iterations = info.iterations,
                "model added"
            );
        }
        for (entity, _) in ecm.each_removed::<Model>() {
            info!(%entity, iterations = info.iterations, "model removed");
        }
        if let Some(sender) = self.sender.as_ref().filter(|_| info.iterations >= ITERATIONS) {
            sender.emit(&Stop);
        }
    }
}

fn place_model(
    ecm: &mut EntityComponentManager,
    world: Entity,
    name: &str,
    position: DVec3,
) -> Result<Entity, EcmError> {
    let model = ecm.create_entity();
    ecm.create_component(model, Model::default())?;
    ecm.create_component(model, Name::new(name.to_string()))?;
    ecm.create_component(model, Pose::new(Pose3::from_position(position)))?;
    ecm.set_parent_entity(model, world)?;
    Ok(model)
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("sim_runner=info".parse()?))
        .init();

    let config = RunnerConfig::default()
        .with_world_name("shapes")
        .with_max_iterations(ITERATIONS * 2);

    let mut runner = SimulationRunner::new(config)?;
    runner.add_system(Box::new(Scene {
        models: Vec::new(),
        sender: None,
    }));

    let steps = runner.run();

    let world = runner.world();
    info!(
        steps,
        world = world.name().unwrap_or_default(),
        models = world.model_count(),
        gravity = ?world.gravity(),
        "session finished"
    );
    Ok(())
}
