//! # sim_events
//!
//! In-process publish/subscribe used to decouple simulation subsystems
//! (physics, rendering, scripting bindings) from one another.
//!
//! - [`EventManager`]: typed `connect` / `emit` / `disconnect`.
//! - [`Connection`]: RAII subscription handle holding a weak reference to
//!   its manager; dropping it disconnects the handler.
//! - [`EventSender`]: weak emitter for re-entrant emission from handlers.
//!
//! Any `'static` value type can be an event. Emission is synchronous and
//! single-threaded, and the manager is `!Send`.

pub mod manager;

pub use manager::{Connection, EventManager, EventSender};
