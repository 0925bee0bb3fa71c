//! The [`EventManager`] and its connection handles.
//!
//! Subscriptions are keyed by the Rust type of the event payload. Emission is
//! synchronous: every live handler for the type runs, in connection order,
//! before [`EventManager::emit`] returns.
//!
//! ## Re-entrancy
//! `emit` snapshots the subscriber list and releases its borrow before calling
//! any handler, so handlers may emit further events, connect new handlers, or
//! drop connections. A handler disconnected by an earlier handler in the same
//! emission is skipped. Handlers connected during an emission first run on the
//! next one.
//!
//! ## Lifetime
//! The manager owns the subscriber lists. A [`Connection`] only holds a weak
//! reference, so disconnecting after the manager has been dropped is a no-op.

use std::any::{Any, TypeId, type_name};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

type Handler = Rc<dyn Fn(&dyn Any)>;

struct Slot {
    id: u64,
    live: Rc<Cell<bool>>,
    handler: Handler,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    by_event: HashMap<TypeId, Vec<Slot>>,
}

impl Subscribers {
    fn remove(&mut self, event: TypeId, id: u64) -> Option<Slot> {
        let slots = self.by_event.get_mut(&event)?;
        let pos = slots.iter().position(|slot| slot.id == id)?;
        let slot = slots.remove(pos);
        if slots.is_empty() {
            self.by_event.remove(&event);
        }
        Some(slot)
    }
}

fn emit_to<E: 'static>(subscribers: &RefCell<Subscribers>, event: &E) -> usize {
    let snapshot: Vec<(Rc<Cell<bool>>, Handler)> = subscribers
        .borrow()
        .by_event
        .get(&TypeId::of::<E>())
        .map(|slots| {
            slots
                .iter()
                .map(|slot| (Rc::clone(&slot.live), Rc::clone(&slot.handler)))
                .collect()
        })
        .unwrap_or_default();

    let mut invoked = 0;
    for (live, handler) in snapshot {
        if live.get() {
            handler(event as &dyn Any);
            invoked += 1;
        }
    }
    trace!(event = type_name::<E>(), invoked, "emitted event");
    invoked
}

/// Process-local publish/subscribe hub, owned by the simulation session.
pub struct EventManager {
    subscribers: Rc<RefCell<Subscribers>>,
}

impl EventManager {
    /// Create a manager with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Rc::new(RefCell::new(Subscribers::default())),
        }
    }

    /// Subscribe `handler` to events of type `E`.
    ///
    /// The subscription lasts as long as the returned [`Connection`]; dropping
    /// it disconnects the handler.
    #[must_use = "dropping the connection disconnects the handler"]
    pub fn connect<E, F>(&self, handler: F) -> Connection
    where
        E: 'static,
        F: Fn(&E) + 'static,
    {
        let live = Rc::new(Cell::new(true));
        let handler: Handler = Rc::new(move |event: &dyn Any| {
            if let Some(event) = event.downcast_ref::<E>() {
                handler(event);
            }
        });

        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.next_id += 1;
        let id = subscribers.next_id;
        let slots = subscribers.by_event.entry(TypeId::of::<E>()).or_default();
        slots.retain(|slot| slot.live.get());
        slots.push(Slot {
            id,
            live: Rc::clone(&live),
            handler,
        });
        drop(subscribers);
        trace!(event = type_name::<E>(), id, "connected handler");

        Connection {
            id,
            event: TypeId::of::<E>(),
            event_name: type_name::<E>(),
            live,
            manager: Rc::downgrade(&self.subscribers),
        }
    }

    /// Deliver `event` to every live handler connected for `E`, in connection
    /// order. Returns the number of handlers invoked.
    pub fn emit<E: 'static>(&self, event: &E) -> usize {
        emit_to(&self.subscribers, event)
    }

    /// Disconnect a handler. Returns `true` if it was still connected to this manager.
    pub fn disconnect(&self, connection: &Connection) -> bool {
        if !Weak::ptr_eq(&connection.manager, &Rc::downgrade(&self.subscribers)) {
            return false;
        }
        connection.release()
    }

    /// Returns the number of live handlers connected for `E`.
    #[must_use]
    pub fn connection_count<E: 'static>(&self) -> usize {
        self.subscribers
            .borrow()
            .by_event
            .get(&TypeId::of::<E>())
            .map_or(0, |slots| slots.iter().filter(|s| s.live.get()).count())
    }

    /// A weak emitter that handlers can capture to raise further events
    /// without keeping the manager alive.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            subscribers: Rc::downgrade(&self.subscribers),
        }
    }
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.subscribers.borrow();
        f.debug_struct("EventManager")
            .field("event_types", &subscribers.by_event.len())
            .field(
                "handlers",
                &subscribers.by_event.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}

/// Handle to one subscription. Dropping it disconnects the handler.
pub struct Connection {
    id: u64,
    event: TypeId,
    event_name: &'static str,
    live: Rc<Cell<bool>>,
    manager: Weak<RefCell<Subscribers>>,
}

impl Connection {
    /// Disconnect explicitly. Returns `true` if the handler was still connected.
    pub fn disconnect(self) -> bool {
        self.release()
    }

    /// Returns `true` while the handler is connected to a live manager.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.live.get() && self.manager.strong_count() > 0
    }

    /// Name of the event type this handler listens to.
    #[must_use]
    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    fn release(&self) -> bool {
        if !self.live.replace(false) {
            return false;
        }
        let Some(subscribers) = self.manager.upgrade() else {
            return false;
        };
        // The list is borrowed while a dead slot is being purged; the slot is
        // already marked dead, so the next `connect` sweeps it.
        let removed = match subscribers.try_borrow_mut() {
            Ok(mut subscribers) => subscribers.remove(self.event, self.id),
            Err(_) => None,
        };
        // Run the handler's destructor outside the borrow.
        drop(removed);
        trace!(event = self.event_name, id = self.id, "disconnected handler");
        true
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("event", &self.event_name)
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Weak emitter obtained from [`EventManager::sender`].
#[derive(Clone)]
pub struct EventSender {
    subscribers: Weak<RefCell<Subscribers>>,
}

impl EventSender {
    /// Emit through the originating manager. Returns `None` if it has been dropped.
    pub fn emit<E: 'static>(&self, event: &E) -> Option<usize> {
        let subscribers = self.subscribers.upgrade()?;
        Some(emit_to(&subscribers, event))
    }
}

impl fmt::Debug for EventSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("alive", &(self.subscribers.strong_count() > 0))
            .finish()
    }
}
