use crate::device::DeviceId;
use crate::error::ChannelError;
use crate::event::EventMessage;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use tracing::{trace, warn};

/// Destination for outbound events.
///
/// Implementations must serialize concurrent sends themselves; devices share
/// one channel and may send from several threads.
pub trait EventChannel: Send + Sync {
    fn send(&self, event: &EventMessage) -> Result<(), ChannelError>;
}

/// Receives the events delivered by an [`EventBus`].
///
/// A listener may use the bus it is registered on, including sending events
/// through it.
pub trait EventListener: Send {
    fn on_event(&mut self, event: &EventMessage) -> Result<(), ChannelError>;
}

/// Determines which events a listener wants to receive.
#[derive(Clone, Copy)]
pub enum EventFilter {
    All,
    /// Only events for this action name.
    Action(&'static str),
    Custom(fn(&EventMessage) -> bool),
}

impl fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventFilter::All => f.write_str("All"),
            EventFilter::Action(action) => f.debug_tuple("Action").field(action).finish(),
            EventFilter::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One registration. Shared between the registry and in-flight deliveries,
/// so only the listener itself sits behind its own mutex.
struct ListenerEntry {
    listener: Mutex<Box<dyn EventListener>>,
    enabled: AtomicBool,
    filter: EventFilter,
    tag: Option<DeviceId>, // only events from this device
}

impl ListenerEntry {
    fn wants(&self, event: &EventMessage) -> bool {
        if !self.enabled.load(Ordering::Acquire) {
            return false;
        }
        if let Some(ref wanted_id) = self.tag {
            if event.device_id != *wanted_id {
                return false;
            }
        }
        match self.filter {
            EventFilter::All => true,
            EventFilter::Action(action) => event.action == action,
            EventFilter::Custom(f) => f(event),
        }
    }
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Arc<ListenerEntry>>,
}

/// Thread currently delivering, plus the events its listeners sent meanwhile.
#[derive(Default)]
struct Dispatch {
    thread: Option<ThreadId>,
    pending: VecDeque<EventMessage>,
}

/// In-process [`EventChannel`] fanning events out to listeners.
///
/// Listeners run in registration order on the sending thread. Sends from
/// different threads take turns: one event (and whatever its listeners send)
/// is fully delivered before the next sender starts.
///
/// The listener registry is locked only long enough to copy the current
/// registrations, so listeners can add, remove, toggle or send while they
/// run. An event sent from inside a listener is queued and delivered right
/// after the one being handled; its sender gets `Ok(())` immediately.
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Listeners>,
    turn: Mutex<()>,
    dispatch: Mutex<Dispatch>,
}

// a listener that panicked leaves the guarded data itself intact
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the dispatch state when delivery ends, even by unwinding.
struct DispatchGuard<'a>(&'a Mutex<Dispatch>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut dispatch = lock(self.0);
        dispatch.thread = None;
        dispatch.pending.clear();
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a listener and returns its id; it is enabled right away.
    ///
    /// `tag` limits delivery to events from that device, `filter` applies on top.
    pub fn add_listener(
        &self,
        listener: impl EventListener + 'static,
        filter: EventFilter,
        tag: Option<DeviceId>,
    ) -> u64 {
        let mut listeners = lock(&self.listeners);
        let id = listeners.next_id;
        listeners.entries.insert(
            id,
            Arc::new(ListenerEntry {
                listener: Mutex::new(Box::new(listener)),
                enabled: AtomicBool::new(true),
                filter,
                tag,
            }),
        );
        listeners.next_id += 1;
        id
    }

    /// Resumes delivery to listener `id`. Unknown ids are ignored.
    pub fn enable(&self, id: u64) {
        self.set_enabled(id, true);
    }

    /// Stops delivery to listener `id` while keeping its registration.
    pub fn disable(&self, id: u64) {
        self.set_enabled(id, false);
    }

    fn set_enabled(&self, id: u64, enabled: bool) {
        if let Some(entry) = lock(&self.listeners).entries.get(&id) {
            entry.enabled.store(enabled, Ordering::Release);
        }
    }

    /// Drops listener `id`. A delivery already in progress may still reach it.
    pub fn remove_listener(&self, id: u64) {
        lock(&self.listeners).entries.remove(&id);
    }

    pub fn len(&self) -> usize {
        lock(&self.listeners).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn emit(&self, event: &EventMessage) -> Result<(), ChannelError> {
        let me = thread::current().id();
        {
            let mut dispatch = lock(&self.dispatch);
            if dispatch.thread == Some(me) {
                dispatch.pending.push_back(event.clone());
                trace!(device = %event.device_id, action = %event.action, "event queued by listener");
                return Ok(());
            }
        }

        let _turn = lock(&self.turn);
        lock(&self.dispatch).thread = Some(me);
        let _guard = DispatchGuard(&self.dispatch);

        let result = self.deliver(event);
        loop {
            let next = lock(&self.dispatch).pending.pop_front();
            let Some(next) = next else { break };
            if let Err(err) = self.deliver(&next) {
                warn!(device = %next.device_id, action = %next.action, "queued event failed: {err}");
            }
        }
        result
    }

    /// Delivers to every enabled, matching listener registered at call time.
    ///
    /// A failing listener does not stop delivery; the first failure is returned.
    fn deliver(&self, event: &EventMessage) -> Result<(), ChannelError> {
        let entries: Vec<Arc<ListenerEntry>> =
            lock(&self.listeners).entries.values().cloned().collect();
        let mut result = Ok(());

        for entry in entries.iter().filter(|entry| entry.wants(event)) {
            if let Err(err) = lock(&entry.listener).on_event(event) {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }

        trace!(device = %event.device_id, action = %event.action, "event emitted");
        result
    }
}

impl EventChannel for EventBus {
    fn send(&self, event: &EventMessage) -> Result<(), ChannelError> {
        self.emit(event)
    }
}
