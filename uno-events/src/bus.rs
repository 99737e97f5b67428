//! Event bus implementation

use crate::error::{EventBusError, ListenerResult};
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use uno_log::{debug, trace};

/// A listener attached to an event name.
pub type Listener = Arc<dyn Fn(&EventArgs<'_>) -> ListenerResult + Send + Sync>;

/// Positional arguments handed to every listener of one emission.
pub struct EventArgs<'a> {
    event: &'a str,
    args: &'a [&'a dyn Any],
}

impl<'a> EventArgs<'a> {
    pub fn new(event: &'a str, args: &'a [&'a dyn Any]) -> Self {
        Self { event, args }
    }

    /// Name of the event being emitted.
    pub fn event(&self) -> &str {
        self.event
    }

    /// Argument at `index`, if present and of type `T`.
    pub fn get<T: Any>(&self, index: usize) -> Option<&'a T> {
        self.args.get(index).and_then(|arg| arg.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

/// Name → ordered listeners registry.
///
/// Cloning is cheap and clones share the same listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<DashMap<String, Vec<Listener>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `event`.
    pub fn on<F>(&self, event: &str, listener: F)
    where
        F: Fn(&EventArgs<'_>) -> ListenerResult + Send + Sync + 'static,
    {
        let mut entry = self.listeners.entry(event.to_string()).or_default();
        entry.push(Arc::new(listener));
        debug!(
            target: "uno::events",
            "listener #{} attached to '{}'",
            entry.len() - 1,
            event
        );
    }

    /// Invoke every listener of `event` in attachment order.
    ///
    /// Stops at the first failing listener. Listeners may attach further
    /// listeners; those only run on later emissions.
    pub fn emit(&self, event: &str, args: &[&dyn Any]) -> Result<(), EventBusError> {
        // Snapshot so listeners can call `on` without holding the shard lock.
        let listeners: Vec<Listener> = match self.listeners.get(event) {
            Some(entry) => entry.value().clone(),
            None => {
                trace!(target: "uno::events", "no listeners for '{}'", event);
                return Ok(());
            }
        };

        trace!(
            target: "uno::events",
            "emitting '{}' to {} listener(s)",
            event,
            listeners.len()
        );

        let event_args = EventArgs::new(event, args);
        for (index, listener) in listeners.iter().enumerate() {
            listener(&event_args).map_err(|source| EventBusError::ListenerFailed {
                event: event.to_string(),
                index,
                source,
            })?;
        }

        Ok(())
    }

    /// Number of listeners attached to `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|l| l.len()).unwrap_or(0)
    }

    /// Names that have at least one listener.
    pub fn events(&self) -> Vec<String> {
        self.listeners.iter().map(|e| e.key().clone()).collect()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.events())
            .finish()
    }
}
