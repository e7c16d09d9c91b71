use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::trace;

use super::domain::{AuthEvent, AuthEventKind};

type Listener = Arc<dyn Fn(&AuthEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: HashMap<AuthEventKind, Vec<(u64, Listener)>>,
}

/// Synchronous broadcast of auth lifecycle events.
///
/// `emit` delivers to the listeners registered at the moment of emission;
/// the registry lock is released before any callback runs, so listeners
/// may subscribe, unsubscribe or call back into the session manager.
#[derive(Clone, Default)]
pub struct AuthEventBus {
    registry: Arc<Mutex<Registry>>,
}

impl AuthEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: AuthEventKind, callback: F) -> Subscription
    where
        F: Fn(&AuthEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.entry(kind).or_default().push((id, Arc::new(callback)));
        trace!(%kind, id, "auth listener registered");
        Subscription { registry: Arc::downgrade(&self.registry), kind, id, active: true }
    }

    /// Deliver `event` to every current listener of its kind; returns how many ran.
    pub fn emit(&self, event: &AuthEvent) -> usize {
        let snapshot: Vec<Listener> = {
            let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .listeners
                .get(&event.kind)
                .map(|ls| ls.iter().map(|(_, l)| Arc::clone(l)).collect())
                .unwrap_or_default()
        };
        for listener in &snapshot {
            listener(event);
        }
        trace!(kind = %event.kind, delivered = snapshot.len(), "auth event emitted");
        snapshot.len()
    }

    pub fn listener_count(&self, kind: AuthEventKind) -> usize {
        let registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.listeners.get(&kind).map_or(0, Vec::len)
    }
}

/// Handle to a registered listener. Dropping it unregisters the listener.
#[must_use = "dropping a Subscription unregisters the listener immediately"]
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    kind: AuthEventKind,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn kind(&self) -> AuthEventKind {
        self.kind
    }

    pub fn unsubscribe(mut self) {
        self.remove();
    }

    /// Keep the listener registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.active = false;
    }

    fn remove(&mut self) {
        if !std::mem::replace(&mut self.active, false) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(listeners) = registry.listeners.get_mut(&self.kind) {
                listeners.retain(|(id, _)| *id != self.id);
            }
            trace!(kind = %self.kind, id = self.id, "auth listener removed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}
