//! Single-subscriber callback slots

use parking_lot::Mutex;
use peerlink_connector::Callback;
use tracing::trace;

/// Holds at most one callback for one event type
///
/// Registering replaces the previous callback, `None` clears the slot and
/// events raised while the slot is empty are dropped. The callback is
/// cloned out of the lock before it runs, so it may replace itself.
pub(crate) struct CallbackSlot<E> {
    name: &'static str,
    callback: Mutex<Option<Callback<E>>>,
}

impl<E> CallbackSlot<E> {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            callback: Mutex::new(None),
        }
    }

    pub(crate) fn set(&self, callback: Option<Callback<E>>) {
        trace!(slot = self.name, registered = callback.is_some(), "callback slot updated");
        *self.callback.lock() = callback;
    }

    /// Register `callback` only if the slot is empty
    ///
    /// Returns false when a callback was already registered.
    pub(crate) fn set_if_vacant(&self, callback: Callback<E>) -> bool {
        let mut slot = self.callback.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(callback);
        true
    }

    pub(crate) fn is_set(&self) -> bool {
        self.callback.lock().is_some()
    }

    /// Invoke the registered callback; returns false if the event was dropped
    pub(crate) fn emit(&self, event: E) -> bool {
        let callback = self.callback.lock().clone();
        match callback {
            Some(callback) => {
                callback(event);
                true
            }
            None => {
                trace!(slot = self.name, "no callback registered, event dropped");
                false
            }
        }
    }
}
