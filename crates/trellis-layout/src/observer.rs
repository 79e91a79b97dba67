//! Typed observer sets.
//!
//! Each notification a container emits has its own [`Observers`] set.
//! Handlers run synchronously, in connection order, while the mutation that
//! caused the notification is being applied.

use std::fmt;

/// Identifies a connected handler so it can be disconnected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Handler<E> = Box<dyn FnMut(&E)>;

/// A set of handlers for one notification carrying an `E`.
pub struct Observers<E> {
    handlers: Vec<(ObserverId, Handler<E>)>,
    next_id: u64,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
            next_id: 1,
        }
    }
}

impl<E> fmt::Debug for Observers<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

impl<E> Observers<E> {
    /// Register a handler.
    pub fn connect<F>(&mut self, handler: F) -> ObserverId
    where
        F: FnMut(&E) + 'static,
    {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Remove a handler. Returns `false` if it was not connected.
    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        self.handlers.len() != before
    }

    /// Number of connected handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke every handler with `event`.
    pub fn emit(&mut self, event: &E) {
        for (_, handler) in &mut self.handlers {
            handler(event);
        }
    }

    /// Take the handlers out, leaving the set empty. Used when the owner
    /// must release a borrow before handlers run.
    pub(crate) fn take(&mut self) -> Self {
        Self {
            handlers: std::mem::take(&mut self.handlers),
            next_id: self.next_id,
        }
    }

    /// Put back handlers taken with [`Observers::take`], keeping any that
    /// were connected meanwhile.
    pub(crate) fn restore(&mut self, mut taken: Self) {
        taken.handlers.append(&mut self.handlers);
        self.handlers = taken.handlers;
        self.next_id = self.next_id.max(taken.next_id);
    }
}
