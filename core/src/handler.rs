//! Handler queues.

use crate::widget::Widget;
use core::mem;
use std::sync::Arc;

/// A handler that runs once, when its render phase is delivered.
pub type PhaseHandler = Box<dyn FnOnce(&Widget) + Send>;

/// A handler that runs every time its event happens (appear, disappear, layout).
pub type Handler = Arc<dyn Fn(&Widget) + Send + Sync>;

/// One-shot handlers for a single render phase.
///
/// Appending composes "new handler, then everything queued before", so the most recently
/// registered handler runs first.
#[derive(Default)]
pub(crate) struct HandlerQueue {
    handlers: Vec<PhaseHandler>,
}

impl HandlerQueue {
    pub(crate) fn push(&mut self, handler: PhaseHandler) {
        self.handlers.push(handler);
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Empties the queue and returns its handlers in run order.
    pub(crate) fn take(&mut self) -> Vec<PhaseHandler> {
        let mut handlers = mem::take(&mut self.handlers);
        handlers.reverse();
        handlers
    }
}

/// Persistent handlers; same ordering as [`HandlerQueue`], but never emptied.
#[derive(Default)]
pub(crate) struct HandlerList {
    handlers: Vec<Handler>,
}

impl HandlerList {
    pub(crate) fn push(&mut self, handler: Handler) {
        self.handlers.push(handler);
    }

    /// Returns the handlers in run order.
    pub(crate) fn snapshot(&self) -> Vec<Handler> {
        self.handlers.iter().rev().cloned().collect()
    }
}
