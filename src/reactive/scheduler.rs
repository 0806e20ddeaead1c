//! Microtask queue and render schedule tokens.
//!
//! Field writes never render synchronously. They mark the instance dirty and
//! enqueue a [`Microtask::Render`] carrying a [`RenderScheduleToken`]. The
//! instance keeps the token it is waiting on; later writes in the same turn
//! see the outstanding token and do nothing more. Cancelling clears the
//! instance's slot, so when the queued token comes up it no longer matches and
//! is skipped.
//!
//! Arbitrary callbacks share the same FIFO queue, so a callback queued after a
//! write observes the render that write caused.

use std::collections::VecDeque;
use std::fmt;

use crate::element::instance::InstanceId;
use crate::runtime::Runtime;

/// A queued render for one instance at one scheduling generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderScheduleToken {
    pub(crate) instance: InstanceId,
    pub(crate) generation: u64,
}

impl RenderScheduleToken {
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A callback run by the flush loop.
pub type MicrotaskCallback = Box<dyn FnOnce(&mut Runtime)>;

/// One unit of deferred work.
pub enum Microtask {
    Render(RenderScheduleToken),
    Callback(MicrotaskCallback),
}

impl fmt::Debug for Microtask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Microtask::Render(token) => f.debug_tuple("Render").field(token).finish(),
            Microtask::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// FIFO microtask queue.
#[derive(Debug, Default)]
pub struct RenderScheduler {
    queue: VecDeque<Microtask>,
    generation: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token for `instance` and enqueue its render.
    pub fn schedule(&mut self, instance: InstanceId) -> RenderScheduleToken {
        self.generation += 1;
        let token = RenderScheduleToken {
            instance,
            generation: self.generation,
        };
        tracing::trace!(?instance, generation = token.generation, "render scheduled");
        self.queue.push_back(Microtask::Render(token));
        token
    }

    /// Enqueue an arbitrary callback.
    pub fn queue_microtask(&mut self, callback: impl FnOnce(&mut Runtime) + 'static) {
        self.queue.push_back(Microtask::Callback(Box::new(callback)));
    }

    /// Dequeue the next task.
    pub fn pop(&mut self) -> Option<Microtask> {
        self.queue.pop_front()
    }

    /// Drop every queued task, returning how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Number of queued tasks, stale render tokens included.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
