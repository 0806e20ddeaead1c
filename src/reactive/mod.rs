//! Reactive scheduling: the microtask queue that coalesces field writes into
//! one render per instance per turn.
//!
//! - [`RenderScheduler`] — FIFO queue of renders and callbacks.
//! - [`RenderScheduleToken`] — identifies one queued render.

pub mod scheduler;

pub use scheduler::{Microtask, MicrotaskCallback, RenderScheduleToken, RenderScheduler};
