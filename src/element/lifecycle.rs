//! Element lifecycle: per-instance state machine and the lifecycle event log.
//!
//! Each instance moves `Constructed → Connected ⇄ Disconnected`. The
//! `mounted` flag records that one-time setup (shadow root, styles, initial
//! render) already happened, so later connections only re-run the hook.
//!
//! The [`LifecycleLog`] accumulates [`LifecycleEvent`]s that can be drained
//! for inspection when the runtime is configured to record them.

use std::fmt;

use crate::dom::node::NodeId;

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where an instance is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    Constructed,
    Connected,
    Disconnected,
}

/// What a connect transition requires of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    /// First connection: run one-time setup and the initial render.
    FirstMount,
    /// Connected again after a disconnect: hook only.
    Reconnect,
    /// Already connected: nothing to do.
    AlreadyConnected,
}

/// Per-instance lifecycle state.
#[derive(Debug, Clone)]
pub struct Lifecycle {
    phase: LifecyclePhase,
    mounted: bool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: LifecyclePhase::Constructed,
            mounted: false,
        }
    }

    /// Transition to `Connected`.
    pub fn connect(&mut self) -> ConnectOutcome {
        if self.phase == LifecyclePhase::Connected {
            return ConnectOutcome::AlreadyConnected;
        }
        self.phase = LifecyclePhase::Connected;
        if self.mounted {
            ConnectOutcome::Reconnect
        } else {
            self.mounted = true;
            ConnectOutcome::FirstMount
        }
    }

    /// Transition to `Disconnected`. Returns `false` if the instance was not connected.
    pub fn disconnect(&mut self) -> bool {
        if self.phase != LifecyclePhase::Connected {
            return false;
        }
        self.phase = LifecyclePhase::Disconnected;
        true
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn is_connected(&self) -> bool {
        self.phase == LifecyclePhase::Connected
    }

    /// Whether one-time setup already ran.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// The user hook or runtime step an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Connected,
    Disconnected,
    AttributeChanged,
    Render,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookPhase::Connected => "connected",
            HookPhase::Disconnected => "disconnected",
            HookPhase::AttributeChanged => "attribute changed",
            HookPhase::Render => "render",
        })
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent / LifecycleLog
// ---------------------------------------------------------------------------

/// Observable lifecycle steps, keyed by host element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The component was constructed (or upgraded) for this host.
    Constructed { host: NodeId },
    /// One-time setup ran.
    Mounted { host: NodeId },
    /// The `connected` hook ran.
    Connected { host: NodeId },
    /// The render function ran and its output was committed.
    Rendered { host: NodeId },
    /// The `disconnected` hook ran.
    Disconnected { host: NodeId },
    /// The host node was destroyed and the instance dropped.
    Destroyed { host: NodeId },
}

/// Accumulates lifecycle events when enabled.
#[derive(Debug, Default)]
pub struct LifecycleLog {
    enabled: bool,
    pending: Vec<LifecycleEvent>,
}

impl LifecycleLog {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            pending: Vec::new(),
        }
    }

    /// Record an event. No-op when disabled.
    pub fn record(&mut self, event: LifecycleEvent) {
        if self.enabled {
            self.pending.push(event);
        }
    }

    /// Drain and return all pending lifecycle events.
    pub fn take(&mut self) -> Vec<LifecycleEvent> {
        std::mem::take(&mut self.pending)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}
