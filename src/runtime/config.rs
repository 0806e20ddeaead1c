//! Runtime configuration.

use crate::dom::ShadowRootMode;

// ---------------------------------------------------------------------------
// HostCapabilities
// ---------------------------------------------------------------------------

/// Platform features the runtime may rely on.
///
/// Turning one off exercises the fallback path an older host would take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// `attachShadow` is available. Without it shadow components render into
    /// light DOM.
    pub shadow_dom: bool,
    /// Shadow roots accept adopted stylesheets. Without it a `<style>` element
    /// is inserted into each shadow root instead.
    pub constructable_stylesheets: bool,
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            shadow_dom: true,
            constructable_stylesheets: true,
        }
    }
}

// ---------------------------------------------------------------------------
// RuntimeConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`Runtime`](super::Runtime).
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Host platform features.
    pub capabilities: HostCapabilities,
    /// Mode for shadow roots of definitions that don't pick one.
    pub default_shadow_mode: ShadowRootMode,
    /// Upper bound on tasks run by one `run_microtasks` call.
    pub max_microtask_rounds: usize,
    /// Keep a drainable log of lifecycle events.
    pub record_lifecycle: bool,
    /// Path of the first history entry.
    pub initial_location: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            capabilities: HostCapabilities::default(),
            default_shadow_mode: ShadowRootMode::Open,
            max_microtask_rounds: 10_000,
            record_lifecycle: false,
            initial_location: "/".to_owned(),
        }
    }
}

impl RuntimeConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host capabilities (builder).
    pub fn with_capabilities(mut self, capabilities: HostCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Toggle shadow DOM support (builder).
    pub fn with_shadow_dom(mut self, supported: bool) -> Self {
        self.capabilities.shadow_dom = supported;
        self
    }

    /// Toggle constructable stylesheet support (builder).
    pub fn with_constructable_stylesheets(mut self, supported: bool) -> Self {
        self.capabilities.constructable_stylesheets = supported;
        self
    }

    /// Set the default shadow root mode (builder).
    pub fn with_default_shadow_mode(mut self, mode: ShadowRootMode) -> Self {
        self.default_shadow_mode = mode;
        self
    }

    /// Set the flush task limit (builder).
    pub fn with_max_microtask_rounds(mut self, rounds: usize) -> Self {
        self.max_microtask_rounds = rounds;
        self
    }

    /// Enable the lifecycle event log (builder).
    pub fn with_lifecycle_log(mut self, record: bool) -> Self {
        self.record_lifecycle = record;
        self
    }

    /// Set the initial history location (builder).
    pub fn with_initial_location(mut self, path: impl Into<String>) -> Self {
        self.initial_location = path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = RuntimeConfig::new();
        assert!(config.capabilities.shadow_dom);
        assert!(config.capabilities.constructable_stylesheets);
        assert_eq!(config.default_shadow_mode, ShadowRootMode::Open);
        assert_eq!(config.max_microtask_rounds, 10_000);
        assert!(!config.record_lifecycle);
        assert_eq!(config.initial_location, "/");
    }

    #[test]
    fn builder_chain() {
        let config = RuntimeConfig::new()
            .with_shadow_dom(false)
            .with_constructable_stylesheets(false)
            .with_default_shadow_mode(ShadowRootMode::Closed)
            .with_max_microtask_rounds(8)
            .with_lifecycle_log(true)
            .with_initial_location("/home");
        assert_eq!(
            config.capabilities,
            HostCapabilities {
                shadow_dom: false,
                constructable_stylesheets: false
            }
        );
        assert_eq!(config.default_shadow_mode, ShadowRootMode::Closed);
        assert_eq!(config.max_microtask_rounds, 8);
        assert!(config.record_lifecycle);
        assert_eq!(config.initial_location, "/home");
    }
}
