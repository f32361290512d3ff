//! Application state management

use crate::config::GateConfig;
use crate::forwarding::UpstreamProxy;
use crate::gate::AccessPolicy;
use bezs_core::SessionProvider;
use std::sync::Arc;

/// Shared application state
///
/// Built once at startup and cloned into every handler and middleware. The
/// session provider and the upstream client live here instead of in
/// process-wide globals.
#[derive(Clone)]
pub struct AppState {
    /// Route rules the gate applies
    pub policy: Arc<AccessPolicy>,
    /// Source of sessions, consulted on every gated request
    pub sessions: Arc<dyn SessionProvider>,
    /// Gate behavior (session timeout, public origin)
    pub gate: Arc<GateConfig>,
    /// Proxy to the upstream web application, if one is configured
    pub upstream: Option<Arc<UpstreamProxy>>,
}

impl AppState {
    /// Create a new AppState with default gate settings and no upstream
    pub fn new(policy: AccessPolicy, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            policy: Arc::new(policy),
            sessions,
            gate: Arc::new(GateConfig::default()),
            upstream: None,
        }
    }

    /// Set the gate configuration
    pub fn with_gate_config(mut self, gate: GateConfig) -> Self {
        self.gate = Arc::new(gate);
        self
    }

    /// Set the upstream proxy
    pub fn with_upstream(mut self, upstream: UpstreamProxy) -> Self {
        self.upstream = Some(Arc::new(upstream));
        self
    }
}
