//! Startup wiring: settings in, a served router out

use crate::config::Settings;
use crate::error::Result;
use axum::Router;
use bezs_core::ValidateConfig;
use bezs_http::{AccessPolicy, AppState, HttpSessionProvider, UpstreamProxy, build_router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// A validated, fully wired gate ready to serve
pub struct Runtime {
    settings: Settings,
    router: Router,
}

impl Runtime {
    /// Validate settings and build every client the gate needs
    pub fn build(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let sessions = HttpSessionProvider::new(&settings.session, settings.gate.session_timeout())?;
        info!(endpoint = %sessions.endpoint(), "Session provider configured");

        let mut state = AppState::new(
            AccessPolicy::new(settings.routes.clone()),
            Arc::new(sessions),
        )
        .with_gate_config(settings.gate.clone());

        if settings.upstream.base_url.is_some() {
            let proxy = UpstreamProxy::new(&settings.upstream)?;
            info!(upstream = %proxy.base_url(), "Forwarding gated requests upstream");
            state = state.with_upstream(proxy);
        } else {
            info!("No upstream configured, only local routes are served");
        }

        let router = build_router(state);
        Ok(Self { settings, router })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.settings.server.address();
        Ok(TcpListener::bind(&addr).await?)
    }

    /// Serve on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = listener.local_addr()?;
        info!("Server listening on http://{addr}");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}
