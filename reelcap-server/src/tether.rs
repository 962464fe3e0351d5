//! Composition root: ties configuration, the caption service and the HTTP
//! router together and owns the process lifecycle.
use anyhow::{Context, Result};
use axum::Router;
use reelcap_common::{ExtractionRequest, ExtractionResult};
use reelcap_config::ReelcapConfig;
use tokio::net::TcpListener;

use crate::routes::create_router;
use crate::state::AppState;

pub struct Tether {
    state: AppState,
    addr: String,
}

impl Tether {
    pub fn new(state: AppState, addr: impl Into<String>) -> Self {
        Self {
            state,
            addr: addr.into(),
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.state.clone())
    }

    /// Serve until Ctrl-C or SIGTERM, letting in-flight requests finish.
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(&self.addr)
            .await
            .with_context(|| format!("binding {}", self.addr))?;
        let local = listener.local_addr()?;
        tracing::info!(addr = %local, "listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("server stopped");
        Ok(())
    }

    /// One extraction outside the HTTP surface, for the `extract` command.
    pub async fn extract_once(&self, url: &str) -> ExtractionResult {
        match self.state.service.extract(&ExtractionRequest::new(url)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, detail = e.detail().unwrap_or(""), "extraction failed");
                ExtractionResult::from(&e)
            }
        }
    }
}

pub fn build_from_config(cfg: &ReelcapConfig) -> Result<Tether> {
    let state = AppState::from_config(cfg)?;
    Ok(Tether::new(state, cfg.server.addr()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}
