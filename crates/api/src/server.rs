//! API server startup

use std::net::SocketAddr;

use ferry_config::ApiServerConfig;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{ApiError, Result};
use crate::routes::build_router;
use crate::state::AppState;

/// A running API server
#[derive(Debug)]
pub struct ApiServer {
    local_addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Bind `config.address()` and serve until `cancel` fires
    pub async fn bind(
        config: &ApiServerConfig,
        state: AppState,
        cancel: CancellationToken,
    ) -> Result<Self> {
        Self::bind_addr(&config.address(), state, cancel).await
    }

    /// Bind an explicit `host:port`
    pub async fn bind_addr(addr: &str, state: AppState, cancel: CancellationToken) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|source| ApiError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local_addr = listener.local_addr().map_err(|source| ApiError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        tracing::info!(addr = %local_addr, "API server listening");

        let app = build_router(state);
        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    cancel.cancelled().await;
                })
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(error = %e, "API server error");
                });
        });

        Ok(Self { local_addr, handle })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Wait for the server to stop
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::error!(error = %e, "API server task failed");
        }
    }
}
