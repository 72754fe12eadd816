//! Admin API server.

use crate::admin_api::router::route_request;
use crate::alerts::Alerts;
use crate::loader::FilesLoader;
use crate::mock::Mock;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, info};

/// Everything the admin handlers operate on.
pub struct AdminState {
    pub mock: Arc<Mock>,
    /// Root alert scope, listed by `GET /api/alerts`.
    pub alerts: Alerts,
    /// Source of `POST /api/mock/reload`, when definitions come from files.
    pub loader: Option<Arc<FilesLoader>>,
}

/// Admin API server for mockyard
pub struct AdminApiServer {
    listener: TcpListener,
    state: Arc<AdminState>,
}

impl AdminApiServer {
    /// Bind the admin listener. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr, state: AdminState) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            state: Arc::new(state),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the admin API server
    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!("Admin API listening on http://{}", self.local_addr()?);

        loop {
            let (stream, _) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let state = Arc::clone(&self.state);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let state = Arc::clone(&state);
                    async move { route_request(req, state).await }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Admin API connection error: {}", e);
                }
            });
        }
    }
}
