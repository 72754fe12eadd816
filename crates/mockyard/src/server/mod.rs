//! HTTP server answering mock traffic.
//!
//! Each request body is buffered into a [`MockRequest`] and dispatched by the
//! [`Mock`] engine. Requests no variant answers get a JSON 404; handler
//! failures get a JSON 500.

use crate::admin_api::types::{collect_body, json_response};
use crate::metrics;
use crate::mock::{DispatchOutcome, Mock, MockRequest};
use crate::variant_handlers::MockResponse;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

/// Mock traffic server
pub struct MockServer {
    listener: TcpListener,
    mock: Arc<Mock>,
}

impl MockServer {
    /// Bind the listener. Port 0 picks a free port; see [`Self::local_addr`].
    pub async fn bind(addr: SocketAddr, mock: Arc<Mock>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, mock })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, anyhow::Error> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until the task is dropped.
    pub async fn run(self) -> Result<(), anyhow::Error> {
        info!("Mock server listening on http://{}", self.local_addr()?);

        loop {
            let (stream, remote_addr) = self.listener.accept().await?;
            let io = TokioIo::new(stream);
            let mock = Arc::clone(&self.mock);

            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let mock = Arc::clone(&mock);
                    async move {
                        Ok::<_, hyper::Error>(handle_mock_request(req, remote_addr, mock).await)
                    }
                });

                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                    debug!("Mock connection error: {}", e);
                }
            });
        }
    }
}

/// Dispatch one request and map the outcome to a response.
pub async fn handle_mock_request(
    req: Request<Incoming>,
    remote_addr: SocketAddr,
    mock: Arc<Mock>,
) -> MockResponse {
    let start = Instant::now();
    let (parts, body) = req.into_parts();
    let method = parts.method.to_string();

    let body = match collect_body(body).await {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to read mock request body: {}", e);
            return json_response(
                StatusCode::BAD_REQUEST,
                &serde_json::json!({"error": e}),
            );
        }
    };
    let request = MockRequest::new(parts.method, parts.uri)
        .with_headers(parts.headers)
        .with_body(body)
        .with_remote_addr(remote_addr);
    let path = request.path().to_string();

    let (outcome, response) = match mock.dispatch(request).await {
        Ok(DispatchOutcome::Responded(response)) => ("responded", response),
        Ok(DispatchOutcome::Unhandled(reason)) => {
            debug!(method = %method, path = %path, reason = ?reason, "Request not handled");
            (
                "unhandled",
                json_response(StatusCode::NOT_FOUND, &serde_json::json!({"error": "Not Found"})),
            )
        }
        Err(e) => {
            error!(method = %method, path = %path, "Variant handler failed: {}", e);
            (
                "failed",
                json_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    &serde_json::json!({"error": e.to_string()}),
                ),
            )
        }
    };

    metrics::record_request(&method, outcome, start.elapsed().as_secs_f64() * 1000.0);
    response
}
