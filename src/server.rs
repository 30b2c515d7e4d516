//! HTTP listener
//!
//! tiny_http accepts connections on a blocking thread; every request is
//! handed to the tokio runtime, so a slow upstream fetch only holds up the
//! request that triggered it. A semaphore caps concurrent evaluations.

use crate::error::{AppError, AppResult};
use crate::web::{App, Reply};
use std::net::SocketAddr;
use std::sync::Arc;
use tiny_http::{Header, Request, Response, StatusCode};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Bound HTTP listener
pub struct HttpServer {
    inner: Arc<tiny_http::Server>,
}

/// Stops a running [`HttpServer`] from another task
#[derive(Clone)]
pub struct ShutdownHandle {
    inner: Arc<tiny_http::Server>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.inner.unblock();
    }
}

impl HttpServer {
    /// Bind to `addr` (`host:port`); port 0 picks a free port
    pub fn bind(addr: &str) -> AppResult<Self> {
        let server = tiny_http::Server::http(addr).map_err(|e| AppError::ServerBind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            inner: Arc::new(server),
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.server_addr().to_ip()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            inner: self.inner.clone(),
        }
    }

    /// Serve requests until shut down
    pub async fn run(self, app: Arc<App>, workers: usize) -> AppResult<()> {
        let runtime = tokio::runtime::Handle::current();
        let limiter = Arc::new(Semaphore::new(workers.max(1)));
        let server = self.inner;

        if let Some(addr) = server.server_addr().to_ip() {
            info!("Listening on http://{}", addr);
        }

        tokio::task::spawn_blocking(move || {
            for request in server.incoming_requests() {
                let app = app.clone();
                let limiter = limiter.clone();
                runtime.spawn(async move {
                    let Ok(_permit) = limiter.acquire_owned().await else {
                        return;
                    };
                    dispatch(&app, request).await;
                });
            }
        })
        .await
        .map_err(|e| AppError::Internal(format!("listener task failed: {}", e)))?;

        info!("Listener stopped");
        Ok(())
    }
}

async fn dispatch(app: &App, request: Request) {
    let method = request.method().as_str().to_string();
    let target = request.url().to_string();
    let accept = accept_header(&request);

    let reply = app.handle(&method, &target, accept.as_deref()).await;
    info!(method = %method, target = %target, status = reply.status, "Handled request");

    let response = to_response(reply);
    match tokio::task::spawn_blocking(move || request.respond(response)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("Client went away before response was sent: {}", e),
        Err(e) => warn!("Response task failed: {}", e),
    }
}

/// All Accept header values, joined as one list
fn accept_header(request: &Request) -> Option<String> {
    let values: Vec<&str> = request
        .headers()
        .iter()
        .filter(|h| h.field.equiv("Accept"))
        .map(|h| h.value.as_str())
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(","))
    }
}

fn to_response(reply: Reply) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut response = Response::from_string(reply.body).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type) {
        response = response.with_header(header);
    }
    if let Some(allow) = reply.allow {
        if let Ok(header) = Header::from_bytes("Allow", allow) {
            response = response.with_header(header);
        }
    }
    response
}
