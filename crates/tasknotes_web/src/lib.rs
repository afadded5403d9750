//! HTML front end for tasknotes.
//!
//! # Responsibility
//! - Map HTTP routes onto the core services.
//! - Own session cookies, flash messages and page rendering.
//!
//! # Invariants
//! - Handlers never hold a database connection across an await point.
//! - Every response is logged once with its status and latency.

pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod templates;

pub use error::{WebError, WebResult};
pub use state::AppState;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use log::info;
use std::io;
use std::time::Instant;
use tokio::net::TcpListener;

/// Full application router with request logging.
pub fn build_router(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(middleware::from_fn(log_request))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        "event=http_request module=web status={} method={} path={} duration_ms={}",
        response.status().as_u16(),
        method,
        path,
        started.elapsed().as_millis()
    );
    response
}

/// Serves the app on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, state: AppState) -> io::Result<()> {
    let addr = listener.local_addr()?;
    info!("event=server_start module=web status=ok addr={addr}");
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=web status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::warn!("event=server_signal module=web status=error error={err}");
    }
}
