//! Trigger Surface + Metrics plane HTTP listeners (C6, C7) — three
//! independently configured `axum` listeners: control (`/reload/:key`),
//! metrics (`/metrics`), and an optional debug port.
//!
//! Grounded on the teacher's `cluster::main::build_router` pattern
//! (axum `Router` + `tokio::net::TcpListener` + `axum::serve`).

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tracing::{info, warn};

use crate::conf::model::Config;
use crate::metrics::SharedReloadCounter;
use crate::supervisor::Supervisor;

#[derive(Clone)]
struct ControlState {
    supervisor: Arc<Supervisor>,
    config: Arc<tokio::sync::RwLock<Config>>,
}

async fn reload_handler(State(state): State<ControlState>, Path(key): Path<String>) -> StatusCode {
    let config = state.config.read().await;
    if key != config.control.key {
        return StatusCode::NOT_FOUND;
    }
    let cmd = config.cmd.clone();
    drop(config);

    match state.supervisor.reload(&cmd).await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            warn!(error = %e, "control-triggered reload failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Serve the `/reload/:key` control endpoint. Never touches the reload
/// counter (spec §4.6 — control-triggered reloads are not content-driven).
pub async fn serve_control(
    addr: SocketAddr,
    supervisor: Arc<Supervisor>,
    config: Arc<tokio::sync::RwLock<Config>>,
) -> std::io::Result<()> {
    let state = ControlState { supervisor, config };
    let app = Router::new().route("/reload/{key}", get(reload_handler)).with_state(state);

    info!(%addr, "control endpoint listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn metrics_handler(State(counter): State<SharedReloadCounter>) -> String {
    counter.render_prometheus_text()
}

pub async fn serve_metrics(addr: SocketAddr, counter: SharedReloadCounter) -> std::io::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler)).with_state(counter);

    info!(%addr, "metrics endpoint listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn debug_status() -> &'static str {
    "ok"
}

/// Minimal diagnostics listener, bound only when `debug: true` and
/// `debugport` is set. A full pprof-equivalent profiler is out of scope.
pub async fn serve_debug(addr: SocketAddr) -> std::io::Result<()> {
    let app = Router::new().route("/debug/status", get(debug_status));

    info!(%addr, "debug endpoint listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reload_handler_rejects_wrong_key() {
        let supervisor = Arc::new(Supervisor::new());
        let mut config = Config::default();
        config.control.key = "secret".to_string();
        let config = Arc::new(tokio::sync::RwLock::new(config));
        let state = ControlState { supervisor, config };

        let status = reload_handler(State(state), Path("wrong".to_string())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
