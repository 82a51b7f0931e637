//! Local diagnostics endpoint.
//!
//! A small `axum` router serving a plain-text snapshot of the reflector
//! statistics. Bound to loopback only.
//!
//! # Endpoints
//!
//! - `GET /` - statistics snapshot
//! - `GET /debug/stats` - same snapshot

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::Result;
use crate::stats::ReflectorStatistics;

/// Default diagnostics port.
pub const DEFAULT_DEBUG_PORT: u16 = 6060;

/// Bind the diagnostics listener on localhost.
pub async fn bind(port: u16) -> Result<TcpListener> {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Diagnostics endpoint listening");
    Ok(listener)
}

/// Create the diagnostics router.
pub fn router(stats: Arc<ReflectorStatistics>) -> Router {
    Router::new()
        .route("/", get(statistics))
        .route("/debug/stats", get(statistics))
        .with_state(stats)
}

/// Serve statistics until the task is dropped.
pub async fn serve(listener: TcpListener, stats: Arc<ReflectorStatistics>) {
    if let Err(err) = axum::serve(listener, router(stats)).await {
        warn!("Diagnostics endpoint stopped: {}", err);
    }
}

async fn statistics(State(stats): State<Arc<ReflectorStatistics>>) -> String {
    stats.snapshot().to_string()
}
