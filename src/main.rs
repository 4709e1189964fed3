// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::accumulator::LiveSeriesAccumulator;
use crate::application::clock::{SessionClock, SystemClock};
use crate::application::connectivity::{DeviceConnection, TelemetrySink};
use crate::application::naming::MetricNameTranslator;
use crate::application::session::{InsightSession, SessionEvent};
use crate::infrastructure::config::load_insight_config;
use crate::infrastructure::http_sink::HttpTelemetrySink;
use crate::infrastructure::simulated_device::SimulatedDevice;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{get_insight, health_check, push_sample, stream_insight};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_insight_config()?;

    // Create adapters (infrastructure layer)
    let device: Option<Arc<dyn DeviceConnection>> = if config.device.enabled {
        Some(Arc::new(SimulatedDevice::new(&config.device)))
    } else {
        None
    };
    let sink: Option<Arc<dyn TelemetrySink>> = if config.sink.enabled {
        let sink = HttpTelemetrySink::new(&config.sink)?;
        tracing::info!("Forwarding telemetry to {}", sink.url());
        Some(Arc::new(sink))
    } else {
        None
    };

    // Create session (application layer)
    let accumulator = LiveSeriesAccumulator::new(
        SessionClock::new(Arc::new(SystemClock)),
        config.session.color_picker()?,
    );
    let (mut session, mut events) = InsightSession::new(
        accumulator,
        device,
        sink,
        MetricNameTranslator::new(config.naming.clone()),
        config.session.settings(),
    );

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::Disconnected => tracing::info!("Device disconnected"),
                other => tracing::debug!("Session event: {:?}", other),
            }
        }
    });

    session.start().await?;

    // Create application state
    let state = Arc::new(AppState {
        session: Arc::new(RwLock::new(session)),
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/insight", get(get_insight))
        .route("/insight/stream", get(stream_insight))
        .route("/insight/samples", post(push_sample))
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid server.bind address {}", config.server.bind))?;
    tracing::info!("Starting vitals-insight service on {}", addr);

    // Stopping the session ends open chart streams, letting shutdown complete
    axum::serve(tokio::net::TcpListener::bind(addr).await?, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down, stopping insight session");
            state.stop_session().await;
        })
        .await?;

    Ok(())
}
