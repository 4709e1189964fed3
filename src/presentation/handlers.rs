// HTTP request handlers
use crate::domain::sample::Sample;
use crate::infrastructure::chunked_json::chunked_json_stream;
use crate::presentation::app_state::AppState;
use crate::presentation::view::InsightView;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Current chart view
pub async fn get_insight(State(state): State<Arc<AppState>>) -> Json<InsightView> {
    let session = state.session.read().await;
    let snapshot = session.snapshot();
    Json(InsightView::build(session.has_device(), &snapshot, session.window()))
}

/// Stream one view per published snapshot until the session stops
pub async fn stream_insight(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let compress = accepts_brotli(&headers);
    let mut snapshots = state.session.read().await.subscribe();
    let session = state.session.clone();

    let views = async_stream::stream! {
        loop {
            let snapshot = snapshots.borrow_and_update().clone();
            let (view, active) = {
                let session = session.read().await;
                let view = InsightView::build(session.has_device(), &snapshot, session.window());
                (view, session.is_active())
            };
            yield view;

            if !active || snapshots.changed().await.is_err() {
                break;
            }
        }
    };

    match chunked_json_stream(views, compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Push a sample from an external producer into the active session
pub async fn push_sample(
    State(state): State<Arc<AppState>>,
    Json(sample): Json<Sample>,
) -> StatusCode {
    if sample.item_id.is_empty() {
        return StatusCode::UNPROCESSABLE_ENTITY;
    }

    let sender = match state.session.read().await.sample_sender() {
        Ok(sender) => sender,
        Err(e) => {
            tracing::debug!("Rejecting pushed sample: {}", e);
            return StatusCode::CONFLICT;
        }
    };

    match sender.send(sample).await {
        Ok(()) => StatusCode::ACCEPTED,
        Err(_) => StatusCode::CONFLICT,
    }
}

fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get("accept-encoding")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::accumulator::LiveSeriesAccumulator;
    use crate::application::clock::{SessionClock, SystemClock};
    use crate::application::connectivity::DeviceConnection;
    use crate::application::naming::MetricNameTranslator;
    use crate::application::session::{InsightSession, SessionSettings};
    use crate::domain::color::RandomColorPicker;
    use crate::domain::error::ConnectivityError;
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::time::Duration;
    use tokio::sync::{mpsc, RwLock};

    /// Device whose disconnect never returns
    struct StuckDevice;

    #[async_trait]
    impl DeviceConnection for StuckDevice {
        fn id(&self) -> &str {
            "stuck-band"
        }

        fn is_connected(&self) -> bool {
            true
        }

        async fn subscribe(&self, _tx: mpsc::Sender<Sample>) -> Result<(), ConnectivityError> {
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), ConnectivityError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(())
        }
    }

    fn state() -> Arc<AppState> {
        state_with(None, SessionSettings::default())
    }

    fn state_with(
        device: Option<Arc<dyn DeviceConnection>>,
        settings: SessionSettings,
    ) -> Arc<AppState> {
        let accumulator = LiveSeriesAccumulator::new(
            SessionClock::new(Arc::new(SystemClock)),
            Box::new(RandomColorPicker::seeded(3)),
        );
        let (session, _events) = InsightSession::new(
            accumulator,
            device,
            None,
            MetricNameTranslator::default(),
            settings,
        );
        Arc::new(AppState {
            session: Arc::new(RwLock::new(session)),
        })
    }

    #[test]
    fn test_accepts_brotli() {
        let mut headers = HeaderMap::new();
        assert!(!accepts_brotli(&headers));
        headers.insert("accept-encoding", HeaderValue::from_static("gzip, br"));
        assert!(accepts_brotli(&headers));
    }

    #[tokio::test]
    async fn test_stream_ends_when_session_stops() {
        let state = state();
        state.session.write().await.start().await.unwrap();

        let response = stream_insight(HeaderMap::new(), State(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        state.session.write().await.stop().await;

        let body = tokio::time::timeout(
            Duration::from_secs(2),
            axum::body::to_bytes(response.into_body(), usize::MAX),
        )
        .await
        .expect("stream should finish after stop")
        .unwrap();

        // Every chunk is a loading view: no device is paired
        let mut rest = &body[..];
        let mut chunks = 0;
        while !rest.is_empty() {
            let len = u32::from_be_bytes(rest[..4].try_into().unwrap()) as usize;
            let view: serde_json::Value = serde_json::from_slice(&rest[4..4 + len]).unwrap();
            assert_eq!(view["status"], "loading");
            rest = &rest[4 + len..];
            chunks += 1;
        }
        assert!(chunks >= 1);
    }

    #[tokio::test]
    async fn test_push_rejected_while_inactive() {
        let state = state();
        let status = push_sample(State(state), Json(Sample::new("hr", 70.0))).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_push_rejects_empty_id() {
        let state = state();
        state.session.write().await.start().await.unwrap();

        let status = push_sample(State(state.clone()), Json(Sample::new("", 1.0))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        state.session.write().await.stop().await;
    }

    #[tokio::test]
    async fn test_pushed_sample_reaches_snapshot() {
        let state = state();
        state.session.write().await.start().await.unwrap();
        let mut snapshots = state.session.read().await.subscribe();

        let status = push_sample(State(state.clone()), Json(Sample::new("hr", 70.0))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        tokio::time::timeout(Duration::from_secs(2), snapshots.wait_for(|s| !s.is_empty()))
            .await
            .unwrap()
            .unwrap();

        // No device paired, so the view keeps showing the placeholder
        let Json(view) = get_insight(State(state.clone())).await;
        assert!(matches!(view, InsightView::Loading));

        state.session.write().await.stop().await;
    }

    #[tokio::test]
    async fn test_handlers_respond_while_device_disconnects() {
        let settings = SessionSettings {
            disconnect_timeout: Duration::from_millis(800),
            ..Default::default()
        };
        let state = state_with(Some(Arc::new(StuckDevice)), settings);
        state.session.write().await.start().await.unwrap();

        let stopping = tokio::spawn({
            let state = state.clone();
            async move { state.stop_session().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!stopping.is_finished());

        let quick = Duration::from_millis(200);
        let Json(view) = tokio::time::timeout(quick, get_insight(State(state.clone())))
            .await
            .expect("view blocked by teardown");
        assert!(matches!(view, InsightView::Loading));

        let status = tokio::time::timeout(
            quick,
            push_sample(State(state.clone()), Json(Sample::new("hr", 70.0))),
        )
        .await
        .expect("push blocked by teardown");
        assert_eq!(status, StatusCode::CONFLICT);

        stopping.await.unwrap();
        assert!(!state.session.read().await.is_active());
    }
}
