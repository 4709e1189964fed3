// Application state for HTTP handlers
use crate::application::session::InsightSession;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<InsightSession>>,
}

impl AppState {
    /// Stop the session, holding the write lock only around the bookkeeping
    /// so handlers keep answering while the device disconnects
    pub async fn stop_session(&self) {
        let teardown = self.session.write().await.begin_stop();
        if let Some(teardown) = teardown {
            let accumulator = teardown.run().await;
            self.session.write().await.finish_stop(accumulator);
        }
    }
}
