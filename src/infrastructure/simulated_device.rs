// Simulated wearable - stands in for a paired Bluetooth device
use crate::application::connectivity::DeviceConnection;
use crate::domain::error::ConnectivityError;
use crate::domain::sample::Sample;
use crate::infrastructure::config::{DeviceConfig, MetricConfig};
use async_trait::async_trait;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub struct SimulatedDevice {
    id: String,
    interval: Duration,
    seed: Option<u64>,
    metrics: Vec<MetricConfig>,
    connected: AtomicBool,
    emitter: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedDevice {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            id: config.id.clone(),
            interval: Duration::from_millis(config.sample_interval_ms.max(1)),
            seed: config.seed,
            metrics: config.metrics.clone(),
            connected: AtomicBool::new(true),
            emitter: Mutex::new(None),
        }
    }

    fn reading(rng: &mut StdRng, metric: &MetricConfig) -> Sample {
        let offset = if metric.jitter > 0.0 {
            rng.gen_range(-metric.jitter..=metric.jitter)
        } else {
            0.0
        };
        let value = ((metric.base + offset) * 100.0).round() / 100.0;

        match &metric.name {
            Some(name) => Sample::named(metric.id.as_str(), value, name.as_str()),
            None => Sample::new(metric.id.as_str(), value),
        }
    }
}

#[async_trait]
impl DeviceConnection for SimulatedDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Subscribing (re)connects the simulator, so a stopped session can start again
    async fn subscribe(&self, tx: mpsc::Sender<Sample>) -> Result<(), ConnectivityError> {
        self.connected.store(true, Ordering::SeqCst);

        let metrics = self.metrics.clone();
        let interval = self.interval;
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let device_id = self.id.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                for metric in &metrics {
                    let sample = Self::reading(&mut rng, metric);
                    if tx.send(sample).await.is_err() {
                        tracing::debug!("Sample receiver for {} closed, stopping emitter", device_id);
                        return;
                    }
                }
            }
        });

        let previous = self
            .emitter
            .lock()
            .map_err(|_| ConnectivityError::Transport("emitter lock poisoned".to_string()))?
            .replace(handle);
        if let Some(previous) = previous {
            previous.abort();
        }

        tracing::info!("Simulated device {} streaming {} metrics", self.id, self.metrics.len());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), ConnectivityError> {
        self.connected.store(false, Ordering::SeqCst);
        let handle = self
            .emitter
            .lock()
            .map_err(|_| ConnectivityError::Transport("emitter lock poisoned".to_string()))?
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::accumulator::LiveSeriesAccumulator;
    use crate::application::clock::{SessionClock, SystemClock};
    use crate::application::naming::MetricNameTranslator;
    use crate::application::session::{InsightSession, SessionSettings};
    use crate::domain::color::RandomColorPicker;
    use std::sync::Arc;

    fn config() -> DeviceConfig {
        DeviceConfig {
            sample_interval_ms: 5,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_emits_configured_metrics() {
        let device = SimulatedDevice::new(&config());
        let (tx, mut rx) = mpsc::channel(8);
        device.subscribe(tx).await.unwrap();

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.item_name.as_deref(), Some("Heart Rate"));
        assert!((68.0..=76.0).contains(&first.value));
        assert_eq!(second.item_name.as_deref(), Some("Body Temperature"));
        assert!((36.4..=36.8).contains(&second.value));

        device.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_stops_emitting() {
        let device = SimulatedDevice::new(&config());
        let (tx, mut rx) = mpsc::channel(8);
        device.subscribe(tx).await.unwrap();
        rx.recv().await.unwrap();

        device.disconnect().await.unwrap();
        assert!(!device.is_connected());

        // Emitter task dropped its sender, so the channel drains and closes
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_subscribe_after_disconnect_reconnects() {
        let device = SimulatedDevice::new(&config());
        device.disconnect().await.unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        device.subscribe(tx).await.unwrap();

        assert!(device.is_connected());
        assert!(rx.recv().await.is_some());
        device.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn test_restarted_session_receives_samples() {
        let device: Arc<dyn DeviceConnection> = Arc::new(SimulatedDevice::new(&config()));
        let accumulator = LiveSeriesAccumulator::new(
            SessionClock::new(Arc::new(SystemClock)),
            Box::new(RandomColorPicker::seeded(5)),
        );
        let (mut session, _events) = InsightSession::new(
            accumulator,
            Some(device),
            None,
            MetricNameTranslator::default(),
            SessionSettings::default(),
        );

        for _ in 0..2 {
            session.start().await.unwrap();
            let mut snapshots = session.subscribe();
            tokio::time::timeout(Duration::from_secs(2), snapshots.wait_for(|s| !s.is_empty()))
                .await
                .expect("no samples after start")
                .unwrap();
            session.stop().await;
        }
    }
}
