// Insight session - explicit start/stop lifecycle around the accumulator
use crate::application::accumulator::LiveSeriesAccumulator;
use crate::application::clock::SessionClock;
use crate::application::connectivity::{DeviceConnection, TelemetrySink};
use crate::application::naming::MetricNameTranslator;
use crate::domain::error::{ConnectivityError, InsightError};
use crate::domain::sample::Sample;
use crate::domain::series::SeriesCollection;
use crate::domain::window::ChartWindow;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Capacity of the sample channel between producers and the writer
    pub sample_buffer: usize,
    pub disconnect_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            sample_buffer: 256,
            disconnect_timeout: Duration::from_secs(5),
        }
    }
}

/// Notifications for the rest of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    HandlerRegistered,
    Disconnected,
    HandlerCleared,
}

struct ActiveSession {
    samples: mpsc::Sender<Sample>,
    shutdown: oneshot::Sender<()>,
    writer: JoinHandle<LiveSeriesAccumulator>,
}

pub struct InsightSession {
    device: Option<Arc<dyn DeviceConnection>>,
    sink: Option<Arc<dyn TelemetrySink>>,
    translator: Arc<MetricNameTranslator>,
    settings: SessionSettings,
    clock: SessionClock,
    snapshots: Arc<watch::Sender<Arc<SeriesCollection>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
    idle: Option<LiveSeriesAccumulator>,
    active: Option<ActiveSession>,
}

impl InsightSession {
    pub fn new(
        accumulator: LiveSeriesAccumulator,
        device: Option<Arc<dyn DeviceConnection>>,
        sink: Option<Arc<dyn TelemetrySink>>,
        translator: MetricNameTranslator,
        settings: SessionSettings,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let (snapshots, _) = watch::channel(accumulator.snapshot());
        let session = Self {
            device,
            sink,
            translator: Arc::new(translator),
            settings,
            clock: accumulator.clock().clone(),
            snapshots: Arc::new(snapshots),
            events,
            idle: Some(accumulator),
            active: None,
        };
        (session, events_rx)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<SeriesCollection>> {
        self.snapshots.subscribe()
    }

    pub fn snapshot(&self) -> Arc<SeriesCollection> {
        self.snapshots.borrow().clone()
    }

    /// Window computed from the same clock the accumulator stamps points with
    pub fn window(&self) -> ChartWindow {
        self.clock.window()
    }

    /// Sender feeding the active session's writer
    pub fn sample_sender(&self) -> Result<mpsc::Sender<Sample>, InsightError> {
        self.active
            .as_ref()
            .map(|active| active.samples.clone())
            .ok_or(InsightError::SessionInactive)
    }

    /// Reset the collection, spawn the writer and hook up the device.
    pub async fn start(&mut self) -> Result<(), InsightError> {
        if self.active.is_some() {
            tracing::warn!("Insight session already active, ignoring start");
            return Ok(());
        }

        let mut accumulator = self.idle.take().ok_or(InsightError::SessionUnavailable)?;
        accumulator.reset();
        self.clock = accumulator.clock().clone();
        self.snapshots.send_replace(accumulator.snapshot());

        let (tx, rx) = mpsc::channel(self.settings.sample_buffer.max(1));
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let writer = tokio::spawn(run_writer(
            accumulator,
            rx,
            shutdown_rx,
            self.snapshots.clone(),
            self.sink.clone(),
            self.translator.clone(),
        ));

        self.active = Some(ActiveSession {
            samples: tx.clone(),
            shutdown: shutdown_tx,
            writer,
        });
        let _ = self.events.send(SessionEvent::HandlerRegistered);

        match &self.device {
            Some(device) => {
                if !device.is_connected() {
                    tracing::warn!("Device {} reports disconnected, samples may not arrive", device.id());
                }
                if let Err(e) = device.subscribe(tx).await {
                    tracing::warn!("Could not subscribe to device {}: {}", device.id(), e);
                }
            }
            None => tracing::info!("No device paired, chart stays in loading state"),
        }

        tracing::info!("Insight session started at {}", self.clock.start());
        Ok(())
    }

    /// Ordered teardown: disconnect the device, notify, then clear the
    /// update handler and discard the collection.
    pub async fn stop(&mut self) {
        if let Some(teardown) = self.begin_stop() {
            let accumulator = teardown.run().await;
            self.finish_stop(accumulator);
        }
    }

    /// Detach the active writer. The returned teardown needs no access to the
    /// session, so callers sharing it behind a lock can release the lock while
    /// the device disconnects. `start` fails until `finish_stop` is called.
    pub fn begin_stop(&mut self) -> Option<Teardown> {
        let Some(active) = self.active.take() else {
            tracing::debug!("Insight session not active, nothing to stop");
            return None;
        };

        Some(Teardown {
            active,
            device: self.device.clone(),
            disconnect_timeout: self.settings.disconnect_timeout,
            snapshots: self.snapshots.clone(),
            events: self.events.clone(),
        })
    }

    /// Take back the accumulator returned by `Teardown::run`
    pub fn finish_stop(&mut self, accumulator: Option<LiveSeriesAccumulator>) {
        if let Some(mut accumulator) = accumulator {
            accumulator.reset();
            self.idle = Some(accumulator);
        }
        tracing::info!("Insight session stopped");
    }
}

pub struct Teardown {
    active: ActiveSession,
    device: Option<Arc<dyn DeviceConnection>>,
    disconnect_timeout: Duration,
    snapshots: Arc<watch::Sender<Arc<SeriesCollection>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Teardown {
    pub async fn run(self) -> Option<LiveSeriesAccumulator> {
        if let Some(device) = &self.device {
            let timeout = self.disconnect_timeout;
            let result = match tokio::time::timeout(timeout, device.disconnect()).await {
                Ok(result) => result,
                Err(_) => Err(ConnectivityError::Timeout(timeout)),
            };
            match result {
                Ok(()) => tracing::info!("Device {} disconnected", device.id()),
                Err(e) => tracing::warn!("Disconnecting device {} failed: {}", device.id(), e),
            }
            let _ = self.events.send(SessionEvent::Disconnected);
        }

        let ActiveSession {
            samples,
            shutdown,
            writer,
        } = self.active;
        drop(samples);
        let _ = shutdown.send(());

        let accumulator = match writer.await {
            Ok(accumulator) => Some(accumulator),
            Err(e) => {
                tracing::error!("Insight writer task failed: {}", e);
                None
            }
        };

        self.snapshots.send_replace(Arc::new(SeriesCollection::new()));
        let _ = self.events.send(SessionEvent::HandlerCleared);
        accumulator
    }
}

/// Single writer: every sample goes through here, one at a time.
async fn run_writer(
    mut accumulator: LiveSeriesAccumulator,
    mut rx: mpsc::Receiver<Sample>,
    mut shutdown: oneshot::Receiver<()>,
    snapshots: Arc<watch::Sender<Arc<SeriesCollection>>>,
    sink: Option<Arc<dyn TelemetrySink>>,
    translator: Arc<MetricNameTranslator>,
) -> LiveSeriesAccumulator {
    loop {
        let sample = tokio::select! {
            biased;
            _ = &mut shutdown => break,
            sample = rx.recv() => match sample {
                Some(sample) => sample,
                None => break,
            },
        };

        if let Some(sink) = &sink {
            forward(sink, &translator, &sample);
        }

        match accumulator.ingest(&sample) {
            Ok(snapshot) => {
                tracing::debug!(
                    "Ingested {}={} ({} series)",
                    sample.item_id,
                    sample.value,
                    snapshot.len()
                );
                snapshots.send_replace(snapshot);
            }
            Err(e) => tracing::warn!("Dropping sample: {}", e),
        }
    }

    accumulator
}

/// Fire-and-forget copy of the sample to the sink, only while it is connected
fn forward(sink: &Arc<dyn TelemetrySink>, translator: &MetricNameTranslator, sample: &Sample) {
    if sample.item_id.is_empty() || !sink.is_connected() {
        return;
    }

    let mut fields = HashMap::new();
    fields.insert(translator.translate(&sample.item_id), sample.value);

    let sink = sink.clone();
    tokio::spawn(async move {
        if let Err(e) = sink.send_telemetry(fields).await {
            tracing::debug!("Telemetry forwarding failed: {}", e);
        }
    });
}
