// Ports for the paired device and the remote telemetry sink
use crate::domain::error::ConnectivityError;
use crate::domain::sample::Sample;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// A paired device that produces samples.
#[async_trait]
pub trait DeviceConnection: Send + Sync {
    fn id(&self) -> &str;

    fn is_connected(&self) -> bool;

    /// Start pushing samples into `tx` until disconnected or the receiver closes
    async fn subscribe(&self, tx: mpsc::Sender<Sample>) -> Result<(), ConnectivityError>;

    async fn disconnect(&self) -> Result<(), ConnectivityError>;
}

/// Remote telemetry sink fed with a copy of every sample.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    fn is_connected(&self) -> bool;

    async fn send_telemetry(&self, fields: HashMap<String, f64>) -> Result<(), ConnectivityError>;
}
