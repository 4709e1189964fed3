// HTTP telemetry sink - posts each forwarded sample as a JSON document
use crate::application::connectivity::TelemetrySink;
use crate::domain::error::ConnectivityError;
use crate::infrastructure::config::{prepare_url, SinkConfig};
use anyhow::Context;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

pub struct HttpTelemetrySink {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    connected: AtomicBool,
}

impl HttpTelemetrySink {
    pub fn new(config: &SinkConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build telemetry HTTP client")?;

        let mut vars = HashMap::new();
        vars.insert("device_id".to_string(), config.device_id.clone());

        Ok(Self {
            client,
            url: prepare_url(&config.url, &vars),
            api_key: config.api_key.clone(),
            connected: AtomicBool::new(config.enabled),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    async fn send_telemetry(&self, fields: HashMap<String, f64>) -> Result<(), ConnectivityError> {
        let mut request = self.client.post(&self.url).json(&fields);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // Unreachable sink: stop forwarding for the rest of the run
                if e.is_connect() {
                    tracing::warn!("Telemetry sink {} unreachable, forwarding disabled", self.url);
                    self.connected.store(false, Ordering::Relaxed);
                }
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ConnectivityError::Rejected { status, body });
        }

        Ok(())
    }
}
