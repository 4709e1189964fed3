use crate::application::session::SessionSettings;
use crate::domain::color::{ColorPicker, PaletteColorPicker, RandomColorPicker};
use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct InsightConfig {
    pub server: ServerSettings,
    pub session: SessionConfig,
    pub device: DeviceConfig,
    pub sink: SinkConfig,
    /// Metric id -> sink field name, checked before the built-in names
    pub naming: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerSettings {
    pub bind: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub sample_buffer: usize,
    pub disconnect_timeout_ms: u64,
    /// Fixed series colors as #RRGGBB; random colors when empty
    pub palette: Vec<String>,
    pub color_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let defaults = SessionSettings::default();
        Self {
            sample_buffer: defaults.sample_buffer,
            disconnect_timeout_ms: defaults.disconnect_timeout.as_millis() as u64,
            palette: Vec::new(),
            color_seed: None,
        }
    }
}

impl SessionConfig {
    pub fn settings(&self) -> SessionSettings {
        SessionSettings {
            sample_buffer: self.sample_buffer,
            disconnect_timeout: Duration::from_millis(self.disconnect_timeout_ms),
        }
    }

    pub fn color_picker(&self) -> anyhow::Result<Box<dyn ColorPicker>> {
        if !self.palette.is_empty() {
            let picker = PaletteColorPicker::from_hex(&self.palette).context("Invalid session.palette")?;
            return Ok(Box::new(picker));
        }

        Ok(match self.color_seed {
            Some(seed) => Box::new(RandomColorPicker::seeded(seed)),
            None => Box::new(RandomColorPicker::new()),
        })
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DeviceConfig {
    /// Without a device the session stays in its loading state
    pub enabled: bool,
    pub id: String,
    pub sample_interval_ms: u64,
    pub seed: Option<u64>,
    pub metrics: Vec<MetricConfig>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            id: "vitals-band-sim".to_string(),
            sample_interval_ms: 1000,
            seed: None,
            metrics: vec![
                MetricConfig {
                    id: "00002a37-0000-1000-8000-00805f9b34fb".to_string(),
                    name: Some("Heart Rate".to_string()),
                    base: 72.0,
                    jitter: 4.0,
                },
                MetricConfig {
                    id: "00002a1c-0000-1000-8000-00805f9b34fb".to_string(),
                    name: Some("Body Temperature".to_string()),
                    base: 36.6,
                    jitter: 0.2,
                },
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricConfig {
    pub id: String,
    pub name: Option<String>,
    pub base: f64,
    #[serde(default)]
    pub jitter: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SinkConfig {
    pub enabled: bool,
    /// May contain `${device_id}`
    pub url: String,
    pub device_id: String,
    pub api_key: Option<String>,
    pub timeout_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: "http://localhost:9090/devices/${device_id}/messages/events".to_string(),
            device_id: "vitals-demo".to_string(),
            api_key: None,
            timeout_ms: 3000,
        }
    }
}

pub fn load_insight_config() -> anyhow::Result<InsightConfig> {
    load_insight_config_from("config/insight")
}

/// File source is optional; `INSIGHT__SECTION__KEY` variables override it.
pub fn load_insight_config_from(path: &str) -> anyhow::Result<InsightConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix("INSIGHT")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path))?;

    settings
        .try_deserialize()
        .context("Failed to deserialize insight configuration")
}

/// Replace `${name}` placeholders with url-encoded values
pub fn prepare_url(template: &str, vars: &HashMap<String, String>) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("${{{}}}", key);
        result = result.replace(&placeholder, &urlencoding::encode(value));
    }
    result
}
