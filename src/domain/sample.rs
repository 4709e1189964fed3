// Incoming biometric sample
use serde::{Deserialize, Serialize};

/// One reading pushed by a telemetry source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub item_id: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
}

impl Sample {
    pub fn new(item_id: impl Into<String>, value: f64) -> Self {
        Self {
            item_id: item_id.into(),
            value,
            item_name: None,
        }
    }

    pub fn named(item_id: impl Into<String>, value: f64, item_name: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            value,
            item_name: Some(item_name.into()),
        }
    }

    /// Label used when the metric is seen for the first time
    pub fn display_label(&self) -> &str {
        match self.item_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.item_id,
        }
    }
}
