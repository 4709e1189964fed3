// Translate metric identifiers into telemetry sink field names
use std::collections::HashMap;

/// Well-known GATT characteristics, keyed by 16-bit short form
const GATT_NAMES: &[(&str, &str)] = &[
    ("2a37", "heartRate"),
    ("2a1c", "bodyTemperature"),
    ("2a6e", "temperature"),
    ("2a19", "batteryLevel"),
    ("2a5f", "bloodOxygen"),
    ("2a35", "bloodPressure"),
];

const GATT_BASE_SUFFIX: &str = "-0000-1000-8000-00805f9b34fb";

#[derive(Debug, Clone, Default)]
pub struct MetricNameTranslator {
    overrides: HashMap<String, String>,
}

impl MetricNameTranslator {
    pub fn new(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn translate(&self, item_id: &str) -> String {
        if let Some(name) = self.overrides.get(item_id) {
            return name.clone();
        }

        if let Some(short) = gatt_short_id(item_id) {
            if let Some((_, name)) = GATT_NAMES.iter().find(|(id, _)| *id == short) {
                return name.to_string();
            }
        }

        lower_camel_case(item_id)
    }
}

/// "00002a37-0000-1000-8000-00805f9b34fb", "0x2A37" and "2a37" all yield "2a37"
fn gatt_short_id(item_id: &str) -> Option<String> {
    let id = item_id.to_ascii_lowercase();
    let short = if let Some(prefix) = id.strip_suffix(GATT_BASE_SUFFIX) {
        prefix.strip_prefix("0000")?.to_string()
    } else {
        id.strip_prefix("0x").unwrap_or(&id).to_string()
    };

    (short.len() == 4 && short.chars().all(|c| c.is_ascii_hexdigit())).then_some(short)
}

fn lower_camel_case(item_id: &str) -> String {
    let mut out = String::with_capacity(item_id.len());
    for (i, word) in item_id
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if i == 0 {
                out.extend(first.to_lowercase());
            } else {
                out.extend(first.to_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }

    if out.is_empty() {
        item_id.to_string()
    } else {
        out
    }
}
