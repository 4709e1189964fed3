// Rolling chart window derived from the session clock
use chrono::{DateTime, Duration, Local, Utc};
use serde::Serialize;

/// How far back the window reaches, in milliseconds.
pub const WINDOW_LOOKBACK_MS: i64 = 10_000;
/// Head room past the newest point, in milliseconds.
pub const WINDOW_LOOKAHEAD_MS: i64 = 500;

const AXIS_LABEL_FORMAT: &str = "%H:%M:%S";

/// X-axis bounds, relative to `since` as time zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartWindow {
    pub since: DateTime<Utc>,
    pub axis_minimum: i64,
    pub axis_maximum: i64,
    pub minimum_label: String,
    pub maximum_label: String,
}

impl ChartWindow {
    pub fn new(since: DateTime<Utc>, elapsed_ms: u64) -> Self {
        let elapsed = i64::try_from(elapsed_ms).unwrap_or(i64::MAX);
        let axis_minimum = elapsed.saturating_sub(WINDOW_LOOKBACK_MS);
        let axis_maximum = elapsed.saturating_add(WINDOW_LOOKAHEAD_MS);
        Self {
            since,
            axis_minimum,
            axis_maximum,
            minimum_label: Self::label(since, axis_minimum),
            maximum_label: Self::label(since, axis_maximum),
        }
    }

    /// Wall-clock label in the host's local time zone
    fn label(since: DateTime<Utc>, offset_ms: i64) -> String {
        (since + Duration::milliseconds(offset_ms))
            .with_timezone(&Local)
            .format(AXIS_LABEL_FORMAT)
            .to_string()
    }
}

#[cfg(test)]
impl ChartWindow {
    pub fn contains(&self, x: u64) -> bool {
        let x = i64::try_from(x).unwrap_or(i64::MAX);
        x >= self.axis_minimum && x <= self.axis_maximum
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn local_label(at: DateTime<Utc>) -> String {
        at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    #[test]
    fn test_bounds_follow_elapsed_time() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = ChartWindow::new(since, 15_000);

        assert_eq!(window.axis_minimum, 5_000);
        assert_eq!(window.axis_maximum, 15_500);
        assert_eq!(window.minimum_label, local_label(since + Duration::seconds(5)));
        assert_eq!(window.maximum_label, local_label(since + Duration::milliseconds(15_500)));
    }

    #[test]
    fn test_early_window_starts_before_zero() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let window = ChartWindow::new(since, 2_000);

        assert_eq!(window.axis_minimum, -8_000);
        assert_eq!(window.minimum_label, local_label(since - Duration::seconds(8)));
        assert!(window.contains(0));
        assert!(window.contains(2_500));
        assert!(!window.contains(2_501));
    }
}
