// Render-ready view of the live chart
use crate::domain::color::Color;
use crate::domain::series::{Series, SeriesCollection};
use crate::domain::window::ChartWindow;
use serde::Serialize;

pub const TITLE: &str = "Health insights";
pub const HEADLINE: &str = "Vitals";
pub const SUMMARY: &str =
    "Your average body temperature is less than yesterday and your heart rate is nearly the same.";
pub const FOOTER: &str = "This view is showing real-time data from the paired device. \
    To restart this walkthrough, stop and start the service.";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum InsightView {
    Loading,
    Ready(ChartView),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub title: &'static str,
    pub headline: &'static str,
    pub summary: &'static str,
    pub footer: &'static str,
    pub window: ChartWindow,
    pub data_sets: Vec<DataSetView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetView {
    pub item_id: String,
    pub label: String,
    pub config: DataSetConfig,
    pub values: Vec<PointView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataSetConfig {
    pub color: Color,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PointView {
    pub x: u64,
    pub y: f64,
}

impl InsightView {
    /// Loading until a device is paired and at least one series exists
    pub fn build(has_device: bool, snapshot: &SeriesCollection, window: ChartWindow) -> Self {
        if !has_device || snapshot.is_empty() {
            return InsightView::Loading;
        }

        InsightView::Ready(ChartView {
            title: TITLE,
            headline: HEADLINE,
            summary: SUMMARY,
            footer: FOOTER,
            window,
            data_sets: snapshot.iter().map(|s| data_set(s)).collect(),
        })
    }
}

fn data_set(series: &Series) -> DataSetView {
    DataSetView {
        item_id: series.item_id.clone(),
        label: series.label.clone(),
        config: DataSetConfig {
            color: series.color,
        },
        values: series
            .values
            .iter()
            .map(|p| PointView { x: p.x, y: p.y })
            .collect(),
    }
}
