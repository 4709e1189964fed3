// Live time series domain models
use crate::domain::color::Color;
use std::sync::Arc;

/// A single chart point: `x` is milliseconds since session start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: u64,
    pub y: f64,
}

impl Point {
    pub fn new(x: u64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One metric's accumulated points plus display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub item_id: String,
    pub label: String,
    pub color: Color,
    pub values: Vec<Point>,
}

impl Series {
    pub fn new(item_id: String, label: String, color: Color, first: Point) -> Self {
        Self {
            item_id,
            label,
            color,
            values: vec![first],
        }
    }

    fn appended(&self, point: Point) -> Self {
        let mut values = Vec::with_capacity(self.values.len() + 1);
        values.extend_from_slice(&self.values);
        values.push(point);
        Self {
            item_id: self.item_id.clone(),
            label: self.label.clone(),
            color: self.color,
            values,
        }
    }
}

/// All series of a session, in first-seen order.
///
/// Collections are never mutated once published. Each update builds a new
/// collection that shares every untouched `Series` with its predecessor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesCollection {
    series: Vec<Arc<Series>>,
}

impl SeriesCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Series>> {
        self.series.iter()
    }

    /// New collection with `point` appended to the series `item_id`.
    /// Returns `None` when no such series exists.
    pub fn with_point(&self, item_id: &str, point: Point) -> Option<Self> {
        let idx = self.series.iter().position(|s| s.item_id == item_id)?;
        let mut series = self.series.clone();
        series[idx] = Arc::new(self.series[idx].appended(point));
        Some(Self { series })
    }

    /// New collection with `series` added at the end.
    pub fn with_series(&self, series: Series) -> Self {
        let mut all = Vec::with_capacity(self.series.len() + 1);
        all.extend(self.series.iter().cloned());
        all.push(Arc::new(series));
        Self { series: all }
    }
}

#[cfg(test)]
impl SeriesCollection {
    pub fn get(&self, item_id: &str) -> Option<&Arc<Series>> {
        self.series.iter().find(|s| s.item_id == item_id)
    }
}
