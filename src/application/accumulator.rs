// Live series accumulator - turns samples into chart-ready snapshots
use crate::application::clock::SessionClock;
use crate::domain::color::ColorPicker;
use crate::domain::error::InsightError;
use crate::domain::sample::Sample;
use crate::domain::series::{Point, Series, SeriesCollection};
use std::sync::Arc;

pub struct LiveSeriesAccumulator {
    clock: SessionClock,
    colors: Box<dyn ColorPicker>,
    snapshot: Arc<SeriesCollection>,
}

impl LiveSeriesAccumulator {
    pub fn new(clock: SessionClock, colors: Box<dyn ColorPicker>) -> Self {
        Self {
            clock,
            colors,
            snapshot: Arc::new(SeriesCollection::new()),
        }
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn snapshot(&self) -> Arc<SeriesCollection> {
        self.snapshot.clone()
    }

    /// Start a new session: time zero is now and no series exist.
    pub fn reset(&mut self) {
        self.clock.restart();
        self.snapshot = Arc::new(SeriesCollection::new());
    }

    /// Append `sample` to its series, creating the series on first sight.
    /// Previously returned snapshots are never modified.
    pub fn ingest(&mut self, sample: &Sample) -> Result<Arc<SeriesCollection>, InsightError> {
        if sample.item_id.is_empty() {
            return Err(InsightError::InvalidSample("empty item id".to_string()));
        }

        let point = Point::new(self.clock.elapsed_ms(), sample.value);

        let next = match self.snapshot.with_point(&sample.item_id, point) {
            Some(next) => next,
            None => {
                let series = Series::new(
                    sample.item_id.clone(),
                    sample.display_label().to_string(),
                    self.colors.next_color(),
                    point,
                );
                tracing::debug!(
                    "New series {} labelled {:?} with color {}",
                    series.item_id,
                    series.label,
                    series.color
                );
                self.snapshot.with_series(series)
            }
        };

        self.snapshot = Arc::new(next);
        Ok(self.snapshot.clone())
    }
}
