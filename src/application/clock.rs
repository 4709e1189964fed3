// Session clock - single source of "now" and "start"
use crate::domain::window::ChartWindow;
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Elapsed time since session start. The accumulator and the chart window
/// must read the same instance or points drift out of the window.
#[derive(Clone)]
pub struct SessionClock {
    clock: Arc<dyn Clock>,
    start: DateTime<Utc>,
}

impl SessionClock {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let start = clock.now();
        Self { clock, start }
    }

    pub fn restart(&mut self) {
        self.start = self.clock.now();
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Milliseconds since start, clamped at zero if the wall clock stepped back.
    pub fn elapsed_ms(&self) -> u64 {
        let elapsed = (self.clock.now() - self.start).num_milliseconds();
        u64::try_from(elapsed).unwrap_or(0)
    }

    pub fn window(&self) -> ChartWindow {
        ChartWindow::new(self.start, self.elapsed_ms())
    }
}
