use std::sync::Arc;

use crate::observability::AppMetrics;
use crate::store::AnalyticsStore;

/// Default look-back window for the daily trend endpoints.
pub const DEFAULT_TREND_WINDOW_DAYS: i64 = 30;

/// Largest look-back window accepted by the trend endpoints.
pub const MAX_TREND_WINDOW_DAYS: i64 = 365;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn AnalyticsStore>,
    pub metrics: Arc<AppMetrics>,
    pub trend_window_days: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn AnalyticsStore>) -> Self {
        Self {
            store,
            metrics: Arc::new(AppMetrics::new()),
            trend_window_days: DEFAULT_TREND_WINDOW_DAYS,
        }
    }

    pub fn with_trend_window(mut self, days: i64) -> Self {
        self.trend_window_days = days;
        self
    }
}
