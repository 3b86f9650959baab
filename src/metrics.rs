//! Process-wide metrics observer for the pipeline stages.
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_pre_hydrate(&self, latency: Duration);
    fn record_validation(&self, latency: Duration, violations: usize);
    fn record_post_commit(&self, latency: Duration, linked: usize, failed: usize);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_pre_hydrate(self) {
        self.recorder.record_pre_hydrate(self.start.elapsed());
    }

    pub(crate) fn record_validation(self, violations: usize) {
        self.recorder
            .record_validation(self.start.elapsed(), violations);
    }

    pub(crate) fn record_post_commit(self, linked: usize, failed: usize) {
        self.recorder
            .record_post_commit(self.start.elapsed(), linked, failed);
    }
}
