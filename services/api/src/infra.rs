use agency_locator::config::{self, PipelineConfig};
use agency_locator::workflows::addresses::ConsolidationStrategy;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) pipeline: PipelineConfig,
}

pub(crate) fn parse_threshold(raw: &str) -> Result<f64, String> {
    config::parse_threshold(raw).map_err(|err| err.to_string())
}

pub(crate) fn parse_consolidation(raw: &str) -> Result<ConsolidationStrategy, String> {
    raw.parse::<ConsolidationStrategy>()
        .map_err(|err| err.to_string())
}

#[cfg(test)]
pub(crate) fn state_for_tests(ready: bool) -> AppState {
    use metrics_exporter_prometheus::PrometheusBuilder;

    AppState {
        readiness: Arc::new(AtomicBool::new(ready)),
        metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        pipeline: PipelineConfig::default(),
    }
}
