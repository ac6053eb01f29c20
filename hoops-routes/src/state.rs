use crate::metrics;
use crate::service::HoopService;
use axum::extract::FromRef;
use error_stack::{Report, ResultExt};
use hoops_core::HoopEngine;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct HoopAppState<T: HoopEngine> {
    pub service: HoopService<T>,
    pub metrics: Option<PrometheusHandle>,
}

pub type StateResult<T> = Result<T, Report<StateErr>>;

#[derive(Debug, thiserror::Error)]
#[error("failed to initialize app state")]
pub struct StateErr;

impl<T: HoopEngine> HoopAppState<T> {
    /// Installs the global Prometheus recorder, so this can only succeed once per process.
    pub fn new_with_metrics(engine: T) -> StateResult<Self> {
        let handle = metrics::setup_recorder().change_context(StateErr)?;
        Ok(Self::new(engine, Some(handle)))
    }

    pub fn new_without_metrics(engine: T) -> Self {
        Self::new(engine, None)
    }

    #[instrument(skip_all, fields(metrics_enabled = metrics.is_some()))]
    fn new(engine: T, metrics: Option<PrometheusHandle>) -> Self {
        info!("creating new hoop state");
        Self {
            service: HoopService::new(engine),
            metrics,
        }
    }
}

impl<T: HoopEngine> FromRef<HoopAppState<T>> for HoopService<T> {
    fn from_ref(input: &HoopAppState<T>) -> Self {
        input.service.clone()
    }
}
