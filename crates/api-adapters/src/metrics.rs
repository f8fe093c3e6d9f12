//! Prometheus counters for page-load resolution.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::{EncodeLabelSet, EncodeLabelValue};
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

use services::PageLoadError;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, EncodeLabelValue)]
pub enum Outcome {
    Resolved,
    ProvisioningFailure,
    ResolutionExhausted,
    BackendError,
}

impl Outcome {
    pub fn of(result: &Result<(), PageLoadError>) -> Self {
        match result {
            Ok(()) => Outcome::Resolved,
            Err(PageLoadError::ProvisioningFailure { .. }) => Outcome::ProvisioningFailure,
            Err(PageLoadError::ResolutionExhausted { .. }) => Outcome::ResolutionExhausted,
            Err(PageLoadError::Store(_)) => Outcome::BackendError,
        }
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct OutcomeLabels {
    pub outcome: Outcome,
}

pub struct PageLoadMetrics {
    registry: Registry,
    page_loads: Family<OutcomeLabels, Counter>,
    active_updates: Counter,
}

impl PageLoadMetrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("forum");
        let page_loads = Family::<OutcomeLabels, Counter>::default();
        let active_updates = Counter::default();

        registry.register(
            "page_loads",
            "Page-load resolutions by outcome",
            page_loads.clone(),
        );
        registry.register(
            "active_updates",
            "Page loads that invalidated the online users snapshot",
            active_updates.clone(),
        );

        Self {
            registry,
            page_loads,
            active_updates,
        }
    }

    pub fn record(&self, outcome: Outcome) {
        self.page_loads
            .get_or_create(&OutcomeLabels { outcome })
            .inc();
    }

    pub fn record_active_update(&self) {
        self.active_updates.inc();
    }

    pub fn page_loads(&self, outcome: Outcome) -> u64 {
        self.page_loads
            .get_or_create(&OutcomeLabels { outcome })
            .get()
    }

    /// OpenMetrics text exposition.
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

impl Default for PageLoadMetrics {
    fn default() -> Self {
        Self::new()
    }
}
