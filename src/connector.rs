//! Connector trait and registry.
//!
//! A connector harvests one dialect of sensor observation service. The
//! [`ConnectorRegistry`] holds the connectors in registration order and
//! dispatches a capabilities document to the first one whose
//! [`can_handle`](SosConnector::can_handle) predicate accepts it. The
//! built-in predicates are mutually exclusive, so registration order only
//! matters for connectors added on top of them.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               ConnectorRegistry               │
//! │  ┌────────┐ ┌─────────────┐ ┌────────┐ ┌────┐ │
//! │  │ sos2   │ │ sos2-profile│ │ sos1   │ │ …  │ │
//! │  └────────┘ └─────────────┘ └────────┘ └────┘ │
//! └──────────────────────┬────────────────────────┘
//!                        ▼
//!       dispatch(config, capabilities) → connector
//!                        ▼
//!       get_constellation() → CatalogStore::on_harvest_result()
//! ```
//!
//! The same connector later answers value queries for the datasets it
//! harvested; see [`ValueRepository`](crate::values::ValueRepository).

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::client::{SosClient, TemporalFilter};
use crate::config::DataSourceConfiguration;
use crate::connector_sos::{Sos1Connector, Sos2Connector, Sos2ProfileConnector};
use crate::constellation::{ServiceConstellation, Unit};
use crate::error::HarvestError;
use crate::models::{GetCapabilitiesResponse, Observation};
use crate::progress::{HarvestProgressEvent, HarvestProgressReporter, NoProgress};
use crate::values::{DatasetEntity, DbQuery};

/// Shared flag that abandons a harvest pass between procedures.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Per-pass collaborators handed to [`SosConnector::get_constellation`].
#[derive(Clone)]
pub struct HarvestContext {
    pub cancel: CancellationFlag,
    pub progress: Arc<dyn HarvestProgressReporter>,
}

impl HarvestContext {
    pub fn new(cancel: CancellationFlag, progress: Arc<dyn HarvestProgressReporter>) -> Self {
        Self { cancel, progress }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn report(&self, event: HarvestProgressEvent) {
        self.progress.report(event);
    }
}

impl Default for HarvestContext {
    fn default() -> Self {
        Self::new(CancellationFlag::new(), Arc::new(NoProgress))
    }
}

/// Counters of one harvest pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestReport {
    pub offerings: u64,
    pub procedures_ok: u64,
    pub procedures_failed: u64,
    /// Remote requests issued while building the constellation.
    pub requests: u64,
}

/// Result of a successful harvest pass.
#[derive(Debug, Clone)]
pub struct Harvest {
    pub constellation: ServiceConstellation,
    pub report: HarvestReport,
}

/// A protocol-specific harvesting strategy.
///
/// # Lifecycle
///
/// 1. Registered via [`ConnectorRegistry::register`].
/// 2. [`can_handle`](SosConnector::can_handle) is evaluated against a
///    source's capabilities; the first accepting connector is bound to the
///    source for the lifetime of its configuration.
/// 3. [`get_constellation`](SosConnector::get_constellation) runs every
///    harvest pass.
/// 4. The value methods serve queries for datasets whose recorded
///    connector name equals [`name`](SosConnector::name). They have
///    default bodies issuing observation requests through
///    [`client`](SosConnector::client).
#[async_trait]
pub trait SosConnector: Send + Sync {
    /// Registry key, recorded on every dataset the connector harvests.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn can_handle(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
    ) -> bool;

    /// Walk the service and build its constellation.
    ///
    /// Failures of single procedures are logged and counted in the
    /// report; only cancellation and document-level problems fail the pass.
    async fn get_constellation(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
        context: &HarvestContext,
    ) -> Result<Harvest, HarvestError>;

    /// Client the value queries go through.
    fn client(&self) -> &dyn SosClient;

    async fn get_observations(
        &self,
        dataset: &DatasetEntity,
        query: &DbQuery,
    ) -> Result<Vec<Observation>> {
        query_observations(self.client(), dataset, query.temporal_filter()).await
    }

    /// Earliest observation of the series. Without first/last support the
    /// service is asked for the sampling start instant.
    async fn get_first_observation(&self, dataset: &DatasetEntity) -> Result<Option<Observation>> {
        let filter = if dataset.supports_first_last {
            Some(TemporalFilter::First)
        } else {
            dataset.sampling_time_start.map(TemporalFilter::At)
        };
        let observations = query_observations(self.client(), dataset, filter).await?;
        Ok(observations.into_iter().min_by_key(|o| o.phenomenon_time))
    }

    async fn get_last_observation(&self, dataset: &DatasetEntity) -> Result<Option<Observation>> {
        let filter = if dataset.supports_first_last {
            Some(TemporalFilter::Latest)
        } else {
            dataset.sampling_time_end.map(TemporalFilter::At)
        };
        let observations = query_observations(self.client(), dataset, filter).await?;
        Ok(observations.into_iter().max_by_key(|o| o.phenomenon_time))
    }

    /// Unit the service reports on the first value of the series, or the
    /// unit recorded at harvest time when that observation carries none.
    async fn get_unit_of_measure(&self, dataset: &DatasetEntity) -> Result<Unit> {
        let first = self.get_first_observation(dataset).await?;
        Ok(first
            .and_then(|o| o.unit)
            .map(Unit::new)
            .unwrap_or_else(|| dataset.unit.clone()))
    }
}

async fn query_observations(
    client: &dyn SosClient,
    dataset: &DatasetEntity,
    filter: Option<TemporalFilter>,
) -> Result<Vec<Observation>> {
    let mut request = dataset.request();
    request.temporal_filter = filter;
    client
        .get_observation(&dataset.service_url, &request)
        .await
        .with_context(|| format!("observations of dataset {}", dataset.id))
}

/// Ordered set of connectors.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use sensorweb_harvest::client_snapshot::SnapshotClient;
/// use sensorweb_harvest::connector::ConnectorRegistry;
///
/// let registry = ConnectorRegistry::with_builtins(Arc::new(SnapshotClient::new()));
/// assert!(registry.find("sos2").is_some());
/// ```
#[derive(Clone, Default)]
pub struct ConnectorRegistry {
    connectors: Vec<Arc<dyn SosConnector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: Vec::new(),
        }
    }

    /// Registry with the SOS 2.0, SOS 2.0 profile and SOS 1.0 connectors.
    pub fn with_builtins(client: Arc<dyn SosClient>) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(Sos2Connector::new(client.clone())));
        registry.register(Arc::new(Sos2ProfileConnector::new(client.clone())));
        registry.register(Arc::new(Sos1Connector::new(client)));
        registry
    }

    pub fn register(&mut self, connector: Arc<dyn SosConnector>) {
        self.connectors.push(connector);
    }

    pub fn connectors(&self) -> &[Arc<dyn SosConnector>] {
        &self.connectors
    }

    pub fn find(&self, name: &str) -> Option<Arc<dyn SosConnector>> {
        self.connectors.iter().find(|c| c.name() == name).cloned()
    }

    /// The first connector accepting the capabilities.
    ///
    /// A configured connector selector restricts the candidates to the
    /// connector of that name.
    pub fn dispatch(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
    ) -> Result<Arc<dyn SosConnector>, HarvestError> {
        self.connectors
            .iter()
            .filter(|c| {
                config
                    .connector
                    .as_deref()
                    .map_or(true, |selected| c.name() == selected)
            })
            .find(|c| c.can_handle(config, capabilities))
            .cloned()
            .ok_or_else(|| HarvestError::UnsupportedService {
                source_name: config.item_name.clone(),
                url: config.url.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
