//! Harvest orchestration.
//!
//! One harvest pass over a source:
//!
//! 1. fetch and check the capabilities document
//! 2. resolve the connector (dispatched once, then bound to the source)
//! 3. let the connector build the constellation; no lock is held
//! 4. hand the finished constellation to the catalog store
//!
//! A pass that fails or is cancelled before step 4 leaves the catalog
//! untouched. [`Harvester::harvest_all`] runs one task per source against
//! the same catalog store.

use anyhow::{bail, Context};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, SyncSummary};
use crate::client::SosClient;
use crate::client_snapshot::SnapshotClient;
use crate::config::{Config, DataSourceConfiguration};
use crate::connector::{
    CancellationFlag, ConnectorRegistry, HarvestContext, HarvestReport, SosConnector,
};
use crate::dcat::ApiEndpoint;
use crate::error::HarvestError;
use crate::models::{Capabilities, GetCapabilitiesResponse};
use crate::progress::{HarvestProgressEvent, HarvestProgressReporter, NoProgress, ProgressMode};
use crate::sqlite_persistence::SqliteModelPersistence;
use crate::values::{dataset_entities, DatasetEntity, ValueRepository};
use crate::{db, migrate};

/// Result of a successful pass over one source.
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    pub source: String,
    pub connector: String,
    pub report: HarvestReport,
    pub sync: SyncSummary,
    pub datasets: Vec<DatasetEntity>,
}

pub struct Harvester {
    client: Arc<dyn SosClient>,
    registry: ConnectorRegistry,
    catalog: Arc<CatalogStore>,
    progress: Arc<dyn HarvestProgressReporter>,
    cancel: CancellationFlag,
    /// Source name → connector name.
    bindings: RwLock<HashMap<String, String>>,
}

impl Harvester {
    pub fn new(
        client: Arc<dyn SosClient>,
        registry: ConnectorRegistry,
        catalog: Arc<CatalogStore>,
    ) -> Self {
        Self {
            client,
            registry,
            catalog,
            progress: Arc::new(NoProgress),
            cancel: CancellationFlag::new(),
            bindings: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn HarvestProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    pub fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    /// Value queries routed over this harvester's connectors.
    pub fn values(&self) -> ValueRepository {
        ValueRepository::new(&self.registry)
    }

    /// Name of the connector bound to a source, once it was dispatched.
    pub async fn binding(&self, source: &str) -> Option<String> {
        self.bindings.read().await.get(source).cloned()
    }

    /// Forget a source's binding, e.g. after its configuration changed.
    pub async fn unbind(&self, source: &str) {
        self.bindings.write().await.remove(source);
    }

    async fn resolve_connector(
        &self,
        config: &DataSourceConfiguration,
        response: &GetCapabilitiesResponse,
    ) -> Result<Arc<dyn SosConnector>, HarvestError> {
        if let Some(name) = self.binding(&config.item_name).await {
            if let Some(connector) = self.registry.find(&name) {
                return Ok(connector);
            }
        }
        let connector = self.registry.dispatch(config, response)?;
        info!(source = %config.item_name, connector = connector.name(), "bound connector");
        self.bindings
            .write()
            .await
            .insert(config.item_name.clone(), connector.name().to_string());
        Ok(connector)
    }

    #[tracing::instrument(skip_all, fields(source = %config.item_name))]
    pub async fn harvest_source(
        &self,
        config: &DataSourceConfiguration,
    ) -> Result<HarvestOutcome, HarvestError> {
        self.progress.report(HarvestProgressEvent::Discovering {
            source: config.item_name.clone(),
        });

        let response = self
            .client
            .get_capabilities(&config.url)
            .await
            .map_err(HarvestError::Remote)?;
        serde_json::from_str::<Capabilities>(&response.metadata)
            .map_err(|e| HarvestError::Decoding(e.to_string()))?;

        let connector = self.resolve_connector(config, &response).await?;
        let context = HarvestContext::new(self.cancel.clone(), self.progress.clone());
        let harvest = connector
            .get_constellation(config, &response, &context)
            .await?;
        if self.cancel.is_cancelled() {
            return Err(HarvestError::Cancelled(config.item_name.clone()));
        }

        let sync = self.catalog.on_harvest_result(&harvest.constellation).await?;
        let datasets = dataset_entities(&harvest.constellation);
        self.progress.report(HarvestProgressEvent::Synchronized {
            source: config.item_name.clone(),
            datasets: datasets.len() as u64,
        });

        Ok(HarvestOutcome {
            source: config.item_name.clone(),
            connector: connector.name().to_string(),
            report: harvest.report,
            sync,
            datasets,
        })
    }

    /// Harvest every source concurrently, one task per source.
    ///
    /// Results come back in the order of `sources`.
    pub async fn harvest_all(
        self: &Arc<Self>,
        sources: Vec<DataSourceConfiguration>,
    ) -> Vec<(String, Result<HarvestOutcome, HarvestError>)> {
        let mut handles = Vec::with_capacity(sources.len());
        for source in sources {
            let harvester = Arc::clone(self);
            let name = source.item_name.clone();
            let handle = tokio::spawn(async move { harvester.harvest_source(&source).await });
            handles.push((name, handle));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (name, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => Err(HarvestError::Remote(anyhow::Error::new(e))),
            };
            if let Err(e) = &result {
                warn!(source = %name, error = %e, "harvest failed");
            }
            results.push((name, result));
        }
        results
    }
}

/// Open the persisted catalog named by the configuration.
pub async fn open_catalog(config: &Config) -> anyhow::Result<Arc<CatalogStore>> {
    let pool = db::connect(config).await?;
    migrate::migrate_pool(&pool).await?;
    let persistence = Arc::new(SqliteModelPersistence::new(pool));

    let mut api = ApiEndpoint::new(config.server.external_url.as_str());
    api.description = config.server.api_description.clone();

    let catalog = CatalogStore::init(&config.catalog, api, persistence).await?;
    Ok(Arc::new(catalog))
}

/// `swh harvest <source|all>`: harvest from the configured snapshots and
/// print one line per source.
pub async fn run_harvest(
    config: &Config,
    target: &str,
    progress: ProgressMode,
) -> anyhow::Result<()> {
    let sources = if target == "all" {
        config.enabled_sources()
    } else {
        let source = config
            .sources
            .get(target)
            .cloned()
            .with_context(|| format!("Unknown source: '{}'", target))?;
        vec![source]
    };
    if sources.is_empty() {
        println!("No enabled sources.");
        return Ok(());
    }

    let catalog = open_catalog(config).await?;
    let client: Arc<dyn SosClient> = Arc::new(SnapshotClient::from_config(config)?);
    let registry = ConnectorRegistry::with_builtins(client.clone());

    let cancel = CancellationFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    let harvester = Arc::new(
        Harvester::new(client, registry, catalog)
            .with_progress(Arc::from(progress.reporter()))
            .with_cancellation(cancel),
    );

    let total = sources.len();
    let results = harvester.harvest_all(sources).await;
    let mut failed = 0;
    for (name, result) in &results {
        match result {
            Ok(outcome) => println!(
                "{:<20} {:<14} {} datasets, {} procedures ok, {} failed",
                name,
                outcome.connector,
                outcome.datasets.len(),
                outcome.report.procedures_ok,
                outcome.report.procedures_failed
            ),
            Err(e) => {
                failed += 1;
                println!("{:<20} ERROR {}", name, e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} sources failed", failed, total);
    }
    Ok(())
}

/// `swh catalog`: print the persisted catalog graph as JSON.
pub async fn run_catalog(config: &Config) -> anyhow::Result<()> {
    let catalog = open_catalog(config).await?;
    let graph = catalog.model().await;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}
