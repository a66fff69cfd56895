//! Catalog graph store.
//!
//! A [`CatalogStore`] owns the process-wide catalog graph behind a single
//! reader/writer lock. The graph is rooted at one `dcat:Catalog` resource;
//! every harvested service is described by one `dcat:Dataset` resource,
//! identified by the service URL and linked from the catalog.
//!
//! # Synchronization
//!
//! [`CatalogStore::on_harvest_result`] decodes the service metadata first,
//! then takes the write lock for the whole sequence:
//!
//! 1. refresh the catalog's `dct:modified`
//! 2. remember the dataset's `dct:issued`, if it was described before
//! 3. unlink catalog → dataset and sweep everything no longer reachable
//!    from the catalog
//! 4. rebuild the dataset description and link it again
//! 5. restore `dct:issued` (or stamp it), stamp `dct:modified`
//! 6. write the graph to the persistence backend
//!
//! Readers only ever see a cloned snapshot taken under the read lock, so
//! they observe the graph either before step 1 or after step 6.
//!
//! A failed write in step 6 is returned to the caller. The in-memory graph
//! keeps the new state; the next successful sync persists it again.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::CatalogProperties;
use crate::constellation::{ServiceConstellation, ServiceNode};
use crate::dcat::{format_time, resource_or_literal, ApiEndpoint, DatasetWriter};
use crate::error::CatalogError;
use crate::graph::{Graph, Term};
use crate::models::Capabilities;
use crate::persistence::ModelPersistence;
use crate::vocab::{dcat, dct, foaf, rdf, xsd, DEFAULT_PREFIXES};

struct CatalogState {
    graph: Graph,
    catalog: Term,
}

/// Outcome of synchronizing one service into the catalog.
#[derive(Debug, Clone)]
pub struct SyncSummary {
    /// IRI of the dataset resource.
    pub dataset: String,
    /// `false` when the service was described for the first time.
    pub resynchronized: bool,
    /// Statements swept from the graph before the rebuild.
    pub removed: usize,
    /// Statements in the graph afterwards.
    pub statements: usize,
}

pub struct CatalogStore {
    state: RwLock<CatalogState>,
    persistence: Arc<dyn ModelPersistence>,
    api: ApiEndpoint,
}

fn timestamp_now() -> Term {
    Term::typed_literal(format_time(&Utc::now()), xsd::DATE_TIME)
}

fn set_single(graph: &mut Graph, subject: &Term, predicate: &str, object: Term) {
    graph.remove_matching(Some(subject), Some(predicate), None);
    graph.add(subject, predicate, object);
}

fn create_catalog(graph: &mut Graph, properties: &CatalogProperties) -> Term {
    let catalog = graph.create_typed(dcat::CATALOG);
    let language = properties.language.as_deref();
    if let Some(title) = &properties.title {
        graph.add(&catalog, dct::TITLE, Term::lang_literal(title.as_str(), language));
    }
    if let Some(description) = &properties.description {
        let description = Term::lang_literal(description.as_str(), language);
        graph.add(&catalog, dct::DESCRIPTION, description);
    }
    if let Some(language) = &properties.language {
        graph.add(&catalog, dct::LANGUAGE, Term::literal(language.as_str()));
    }
    if let Some(publisher) = &properties.publisher {
        let organization = graph.create_typed(foaf::ORGANIZATION);
        graph.add(&organization, foaf::NAME, Term::literal(publisher.as_str()));
        graph.add(&catalog, dct::PUBLISHER, organization);
    }
    if let Some(homepage) = &properties.homepage {
        graph.add(&catalog, foaf::HOMEPAGE, resource_or_literal(homepage));
    }
    if let Some(license) = &properties.license {
        graph.add(&catalog, dct::LICENSE, resource_or_literal(license));
    }
    let now = timestamp_now();
    graph.add(&catalog, dct::ISSUED, now.clone());
    graph.add(&catalog, dct::MODIFIED, now);
    catalog
}

impl CatalogStore {
    /// Load the catalog graph from `persistence`, or create a fresh one.
    ///
    /// The catalog resource is looked up by type; when none exists it is
    /// created from `properties` and the graph is written back once.
    pub async fn init(
        properties: &CatalogProperties,
        api: ApiEndpoint,
        persistence: Arc<dyn ModelPersistence>,
    ) -> Result<Self, CatalogError> {
        let stored = persistence
            .read()
            .await
            .map_err(CatalogError::Persistence)?;

        let mut graph = match stored {
            Some(graph) => graph,
            None => {
                let mut graph = Graph::new();
                for (prefix, iri) in DEFAULT_PREFIXES {
                    graph.set_namespace(prefix, iri);
                }
                graph
            }
        };

        let existing = graph
            .subjects_with(rdf::TYPE, &Term::iri(dcat::CATALOG))
            .first()
            .map(|t| (*t).clone());
        let catalog = match existing {
            Some(catalog) => {
                debug!(statements = graph.len(), "loaded catalog graph");
                catalog
            }
            None => {
                let catalog = create_catalog(&mut graph, properties);
                persistence
                    .write(&graph)
                    .await
                    .map_err(CatalogError::Persistence)?;
                info!("created catalog resource");
                catalog
            }
        };

        Ok(Self {
            state: RwLock::new(CatalogState { graph, catalog }),
            persistence,
            api,
        })
    }

    pub fn api(&self) -> &ApiEndpoint {
        &self.api
    }

    /// Replace the description of the constellation's service.
    pub async fn on_harvest_result(
        &self,
        constellation: &ServiceConstellation,
    ) -> Result<SyncSummary, CatalogError> {
        let service = constellation.service();
        let capabilities: Capabilities = serde_json::from_str(&service.metadata.document)
            .map_err(|e| CatalogError::Decoding(format!("{}: {}", service.url, e)))?;

        let mut state = self.state.write().await;
        let CatalogState { graph, catalog } = &mut *state;
        let catalog = &*catalog;

        set_single(graph, catalog, dct::MODIFIED, timestamp_now());

        let dataset = Term::iri(service.url.as_str());
        let issued = graph.first_object(&dataset, dct::ISSUED).cloned();

        graph.remove_matching(Some(catalog), Some(dcat::DATASET_PROP), Some(&dataset));
        let removed = graph.retain_reachable(catalog);

        graph.create_resource(&service.url, dcat::DATASET);
        {
            let mut writer = DatasetWriter::new(graph, dataset.clone(), &capabilities);
            writer.add_identifiers(service);
            writer.add_description();
            writer.add_distributions(service, &self.api);
        }
        graph.add(catalog, dcat::DATASET_PROP, dataset.clone());

        let resynchronized = issued.is_some();
        set_single(graph, &dataset, dct::ISSUED, issued.unwrap_or_else(timestamp_now));
        set_single(graph, &dataset, dct::MODIFIED, timestamp_now());

        let summary = SyncSummary {
            dataset: service.url.clone(),
            resynchronized,
            removed,
            statements: graph.len(),
        };

        self.persistence
            .write(graph)
            .await
            .map_err(CatalogError::Persistence)?;

        info!(
            service = %service.name,
            datasets = constellation.dataset_count(),
            removed = summary.removed,
            statements = summary.statements,
            "synchronized catalog"
        );
        Ok(summary)
    }

    /// Drop a service's dataset and everything only it referenced.
    ///
    /// Returns the number of statements removed; zero if the service was
    /// never described.
    pub async fn remove_service(&self, service: &ServiceNode) -> Result<usize, CatalogError> {
        let mut state = self.state.write().await;
        let CatalogState { graph, catalog } = &mut *state;
        let catalog = &*catalog;

        let dataset = Term::iri(service.url.as_str());
        let unlinked = graph.remove_matching(Some(catalog), Some(dcat::DATASET_PROP), Some(&dataset));
        if unlinked == 0 {
            return Ok(0);
        }
        let removed = graph.retain_reachable(catalog) + unlinked;
        set_single(graph, catalog, dct::MODIFIED, timestamp_now());

        self.persistence
            .write(graph)
            .await
            .map_err(CatalogError::Persistence)?;
        info!(service = %service.name, removed, "removed service from catalog");
        Ok(removed)
    }

    /// An independent copy of the current graph.
    pub async fn model(&self) -> Graph {
        self.state.read().await.graph.clone()
    }

    pub async fn catalog(&self) -> Term {
        self.state.read().await.catalog.clone()
    }

    /// IRIs of the datasets linked from the catalog.
    pub async fn datasets(&self) -> Vec<String> {
        let state = self.state.read().await;
        state
            .graph
            .objects(&state.catalog, dcat::DATASET_PROP)
            .into_iter()
            .map(|t| t.lexical().to_string())
            .collect()
    }
}
