//! Integration tests for the catalog graph store: resynchronization,
//! pruning, reader atomicity and persistence.

mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::*;
use sensorweb_harvest::catalog::CatalogStore;
use sensorweb_harvest::constellation::{ServiceMetadata, ServiceNode};
use sensorweb_harvest::db;
use sensorweb_harvest::error::CatalogError;
use sensorweb_harvest::graph::{Graph, Term};
use sensorweb_harvest::migrate;
use sensorweb_harvest::persistence::{InMemoryPersistence, ModelPersistence};
use sensorweb_harvest::sqlite_persistence::SqliteModelPersistence;
use sensorweb_harvest::vocab::{dcat, dct, rdf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn issued(graph: &Graph, subject: &Term) -> Vec<Term> {
    graph
        .objects(subject, dct::ISSUED)
        .into_iter()
        .cloned()
        .collect()
}

fn modified(graph: &Graph, subject: &Term) -> Vec<Term> {
    graph
        .objects(subject, dct::MODIFIED)
        .into_iter()
        .cloned()
        .collect()
}

#[tokio::test]
async fn test_issued_is_preserved_and_modified_advances() {
    let (catalog, _) = memory_catalog().await;
    let caps = capabilities(vec![offering("O1", &["P1"])]);
    let dataset = Term::iri(URL);

    let first = catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    assert!(!first.resynchronized);
    let graph = catalog.model().await;
    let issued_1 = issued(&graph, &dataset);
    let modified_1 = modified(&graph, &dataset);
    assert_eq!(issued_1.len(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;

    let second = catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    assert!(second.resynchronized);
    let graph = catalog.model().await;
    assert_eq!(issued(&graph, &dataset), issued_1);
    let modified_2 = modified(&graph, &dataset);
    assert_eq!(modified_2.len(), 1);
    assert!(modified_2[0].lexical() > modified_1[0].lexical());
}

#[tokio::test]
async fn test_catalog_text_carries_configured_language() {
    let (catalog, _) = memory_catalog().await;
    let root = catalog.catalog().await;
    let graph = catalog.model().await;
    assert_eq!(
        graph.first_object(&root, dct::TITLE),
        Some(&Term::lang_literal("Sensor Catalog", Some("en")))
    );
    assert_eq!(
        graph.first_object(&root, dct::DESCRIPTION),
        Some(&Term::lang_literal("Harvested sensor services", Some("en")))
    );

    let mut properties = catalog_properties();
    properties.language = None;
    let untagged = CatalogStore::init(&properties, api(), Arc::new(InMemoryPersistence::new()))
        .await
        .unwrap();
    let root = untagged.catalog().await;
    assert_eq!(
        untagged.model().await.first_object(&root, dct::TITLE),
        Some(&Term::literal("Sensor Catalog"))
    );
}

#[tokio::test]
async fn test_catalog_modified_is_refreshed() {
    let (catalog, _) = memory_catalog().await;
    let root = catalog.catalog().await;
    let before = modified(&catalog.model().await, &root);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let caps = capabilities(vec![offering("O1", &["P1"])]);
    catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();

    let graph = catalog.model().await;
    let after = modified(&graph, &root);
    assert_eq!(after.len(), 1);
    assert!(after[0].lexical() > before[0].lexical());
    assert_eq!(issued(&graph, &root).len(), 1);
}

#[tokio::test]
async fn test_resync_is_idempotent_and_prunes_stale_statements() {
    let (catalog, _) = memory_catalog().await;
    let dataset = Term::iri(URL);

    let wide = capabilities(vec![offering("O1", &["P1"]), offering("O2", &["P2"])]);
    catalog
        .on_harvest_result(&constellation("S", URL, &wide))
        .await
        .unwrap();
    let graph = catalog.model().await;
    assert!(graph
        .objects(&dataset, dcat::KEYWORD)
        .contains(&&Term::literal("O2")));
    let wide_len = graph.len();

    catalog
        .on_harvest_result(&constellation("S", URL, &wide))
        .await
        .unwrap();
    assert_eq!(catalog.model().await.len(), wide_len);

    let narrow = capabilities(vec![offering("O1", &["P1"])]);
    let summary = catalog
        .on_harvest_result(&constellation("S", URL, &narrow))
        .await
        .unwrap();
    assert!(summary.removed > 0);
    let graph = catalog.model().await;
    assert!(!graph
        .objects(&dataset, dcat::KEYWORD)
        .contains(&&Term::literal("O2")));
    assert!(graph.len() < wide_len);
    assert_eq!(graph.objects(&dataset, dcat::DISTRIBUTION_PROP).len(), 2);
}

#[tokio::test]
async fn test_resync_keeps_other_services() {
    let (catalog, _) = memory_catalog().await;
    let other = "https://other.example.org/sos";
    let caps = capabilities(vec![offering("O1", &["P1"])]);

    catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    catalog
        .on_harvest_result(&constellation("T", other, &caps))
        .await
        .unwrap();
    let other_before: Vec<_> = catalog
        .model()
        .await
        .statements_about(&Term::iri(other))
        .cloned()
        .collect();

    catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    let graph = catalog.model().await;
    let other_after: Vec<_> = graph.statements_about(&Term::iri(other)).cloned().collect();
    assert_eq!(other_before.len(), other_after.len());
    assert_eq!(catalog.datasets().await.len(), 2);
}

#[tokio::test]
async fn test_remove_service_sweeps_dataset_only() {
    let (catalog, _) = memory_catalog().await;
    let caps = capabilities(vec![offering("O1", &["P1"])]);
    let c = constellation("S", URL, &caps);
    let before_sync = catalog.model().await;

    catalog.on_harvest_result(&c).await.unwrap();
    let removed = catalog.remove_service(c.service()).await.unwrap();
    assert!(removed > 0);

    let graph = catalog.model().await;
    let root = catalog.catalog().await;
    assert!(graph.statements_about(&Term::iri(URL)).next().is_none());
    assert!(catalog.datasets().await.is_empty());
    assert_eq!(
        graph.first_object(&root, dct::TITLE),
        Some(&Term::lang_literal("Sensor Catalog", Some("en")))
    );
    assert_eq!(graph.namespaces(), before_sync.namespaces());
    assert_eq!(graph.len(), before_sync.len());

    assert_eq!(catalog.remove_service(c.service()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_undecodable_metadata_leaves_graph_untouched() {
    let (catalog, persistence) = memory_catalog().await;
    let writes = persistence.writes();
    let before = catalog.model().await.len();

    let mut c = constellation("S", URL, &capabilities(vec![]));
    let service = ServiceNode {
        metadata: ServiceMetadata::json("<Capabilities/>"),
        ..c.service().clone()
    };
    c = sensorweb_harvest::constellation::ServiceConstellation::new(service);

    let err = catalog.on_harvest_result(&c).await.unwrap_err();
    assert!(matches!(err, CatalogError::Decoding(_)));
    assert_eq!(catalog.model().await.len(), before);
    assert_eq!(persistence.writes(), writes);
}

/// Persistence whose writes fail once `broken` is set.
struct BrokenPersistence {
    inner: InMemoryPersistence,
    broken: AtomicBool,
}

#[async_trait]
impl ModelPersistence for BrokenPersistence {
    async fn read(&self) -> Result<Option<Graph>> {
        self.inner.read().await
    }

    async fn write(&self, graph: &Graph) -> Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            anyhow::bail!("disk full");
        }
        self.inner.write(graph).await
    }
}

#[tokio::test]
async fn test_storage_failure_is_surfaced_without_rollback() {
    let persistence = Arc::new(BrokenPersistence {
        inner: InMemoryPersistence::new(),
        broken: AtomicBool::new(false),
    });
    let catalog = CatalogStore::init(&catalog_properties(), api(), persistence.clone())
        .await
        .unwrap();
    persistence.broken.store(true, Ordering::SeqCst);

    let caps = capabilities(vec![offering("O1", &["P1"])]);
    let err = catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Persistence(_)));
    assert_eq!(catalog.datasets().await, vec![URL.to_string()]);

    persistence.broken.store(false, Ordering::SeqCst);
    catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    let stored = persistence.inner.stored().unwrap();
    assert_eq!(stored.len(), catalog.model().await.len());
}

#[tokio::test]
async fn test_snapshots_never_observe_partial_rewrites() {
    let (catalog, _) = memory_catalog().await;
    let caps = capabilities(vec![offering("O1", &["P1"]), offering("O2", &["P2"])]);
    catalog
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    let expected = catalog.model().await.len();

    let writer = {
        let catalog = catalog.clone();
        let caps = caps.clone();
        tokio::spawn(async move {
            for _ in 0..25 {
                catalog
                    .on_harvest_result(&constellation("S", URL, &caps))
                    .await
                    .unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let mut readers = Vec::new();
    for _ in 0..4 {
        let catalog = catalog.clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..50 {
                let graph = catalog.model().await;
                let dataset = Term::iri(URL);
                assert_eq!(graph.len(), expected);
                assert_eq!(graph.objects(&dataset, dcat::DISTRIBUTION_PROP).len(), 2);
                assert_eq!(graph.objects(&dataset, dct::ISSUED).len(), 1);
                assert_eq!(graph.objects(&dataset, dct::MODIFIED).len(), 1);
                tokio::task::yield_now().await;
            }
        }));
    }

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }
}

#[tokio::test]
async fn test_sqlite_round_trip_across_init() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("data").join("catalog.sqlite");
    let caps = capabilities(vec![offering("O1", &["P1"])]);

    let (root, graph) = {
        let pool = db::connect_path(&path).await.unwrap();
        migrate::migrate_pool(&pool).await.unwrap();
        let persistence = Arc::new(SqliteModelPersistence::new(pool.clone()));
        let catalog = CatalogStore::init(&catalog_properties(), api(), persistence)
            .await
            .unwrap();
        catalog
            .on_harvest_result(&constellation("S", URL, &caps))
            .await
            .unwrap();
        let out = (catalog.catalog().await, catalog.model().await);
        pool.close().await;
        out
    };

    let pool = db::connect_path(&path).await.unwrap();
    migrate::migrate_pool(&pool).await.unwrap();
    let persistence = Arc::new(SqliteModelPersistence::new(pool));
    let reopened = CatalogStore::init(&catalog_properties(), api(), persistence)
        .await
        .unwrap();

    assert_eq!(reopened.catalog().await, root);
    let loaded = reopened.model().await;
    assert_eq!(loaded.len(), graph.len());
    assert_eq!(loaded.namespaces(), graph.namespaces());
    let dataset = Term::iri(URL);
    assert_eq!(issued(&loaded, &dataset), issued(&graph, &dataset));
    assert_eq!(
        loaded.subjects_with(rdf::TYPE, &Term::iri(dcat::CATALOG)).len(),
        1
    );

    let summary = reopened
        .on_harvest_result(&constellation("S", URL, &caps))
        .await
        .unwrap();
    assert!(summary.resynchronized);
    assert_eq!(issued(&reopened.model().await, &dataset), issued(&graph, &dataset));
}
