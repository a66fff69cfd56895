//! Integration tests for the value repository bridge.

mod common;

use common::*;
use sensorweb_harvest::client::{SosClient, TemporalFilter};
use sensorweb_harvest::config::DataSourceConfiguration;
use sensorweb_harvest::connector::ConnectorRegistry;
use sensorweb_harvest::constellation::Unit;
use sensorweb_harvest::error::ValueError;
use sensorweb_harvest::harvest::Harvester;
use sensorweb_harvest::values::{DatasetEntity, DbQuery, ValueRepository};
use std::sync::Arc;

async fn harvested(supports_first_last: bool) -> (Harvester, DatasetEntity) {
    let mut snapshot = single_series_snapshot();
    snapshot.observations.push(observation("P1", "O1", 3, 3.5));
    let client: Arc<dyn SosClient> =
        Arc::new(FakeClient::new().with_service(URL, snapshot));
    let registry = ConnectorRegistry::with_builtins(client.clone());
    let (catalog, _) = memory_catalog().await;
    let harvester = Harvester::new(client, registry, catalog);

    let mut config = DataSourceConfiguration::new("S", URL);
    config.supports_first_last = supports_first_last;
    let outcome = harvester.harvest_source(&config).await.unwrap();
    let dataset = outcome.datasets.into_iter().next().unwrap();
    (harvester, dataset)
}

#[tokio::test]
async fn test_first_and_last_value() {
    let (harvester, dataset) = harvested(true).await;
    let values = harvester.values();

    let first = values
        .first_value(&dataset, &DbQuery::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.timestamp, day(1));
    assert_eq!(first.value, Some(1.5));
    assert_eq!(first.unit.as_deref(), Some("m"));

    let last = values
        .last_value(&dataset, &DbQuery::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.timestamp, day(3));
    assert_eq!(last.value, Some(3.5));
}

#[tokio::test]
async fn test_first_and_last_without_shortcuts_use_sampling_bounds() {
    let (harvester, dataset) = harvested(false).await;
    let values = harvester.values();

    let first = values
        .first_value(&dataset, &DbQuery::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.timestamp, day(1));

    let last = values
        .last_value(&dataset, &DbQuery::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(last.timestamp, day(2));
}

#[tokio::test]
async fn test_assemble_values_in_timespan() {
    let (harvester, dataset) = harvested(true).await;
    let values = harvester.values();

    let all = values
        .assemble_data_values(&dataset, &DbQuery::new())
        .await
        .unwrap();
    assert_eq!(all.len(), 3);

    let ranged = values
        .assemble_data_values(&dataset, &DbQuery::with_timespan(day(2), day(3)))
        .await
        .unwrap();
    let stamps: Vec<_> = ranged.values.iter().map(|v| v.timestamp).collect();
    assert_eq!(stamps, vec![day(2), day(3)]);
}

#[tokio::test]
async fn test_unit_of_measure() {
    let (harvester, dataset) = harvested(true).await;
    let unit = harvester.values().unit_of_measure(&dataset).await.unwrap();
    assert_eq!(unit, Unit::new("m"));
}

/// The single series with every observation reporting `unit`.
fn relabelled(unit: Option<&str>) -> Arc<FakeClient> {
    let mut snapshot = single_series_snapshot();
    snapshot.observations.push(observation("P1", "O1", 3, 3.5));
    for o in &mut snapshot.observations {
        o.unit = unit.map(str::to_string);
    }
    Arc::new(FakeClient::new().with_service(URL, snapshot))
}

fn repository(client: Arc<FakeClient>) -> ValueRepository {
    let client: Arc<dyn SosClient> = client;
    ValueRepository::new(&ConnectorRegistry::with_builtins(client))
}

#[tokio::test]
async fn test_unit_of_measure_follows_the_service() {
    let (_, dataset) = harvested(true).await;
    assert_eq!(dataset.unit, Unit::new("m"));

    let client = relabelled(Some("cm"));
    let unit = repository(client.clone())
        .unit_of_measure(&dataset)
        .await
        .unwrap();
    assert_eq!(unit, Unit::new("cm"));

    let requests = client.observation_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].temporal_filter, Some(TemporalFilter::First));
}

#[tokio::test]
async fn test_recorded_unit_fills_in_missing_units() {
    let (_, dataset) = harvested(true).await;
    let values = repository(relabelled(None));

    assert_eq!(
        values.unit_of_measure(&dataset).await.unwrap(),
        Unit::new("m")
    );
    let first = values
        .first_value(&dataset, &DbQuery::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.unit.as_deref(), Some("m"));
    let all = values
        .assemble_data_values(&dataset, &DbQuery::new())
        .await
        .unwrap();
    assert!(all.values.iter().all(|v| v.unit.as_deref() == Some("m")));
}

#[tokio::test]
async fn test_unknown_connector_is_reported() {
    let (_, mut dataset) = harvested(true).await;
    dataset.connector = "sos9".to_string();
    let values = ValueRepository::new(&ConnectorRegistry::new());

    let err = values
        .last_value(&dataset, &DbQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ValueError::ConnectorNotFound(ref name) if name == "sos9"));

    let err = values
        .assemble_data_values(&dataset, &DbQuery::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ValueError::ConnectorNotFound(_)));
}
