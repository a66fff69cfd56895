//! Value repository bridge.
//!
//! Observation values are never harvested. A value query for a dataset is
//! routed to the connector that harvested it, looked up by the connector
//! name recorded on the dataset, and the observations it returns are
//! translated into [`QuantityValue`]s.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::client::{ObservationRequest, TemporalFilter};
use crate::connector::{ConnectorRegistry, SosConnector};
use crate::constellation::{DatasetConstellation, DatasetKind, ServiceConstellation, Unit};
use crate::error::ValueError;
use crate::models::Observation;

/// Handle of one harvested time series, bound to its connector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetEntity {
    pub id: String,
    pub procedure: String,
    pub offering: String,
    pub category: String,
    pub phenomenon: String,
    pub feature: String,
    pub unit: Unit,
    pub kind: DatasetKind,
    pub sampling_time_start: Option<DateTime<Utc>>,
    pub sampling_time_end: Option<DateTime<Utc>>,
    pub service_url: String,
    pub connector: String,
    pub supports_first_last: bool,
}

impl DatasetEntity {
    pub fn from_constellation(
        constellation: &ServiceConstellation,
        dataset: &DatasetConstellation,
    ) -> Self {
        let service = constellation.service();
        Self {
            id: dataset.domain_id(),
            procedure: dataset.key.procedure.clone(),
            offering: dataset.key.offering.clone(),
            category: dataset.key.category.clone(),
            phenomenon: dataset.key.phenomenon.clone(),
            feature: dataset.key.feature.clone(),
            unit: dataset.unit_or_anonymous(),
            kind: dataset.kind.clone(),
            sampling_time_start: dataset.sampling_time_start,
            sampling_time_end: dataset.sampling_time_end,
            service_url: service.url.clone(),
            connector: service.connector.clone(),
            supports_first_last: service.supports_first_last,
        }
    }

    /// Observation request for this series, without temporal filter.
    pub fn request(&self) -> ObservationRequest {
        ObservationRequest::new(&self.procedure, &self.phenomenon, &self.feature)
            .with_offering(&self.offering)
    }
}

/// Materialize every dataset of a constellation.
pub fn dataset_entities(constellation: &ServiceConstellation) -> Vec<DatasetEntity> {
    constellation
        .datasets()
        .map(|d| DatasetEntity::from_constellation(constellation, d))
        .collect()
}

/// Parameters of a value query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbQuery {
    pub timespan: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl DbQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timespan(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            timespan: Some((start, end)),
        }
    }

    pub fn temporal_filter(&self) -> Option<TemporalFilter> {
        self.timespan
            .map(|(start, end)| TemporalFilter::During(start, end))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantityValue {
    pub timestamp: DateTime<Utc>,
    pub value: Option<f64>,
    pub unit: Option<String>,
}

impl QuantityValue {
    /// Value of one observation of `dataset`. Observations without a unit
    /// take the unit recorded for the dataset, unless that one is anonymous.
    pub fn of(dataset: &DatasetEntity, observation: Observation) -> Self {
        let unit = observation.unit.or_else(|| {
            (!dataset.unit.is_anonymous()).then(|| dataset.unit.symbol.clone())
        });
        Self {
            timestamp: observation.phenomenon_time,
            value: observation.value,
            unit,
        }
    }
}

/// A value series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data<T> {
    pub values: Vec<T>,
}

impl<T> Data<T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Default for Data<T> {
    fn default() -> Self {
        Self { values: Vec::new() }
    }
}

/// Routes value queries to the connector owning a dataset.
pub struct ValueRepository {
    connectors: HashMap<String, Arc<dyn SosConnector>>,
}

impl ValueRepository {
    pub fn new(registry: &ConnectorRegistry) -> Self {
        let connectors = registry
            .connectors()
            .iter()
            .map(|c| (c.name().to_string(), c.clone()))
            .collect();
        Self { connectors }
    }

    fn connector(&self, dataset: &DatasetEntity) -> Result<&Arc<dyn SosConnector>, ValueError> {
        self.connectors
            .get(&dataset.connector)
            .ok_or_else(|| ValueError::ConnectorNotFound(dataset.connector.clone()))
    }

    /// The earliest value of the series. The query's timespan is not
    /// applied; the connector resolves the first value remotely.
    pub async fn first_value(
        &self,
        dataset: &DatasetEntity,
        _query: &DbQuery,
    ) -> Result<Option<QuantityValue>, ValueError> {
        let observation = self
            .connector(dataset)?
            .get_first_observation(dataset)
            .await
            .map_err(ValueError::Connector)?;
        Ok(observation.map(|o| QuantityValue::of(dataset, o)))
    }

    pub async fn last_value(
        &self,
        dataset: &DatasetEntity,
        _query: &DbQuery,
    ) -> Result<Option<QuantityValue>, ValueError> {
        let observation = self
            .connector(dataset)?
            .get_last_observation(dataset)
            .await
            .map_err(ValueError::Connector)?;
        Ok(observation.map(|o| QuantityValue::of(dataset, o)))
    }

    pub async fn assemble_data_values(
        &self,
        dataset: &DatasetEntity,
        query: &DbQuery,
    ) -> Result<Data<QuantityValue>, ValueError> {
        let observations = self
            .connector(dataset)?
            .get_observations(dataset, query)
            .await
            .map_err(ValueError::Connector)?;
        Ok(Data {
            values: observations
                .into_iter()
                .map(|o| QuantityValue::of(dataset, o))
                .collect(),
        })
    }

    pub async fn unit_of_measure(&self, dataset: &DatasetEntity) -> Result<Unit, ValueError> {
        self.connector(dataset)?
            .get_unit_of_measure(dataset)
            .await
            .map_err(ValueError::Connector)
    }
}
