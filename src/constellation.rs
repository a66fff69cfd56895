//! The service constellation: the normalized entity graph of one harvest pass.
//!
//! A [`ServiceConstellation`] owns exactly one [`ServiceNode`] and the
//! procedure, offering, feature, phenomenon and category nodes plus the
//! [`DatasetConstellation`]s discovered while walking the remote service.
//! It is built fresh on every pass and handed over wholesale; nothing
//! mutates it incrementally afterwards.
//!
//! All `add_*` operations are idempotent upserts keyed by the domain
//! identifier: registering the same identifier twice returns the same
//! handle and keeps the first node. Datasets are keyed by their identifying
//! tuple and the last registration wins.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Identity and metadata of the harvested service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceNode {
    pub name: String,
    pub url: String,
    pub service_type: String,
    pub version: String,
    /// Name of the connector that harvested the service.
    pub connector: String,
    pub supports_first_last: bool,
    pub metadata: ServiceMetadata,
}

impl ServiceNode {
    /// Stable identifier derived from name, url and type.
    pub fn id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.name.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.url.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.service_type.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }
}

/// The capabilities document a service was harvested from.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceMetadata {
    pub format: String,
    pub document: String,
}

impl ServiceMetadata {
    pub fn json(document: impl Into<String>) -> Self {
        Self {
            format: "application/json".to_string(),
            document: document.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OfferingNode {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcedureNode {
    pub id: String,
    pub name: Option<String>,
    pub insitu: bool,
    pub mobile: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureNode {
    pub id: String,
    pub name: Option<String>,
    pub geometry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhenomenonNode {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryNode {
    pub id: String,
    pub name: Option<String>,
}

/// Unit of measure of a dataset. An empty symbol is the anonymous unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    pub symbol: String,
    pub name: Option<String>,
}

impl Unit {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: None,
        }
    }

    pub fn anonymous() -> Self {
        Self::new("")
    }

    pub fn is_anonymous(&self) -> bool {
        self.symbol.is_empty()
    }
}

/// Observation-type specific shape of a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatasetKind {
    Quantity,
    Profile { vertical_parameter: Option<String> },
    Count,
    Text,
}

impl DatasetKind {
    pub fn value_type(&self) -> &'static str {
        match self {
            DatasetKind::Quantity => "quantity",
            DatasetKind::Profile { .. } => "quantity-profile",
            DatasetKind::Count => "count",
            DatasetKind::Text => "text",
        }
    }
}

/// The identifying tuple of a time series.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DatasetKey {
    pub procedure: String,
    pub offering: String,
    pub category: String,
    pub phenomenon: String,
    pub feature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetConstellation {
    pub key: DatasetKey,
    /// `None` when no unit could be resolved at all.
    pub unit: Option<Unit>,
    pub sampling_time_start: Option<DateTime<Utc>>,
    pub sampling_time_end: Option<DateTime<Utc>>,
    pub kind: DatasetKind,
}

impl DatasetConstellation {
    pub fn new(
        procedure: impl Into<String>,
        offering: impl Into<String>,
        category: impl Into<String>,
        phenomenon: impl Into<String>,
        feature: impl Into<String>,
        kind: DatasetKind,
    ) -> Self {
        Self {
            key: DatasetKey {
                procedure: procedure.into(),
                offering: offering.into(),
                category: category.into(),
                phenomenon: phenomenon.into(),
                feature: feature.into(),
            },
            unit: None,
            sampling_time_start: None,
            sampling_time_end: None,
            kind,
        }
    }

    pub fn quantity(
        procedure: impl Into<String>,
        offering: impl Into<String>,
        category: impl Into<String>,
        phenomenon: impl Into<String>,
        feature: impl Into<String>,
    ) -> Self {
        Self::new(
            procedure,
            offering,
            category,
            phenomenon,
            feature,
            DatasetKind::Quantity,
        )
    }

    pub fn with_unit(mut self, unit: Option<Unit>) -> Self {
        self.unit = unit;
        self
    }

    pub fn with_sampling_time(
        mut self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        self.sampling_time_start = start;
        self.sampling_time_end = end;
        self
    }

    /// The unit to materialize: the resolved one, or the anonymous unit.
    pub fn unit_or_anonymous(&self) -> Unit {
        self.unit.clone().unwrap_or_else(Unit::anonymous)
    }

    /// Stable domain identifier of the series (SHA-256 over the tuple).
    pub fn domain_id(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [
            &self.key.procedure,
            &self.key.offering,
            &self.key.category,
            &self.key.phenomenon,
            &self.key.feature,
        ] {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceConstellation {
    service: ServiceNode,
    offerings: BTreeMap<String, OfferingNode>,
    procedures: BTreeMap<String, ProcedureNode>,
    features: BTreeMap<String, FeatureNode>,
    phenomena: BTreeMap<String, PhenomenonNode>,
    categories: BTreeMap<String, CategoryNode>,
    datasets: BTreeMap<DatasetKey, DatasetConstellation>,
}

impl ServiceConstellation {
    pub fn new(service: ServiceNode) -> Self {
        Self {
            service,
            offerings: BTreeMap::new(),
            procedures: BTreeMap::new(),
            features: BTreeMap::new(),
            phenomena: BTreeMap::new(),
            categories: BTreeMap::new(),
            datasets: BTreeMap::new(),
        }
    }

    pub fn service(&self) -> &ServiceNode {
        &self.service
    }

    pub fn add_offering(&mut self, id: &str, name: Option<&str>) -> String {
        self.offerings
            .entry(id.to_string())
            .or_insert_with(|| OfferingNode {
                id: id.to_string(),
                name: name.map(str::to_string),
            })
            .id
            .clone()
    }

    pub fn add_procedure(
        &mut self,
        id: &str,
        name: Option<&str>,
        insitu: bool,
        mobile: bool,
    ) -> String {
        self.procedures
            .entry(id.to_string())
            .or_insert_with(|| ProcedureNode {
                id: id.to_string(),
                name: name.map(str::to_string),
                insitu,
                mobile,
            })
            .id
            .clone()
    }

    pub fn add_feature(
        &mut self,
        id: &str,
        name: Option<&str>,
        geometry: Option<serde_json::Value>,
    ) -> String {
        self.features
            .entry(id.to_string())
            .or_insert_with(|| FeatureNode {
                id: id.to_string(),
                name: name.map(str::to_string),
                geometry,
            })
            .id
            .clone()
    }

    pub fn add_phenomenon(&mut self, id: &str, name: Option<&str>) -> String {
        self.phenomena
            .entry(id.to_string())
            .or_insert_with(|| PhenomenonNode {
                id: id.to_string(),
                name: name.map(str::to_string),
            })
            .id
            .clone()
    }

    pub fn add_category(&mut self, id: &str, name: Option<&str>) -> String {
        self.categories
            .entry(id.to_string())
            .or_insert_with(|| CategoryNode {
                id: id.to_string(),
                name: name.map(str::to_string),
            })
            .id
            .clone()
    }

    /// Register a dataset, replacing one with the same identifying tuple.
    ///
    /// Returns `true` when an earlier dataset was replaced.
    pub fn add_dataset(&mut self, dataset: DatasetConstellation) -> bool {
        self.datasets.insert(dataset.key.clone(), dataset).is_some()
    }

    pub fn offerings(&self) -> impl Iterator<Item = &OfferingNode> {
        self.offerings.values()
    }

    pub fn procedures(&self) -> impl Iterator<Item = &ProcedureNode> {
        self.procedures.values()
    }

    pub fn features(&self) -> impl Iterator<Item = &FeatureNode> {
        self.features.values()
    }

    pub fn phenomena(&self) -> impl Iterator<Item = &PhenomenonNode> {
        self.phenomena.values()
    }

    pub fn categories(&self) -> impl Iterator<Item = &CategoryNode> {
        self.categories.values()
    }

    pub fn datasets(&self) -> impl Iterator<Item = &DatasetConstellation> {
        self.datasets.values()
    }

    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    pub fn offering(&self, id: &str) -> Option<&OfferingNode> {
        self.offerings.get(id)
    }

    pub fn procedure(&self, id: &str) -> Option<&ProcedureNode> {
        self.procedures.get(id)
    }

    pub fn feature(&self, id: &str) -> Option<&FeatureNode> {
        self.features.get(id)
    }
}
