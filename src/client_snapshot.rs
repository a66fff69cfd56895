//! Snapshot-replaying [`SosClient`].
//!
//! A snapshot is one JSON file per source holding the decoded documents a
//! service returned: its capabilities, the features and availability per
//! procedure and the observations. The CLI uses it to harvest end to end
//! without an HTTP transport.
//!
//! ```json
//! {
//!   "capabilities": { "version": "2.0.0", "operations": ["GetDataAvailability"], ... },
//!   "features": { "P1": [{ "identifier": "F1" }] },
//!   "availability": { "P1": [ ... ] },
//!   "observations": [ ... ]
//! }
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::client::{ObservationRequest, SosClient, TemporalFilter};
use crate::config::Config;
use crate::models::{
    Capabilities, DataAvailability, FeatureOfInterest, GetCapabilitiesResponse, Observation,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub capabilities: Capabilities,
    #[serde(default)]
    pub features: BTreeMap<String, Vec<FeatureOfInterest>>,
    #[serde(default)]
    pub availability: BTreeMap<String, Vec<DataAvailability>>,
    #[serde(default)]
    pub observations: Vec<Observation>,
}

impl ServiceSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }
}

/// Serves decoded documents from snapshots keyed by service URL.
#[derive(Debug, Default)]
pub struct SnapshotClient {
    snapshots: HashMap<String, ServiceSnapshot>,
}

impl SnapshotClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the snapshot of every source that configures one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut client = Self::new();
        for source in config.sources.values() {
            if let Some(path) = &source.snapshot {
                client.insert(&source.url, ServiceSnapshot::load(path)?);
            }
        }
        Ok(client)
    }

    pub fn insert(&mut self, url: &str, snapshot: ServiceSnapshot) {
        self.snapshots.insert(url.to_string(), snapshot);
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    fn snapshot(&self, url: &str) -> Result<&ServiceSnapshot> {
        self.snapshots
            .get(url)
            .with_context(|| format!("no snapshot recorded for {}", url))
    }
}

#[async_trait]
impl SosClient for SnapshotClient {
    async fn get_capabilities(&self, url: &str) -> Result<GetCapabilitiesResponse> {
        let snapshot = self.snapshot(url)?;
        GetCapabilitiesResponse::from_capabilities(snapshot.capabilities.clone())
    }

    async fn get_feature_of_interest_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Vec<FeatureOfInterest>> {
        let snapshot = self.snapshot(url)?;
        Ok(snapshot.features.get(procedure).cloned().unwrap_or_default())
    }

    async fn get_data_availability_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Option<Vec<DataAvailability>>> {
        let snapshot = self.snapshot(url)?;
        Ok(snapshot.availability.get(procedure).cloned())
    }

    async fn get_observation(
        &self,
        url: &str,
        request: &ObservationRequest,
    ) -> Result<Vec<Observation>> {
        let snapshot = self.snapshot(url)?;
        let mut matching: Vec<&Observation> = snapshot
            .observations
            .iter()
            .filter(|o| request.matches(o))
            .filter(|o| {
                request
                    .temporal_filter
                    .map_or(true, |f| f.admits(&o.phenomenon_time))
            })
            .collect();
        matching.sort_by_key(|o| o.phenomenon_time);

        let selected: Vec<&Observation> = match request.temporal_filter {
            Some(TemporalFilter::First) => matching.first().copied().into_iter().collect(),
            Some(TemporalFilter::Latest) => matching.last().copied().into_iter().collect(),
            _ => matching,
        };
        Ok(selected.into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn observation(day: u32, value: f64) -> Observation {
        Observation {
            procedure: "P1".to_string(),
            offering: Some("O1".to_string()),
            observed_property: "Ph1".to_string(),
            feature_of_interest: "F1".to_string(),
            phenomenon_time: Utc.with_ymd_and_hms(2020, 1, day, 0, 0, 0).unwrap(),
            value: Some(value),
            unit: Some("m".to_string()),
        }
    }

    fn client() -> SnapshotClient {
        let mut client = SnapshotClient::new();
        client.insert(
            "https://example.org/sos",
            ServiceSnapshot {
                observations: vec![observation(3, 3.0), observation(1, 1.0), observation(2, 2.0)],
                ..Default::default()
            },
        );
        client
    }

    #[tokio::test]
    async fn test_first_and_latest_pick_the_series_ends() {
        let client = client();
        let request = ObservationRequest::new("P1", "Ph1", "F1");

        let first = client
            .get_observation(
                "https://example.org/sos",
                &request.clone().with_filter(TemporalFilter::First),
            )
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].value, Some(1.0));

        let latest = client
            .get_observation(
                "https://example.org/sos",
                &request.with_filter(TemporalFilter::Latest),
            )
            .await
            .unwrap();
        assert_eq!(latest[0].value, Some(3.0));
    }

    #[tokio::test]
    async fn test_during_filters_and_sorts() {
        let client = client();
        let request = ObservationRequest::new("P1", "Ph1", "F1").with_filter(TemporalFilter::During(
            Utc.with_ymd_and_hms(2020, 1, 2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2020, 1, 3, 0, 0, 0).unwrap(),
        ));
        let values: Vec<f64> = client
            .get_observation("https://example.org/sos", &request)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|o| o.value)
            .collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[tokio::test]
    async fn test_unknown_service_is_an_error() {
        let client = client();
        assert!(client.get_capabilities("https://other.org/sos").await.is_err());
    }
}
