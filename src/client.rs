//! Protocol client seam.
//!
//! Connectors never speak the wire protocol themselves. They ask a
//! [`SosClient`] for decoded documents; how the client obtains them (HTTP,
//! a replayed snapshot, an in-test fake) is not their concern.
//!
//! # Implementing a client
//!
//! ```rust
//! use anyhow::Result;
//! use async_trait::async_trait;
//! use sensorweb_harvest::client::{ObservationRequest, SosClient};
//! use sensorweb_harvest::models::*;
//!
//! struct Offline;
//!
//! #[async_trait]
//! impl SosClient for Offline {
//!     async fn get_capabilities(&self, url: &str) -> Result<GetCapabilitiesResponse> {
//!         anyhow::bail!("{} is offline", url)
//!     }
//!     async fn get_feature_of_interest_by_procedure(
//!         &self,
//!         _url: &str,
//!         _procedure: &str,
//!     ) -> Result<Vec<FeatureOfInterest>> {
//!         Ok(vec![])
//!     }
//!     async fn get_data_availability_by_procedure(
//!         &self,
//!         _url: &str,
//!         _procedure: &str,
//!     ) -> Result<Option<Vec<DataAvailability>>> {
//!         Ok(None)
//!     }
//!     async fn get_observation(
//!         &self,
//!         _url: &str,
//!         _request: &ObservationRequest,
//!     ) -> Result<Vec<Observation>> {
//!         Ok(vec![])
//!     }
//! }
//! ```

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    DataAvailability, FeatureOfInterest, GetCapabilitiesResponse, Observation,
};

/// Temporal restriction of an observation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFilter {
    /// The earliest observation only.
    First,
    /// The latest observation only.
    Latest,
    /// Observations at exactly this instant.
    At(DateTime<Utc>),
    /// Observations within `[start, end]`.
    During(DateTime<Utc>, DateTime<Utc>),
}

impl TemporalFilter {
    /// Whether `time` passes the filter. `First` and `Latest` need the
    /// whole series and are resolved by the caller.
    pub fn admits(&self, time: &DateTime<Utc>) -> bool {
        match self {
            TemporalFilter::First | TemporalFilter::Latest => true,
            TemporalFilter::At(t) => time == t,
            TemporalFilter::During(start, end) => start <= time && time <= end,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObservationRequest {
    pub procedure: String,
    pub offering: Option<String>,
    pub observed_property: String,
    pub feature_of_interest: String,
    pub temporal_filter: Option<TemporalFilter>,
}

impl ObservationRequest {
    pub fn new(
        procedure: impl Into<String>,
        observed_property: impl Into<String>,
        feature_of_interest: impl Into<String>,
    ) -> Self {
        Self {
            procedure: procedure.into(),
            offering: None,
            observed_property: observed_property.into(),
            feature_of_interest: feature_of_interest.into(),
            temporal_filter: None,
        }
    }

    pub fn with_offering(mut self, offering: impl Into<String>) -> Self {
        self.offering = Some(offering.into());
        self
    }

    pub fn with_filter(mut self, filter: TemporalFilter) -> Self {
        self.temporal_filter = Some(filter);
        self
    }

    /// Whether an observation belongs to the requested series.
    pub fn matches(&self, observation: &Observation) -> bool {
        observation.procedure == self.procedure
            && observation.observed_property == self.observed_property
            && observation.feature_of_interest == self.feature_of_interest
            && match (&self.offering, &observation.offering) {
                (Some(requested), Some(actual)) => requested == actual,
                _ => true,
            }
    }
}

/// Decoded access to one sensor observation service.
#[async_trait]
pub trait SosClient: Send + Sync {
    async fn get_capabilities(&self, url: &str) -> Result<GetCapabilitiesResponse>;

    async fn get_feature_of_interest_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Vec<FeatureOfInterest>>;

    /// `Ok(None)` when the service answered without an availability list.
    async fn get_data_availability_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Option<Vec<DataAvailability>>>;

    async fn get_observation(
        &self,
        url: &str,
        request: &ObservationRequest,
    ) -> Result<Vec<Observation>>;
}
