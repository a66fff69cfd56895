//! Fixtures shared by the integration tests.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use sensorweb_harvest::catalog::CatalogStore;
use sensorweb_harvest::client::{ObservationRequest, SosClient};
use sensorweb_harvest::client_snapshot::{ServiceSnapshot, SnapshotClient};
use sensorweb_harvest::config::CatalogProperties;
use sensorweb_harvest::constellation::{
    DatasetConstellation, ServiceConstellation, ServiceMetadata, ServiceNode,
};
use sensorweb_harvest::dcat::ApiEndpoint;
use sensorweb_harvest::models::*;
use sensorweb_harvest::persistence::InMemoryPersistence;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

pub const URL: &str = "https://example.org/sos/service";

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
}

pub fn offering(id: &str, procedures: &[&str]) -> ObservationOffering {
    ObservationOffering {
        identifier: id.to_string(),
        names: vec![LocalizedString::with_lang(format!("Offering {}", id), "en")],
        procedures: procedures.iter().map(|p| p.to_string()).collect(),
        observable_properties: vec!["Ph1".to_string()],
        features_of_interest: vec!["F1".to_string()],
        observed_area: Some(Envelope::new([7.0, 51.0], [8.0, 52.0])),
        phenomenon_time: Some(Time::period(day(1), day(2))),
    }
}

pub fn capabilities(offerings: Vec<ObservationOffering>) -> Capabilities {
    Capabilities {
        version: SOS_200.to_string(),
        service_identification: Some(ServiceIdentification {
            title: vec![LocalizedString::with_lang("Hydrology SOS", "en")],
            abstract_text: vec![LocalizedString::new("Gauges and levels")],
            access_constraints: vec!["NONE".to_string()],
            profiles: vec!["http://www.opengis.net/spec/SOS/2.0/conf/core".to_string()],
            ..Default::default()
        }),
        service_provider: Some(ServiceProvider {
            provider_name: "Water Agency".to_string(),
            provider_site: Some("https://water.example.org".to_string()),
            service_contact: ResponsibleParty {
                individual_name: Some("Jo Doe".to_string()),
                position_name: Some("Operator".to_string()),
                contact_info: Some(ContactInfo {
                    address: Some(Address {
                        city: Some("Münster".to_string()),
                        electronic_mail_address: vec!["info@water.example.org".to_string()],
                        ..Default::default()
                    }),
                    phone: Some(Phone {
                        voice: vec!["+49 251 0000".to_string()],
                        facsimile: vec![],
                    }),
                }),
                ..Default::default()
            },
        }),
        operations: vec![
            "GetCapabilities".to_string(),
            "GetObservation".to_string(),
            GET_DATA_AVAILABILITY.to_string(),
        ],
        languages: vec!["eng".to_string()],
        extensions: vec![],
        contents: offerings,
    }
}

pub fn availability(
    procedure: &str,
    offering: &str,
    phenomenon: &str,
    category: &str,
    feature: &str,
) -> DataAvailability {
    DataAvailability {
        procedure: Reference::new(procedure),
        observed_property: Reference::new(phenomenon),
        feature_of_interest: Reference::new(feature),
        offering: Some(Reference::new(offering)),
        category: Some(Reference::new(category)),
        phenomenon_time: AvailabilityPeriod {
            start: day(1),
            end: day(2),
        },
    }
}

pub fn observation(procedure: &str, offering: &str, d: u32, value: f64) -> Observation {
    Observation {
        procedure: procedure.to_string(),
        offering: Some(offering.to_string()),
        observed_property: "Ph1".to_string(),
        feature_of_interest: "F1".to_string(),
        phenomenon_time: day(d),
        value: Some(value),
        unit: Some("m".to_string()),
    }
}

/// One offering O1 with procedure P1 observing Ph1 (category C1) at F1.
pub fn single_series_snapshot() -> ServiceSnapshot {
    let mut snapshot = ServiceSnapshot {
        capabilities: capabilities(vec![offering("O1", &["P1"])]),
        ..Default::default()
    };
    snapshot.features.insert(
        "P1".to_string(),
        vec![FeatureOfInterest {
            identifier: "F1".to_string(),
            name: Some("Gauge 1".to_string()),
            geometry: None,
        }],
    );
    snapshot.availability.insert(
        "P1".to_string(),
        vec![availability("P1", "O1", "Ph1", "C1", "F1")],
    );
    snapshot.observations = vec![
        observation("P1", "O1", 1, 1.5),
        observation("P1", "O1", 2, 2.5),
    ];
    snapshot
}

/// A snapshot client that can fail single procedures and records every
/// observation request.
pub struct FakeClient {
    inner: SnapshotClient,
    failing_procedures: HashSet<String>,
    capabilities_fail: bool,
    requests: Mutex<Vec<ObservationRequest>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            inner: SnapshotClient::new(),
            failing_procedures: HashSet::new(),
            capabilities_fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_service(mut self, url: &str, snapshot: ServiceSnapshot) -> Self {
        self.inner.insert(url, snapshot);
        self
    }

    pub fn failing(mut self, procedure: &str) -> Self {
        self.failing_procedures.insert(procedure.to_string());
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.capabilities_fail = true;
        self
    }

    pub fn observation_requests(&self) -> Vec<ObservationRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SosClient for FakeClient {
    async fn get_capabilities(&self, url: &str) -> Result<GetCapabilitiesResponse> {
        if self.capabilities_fail {
            anyhow::bail!("connection refused: {}", url);
        }
        self.inner.get_capabilities(url).await
    }

    async fn get_feature_of_interest_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Vec<FeatureOfInterest>> {
        self.inner
            .get_feature_of_interest_by_procedure(url, procedure)
            .await
    }

    async fn get_data_availability_by_procedure(
        &self,
        url: &str,
        procedure: &str,
    ) -> Result<Option<Vec<DataAvailability>>> {
        if self.failing_procedures.contains(procedure) {
            anyhow::bail!("timeout fetching availability of {}", procedure);
        }
        self.inner
            .get_data_availability_by_procedure(url, procedure)
            .await
    }

    async fn get_observation(
        &self,
        url: &str,
        request: &ObservationRequest,
    ) -> Result<Vec<Observation>> {
        self.requests.lock().unwrap().push(request.clone());
        self.inner.get_observation(url, request).await
    }
}

pub fn catalog_properties() -> CatalogProperties {
    CatalogProperties {
        title: Some("Sensor Catalog".to_string()),
        description: Some("Harvested sensor services".to_string()),
        language: Some("en".to_string()),
        publisher: Some("Example Org".to_string()),
        homepage: Some("https://example.org".to_string()),
        license: Some("https://creativecommons.org/licenses/by/4.0/".to_string()),
    }
}

pub fn api() -> ApiEndpoint {
    ApiEndpoint::new("https://example.org/api")
}

pub async fn memory_catalog() -> (Arc<CatalogStore>, Arc<InMemoryPersistence>) {
    let persistence = Arc::new(InMemoryPersistence::new());
    let catalog = CatalogStore::init(&catalog_properties(), api(), persistence.clone())
        .await
        .unwrap();
    (Arc::new(catalog), persistence)
}

/// A constellation for `url` whose metadata document is `caps`.
pub fn constellation(name: &str, url: &str, caps: &Capabilities) -> ServiceConstellation {
    let service = ServiceNode {
        name: name.to_string(),
        url: url.to_string(),
        service_type: "SOS".to_string(),
        version: caps.version.clone(),
        connector: "sos2".to_string(),
        supports_first_last: true,
        metadata: ServiceMetadata::json(serde_json::to_string(caps).unwrap()),
    };
    let mut c = ServiceConstellation::new(service);
    c.add_offering("O1", None);
    c.add_procedure("P1", None, true, false);
    c.add_dataset(DatasetConstellation::quantity("P1", "O1", "C1", "Ph1", "F1"));
    c
}
