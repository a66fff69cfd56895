//! Built-in sensor observation service connectors.
//!
//! Three dialects are supported:
//!
//! | Connector | Accepts |
//! |-----------|---------|
//! | [`Sos2Connector`] | version 2.0.0 with service provider and `GetDataAvailability`, no profile extension |
//! | [`Sos2ProfileConnector`] | the same, plus the `ProfileObservation` extension |
//! | [`Sos1Connector`] | version 1.0.0 |
//!
//! The 2.0 connectors walk every allowed offering and every procedure in
//! it, asking the service for the procedure's features and data
//! availability. The 1.0 dialect has no availability operation, so its
//! datasets come from the offering's own procedure, property and feature
//! lists.
//!
//! Each procedure is processed on its own: a failing request is logged and
//! counted, and the walk continues with the next procedure.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::{ObservationRequest, SosClient, TemporalFilter};
use crate::config::DataSourceConfiguration;
use crate::connector::{Harvest, HarvestContext, HarvestReport, SosConnector};
use crate::constellation::{
    DatasetConstellation, DatasetKind, ServiceConstellation, ServiceMetadata, ServiceNode, Unit,
};
use crate::error::HarvestError;
use crate::models::{
    Capabilities, GetCapabilitiesResponse, ObservationOffering, GET_DATA_AVAILABILITY,
    PROFILE_EXTENSION, SOS_100, SOS_200,
};
use crate::progress::HarvestProgressEvent;

fn version_matches(
    config: &DataSourceConfiguration,
    capabilities: &Capabilities,
    expected: &str,
) -> bool {
    capabilities.version == expected
        && config.version.as_deref().map_or(true, |v| v == expected)
}

/// The probe shared by both 2.0 connectors.
fn is_sos2_with_availability(
    config: &DataSourceConfiguration,
    capabilities: &Capabilities,
) -> bool {
    version_matches(config, capabilities, SOS_200)
        && capabilities.service_provider.is_some()
        && capabilities.supports_operation(GET_DATA_AVAILABILITY)
}

/// How datasets are discovered for a procedure.
#[derive(Debug, Clone)]
enum Dialect {
    /// Data availability per procedure.
    Availability { kind: DatasetKind },
    /// Offering lists only.
    OfferingLists,
}

/// State of one harvest pass over one service.
struct SosHarvester<'a> {
    client: &'a dyn SosClient,
    config: &'a DataSourceConfiguration,
    capabilities: &'a Capabilities,
    context: &'a HarvestContext,
    dialect: Dialect,
    constellation: ServiceConstellation,
    report: HarvestReport,
}

impl<'a> SosHarvester<'a> {
    fn new(
        client: &'a dyn SosClient,
        connector: &str,
        config: &'a DataSourceConfiguration,
        response: &'a GetCapabilitiesResponse,
        context: &'a HarvestContext,
        dialect: Dialect,
    ) -> Self {
        let service = ServiceNode {
            name: config.item_name.clone(),
            url: config.url.clone(),
            service_type: config.service_type.clone(),
            version: response.capabilities.version.clone(),
            connector: connector.to_string(),
            supports_first_last: config.supports_first_last,
            metadata: ServiceMetadata::json(response.metadata.as_str()),
        };
        Self {
            client,
            config,
            capabilities: &response.capabilities,
            context,
            dialect,
            constellation: ServiceConstellation::new(service),
            report: HarvestReport::default(),
        }
    }

    async fn run(mut self) -> Result<Harvest, HarvestError> {
        let capabilities = self.capabilities;
        let offerings: Vec<&ObservationOffering> = capabilities
            .contents
            .iter()
            .filter(|o| self.config.is_offering_allowed(&o.identifier))
            .collect();
        let total = offerings.len() as u64;

        for (i, offering) in offerings.into_iter().enumerate() {
            self.context.report(HarvestProgressEvent::Harvesting {
                source: self.config.item_name.clone(),
                offering: offering.identifier.clone(),
                n: i as u64 + 1,
                total,
            });
            let name = offering.names.first().map(|n| n.text.as_str());
            self.constellation.add_offering(&offering.identifier, name);
            self.report.offerings += 1;

            for procedure in &offering.procedures {
                if self.context.is_cancelled() {
                    info!(source = %self.config.item_name, "harvest cancelled");
                    return Err(HarvestError::Cancelled(self.config.item_name.clone()));
                }
                match self.harvest_procedure(offering, procedure).await {
                    Ok(datasets) => {
                        self.report.procedures_ok += 1;
                        debug!(offering = %offering.identifier, procedure = %procedure, datasets, "procedure harvested");
                    }
                    Err(e) => {
                        self.report.procedures_failed += 1;
                        warn!(
                            source = %self.config.item_name,
                            offering = %offering.identifier,
                            procedure = %procedure,
                            error = %format!("{:#}", e),
                            "skipping procedure"
                        );
                    }
                }
            }
        }

        info!(
            source = %self.config.item_name,
            offerings = self.report.offerings,
            procedures_ok = self.report.procedures_ok,
            procedures_failed = self.report.procedures_failed,
            requests = self.report.requests,
            datasets = self.constellation.dataset_count(),
            "harvest pass finished"
        );
        Ok(Harvest {
            constellation: self.constellation,
            report: self.report,
        })
    }

    /// Returns the number of datasets emitted for the procedure.
    async fn harvest_procedure(
        &mut self,
        offering: &ObservationOffering,
        procedure: &str,
    ) -> Result<usize> {
        self.constellation.add_procedure(procedure, None, true, false);
        match self.dialect.clone() {
            Dialect::Availability { kind } => {
                self.harvest_availability(offering, procedure, kind).await
            }
            Dialect::OfferingLists => self.harvest_offering_lists(offering, procedure).await,
        }
    }

    async fn harvest_availability(
        &mut self,
        offering: &ObservationOffering,
        procedure: &str,
        kind: DatasetKind,
    ) -> Result<usize> {
        let url = self.config.url.as_str();

        self.report.requests += 1;
        let features = self
            .client
            .get_feature_of_interest_by_procedure(url, procedure)
            .await
            .with_context(|| format!("features of interest of {}", procedure))?;
        for feature in features {
            self.constellation.add_feature(
                &feature.identifier,
                feature.name.as_deref(),
                feature.geometry,
            );
        }

        self.report.requests += 1;
        let availability = self
            .client
            .get_data_availability_by_procedure(url, procedure)
            .await
            .with_context(|| format!("data availability of {}", procedure))?
            .with_context(|| format!("service returned no data availability for {}", procedure))?;

        let mut emitted = 0;
        for entry in availability {
            if entry
                .offering
                .as_ref()
                .is_some_and(|o| o.href != offering.identifier)
            {
                continue;
            }
            let phenomenon = self.constellation.add_phenomenon(
                &entry.observed_property.href,
                entry.observed_property.title.as_deref(),
            );
            let category_ref = entry.category.as_ref().unwrap_or(&entry.observed_property);
            let category = self
                .constellation
                .add_category(&category_ref.href, category_ref.title.as_deref());
            let feature = self.constellation.add_feature(
                &entry.feature_of_interest.href,
                entry.feature_of_interest.title.as_deref(),
                None,
            );

            let period = entry.phenomenon_time;
            let unit = self
                .resolve_unit(&offering.identifier, procedure, &phenomenon, &feature, Some(period.end))
                .await;
            let unit = match &kind {
                DatasetKind::Profile { .. } => Some(unit.unwrap_or_else(Unit::anonymous)),
                _ => unit,
            };

            let dataset = DatasetConstellation::new(
                procedure,
                offering.identifier.as_str(),
                category,
                phenomenon,
                feature,
                kind.clone(),
            )
            .with_unit(unit)
            .with_sampling_time(Some(period.start), Some(period.end));
            self.constellation.add_dataset(dataset);
            emitted += 1;
        }
        Ok(emitted)
    }

    async fn harvest_offering_lists(
        &mut self,
        offering: &ObservationOffering,
        procedure: &str,
    ) -> Result<usize> {
        let start = offering.phenomenon_time.as_ref().and_then(|t| t.start());
        let end = offering.phenomenon_time.as_ref().and_then(|t| t.end());

        let mut emitted = 0;
        for property in &offering.observable_properties {
            let phenomenon = self.constellation.add_phenomenon(property, None);
            let category = self.constellation.add_category(property, None);
            for feature_id in &offering.features_of_interest {
                let feature = self.constellation.add_feature(feature_id, None, None);
                let unit = self
                    .resolve_unit(&offering.identifier, procedure, &phenomenon, &feature, end)
                    .await;
                let dataset = DatasetConstellation::quantity(
                    procedure,
                    offering.identifier.as_str(),
                    category.as_str(),
                    phenomenon.as_str(),
                    feature,
                )
                .with_unit(unit)
                .with_sampling_time(start, end);
                self.constellation.add_dataset(dataset);
                emitted += 1;
            }
        }
        Ok(emitted)
    }

    /// Unit of the series, read from one observation.
    ///
    /// Services with first/last support are asked for the latest value;
    /// others for the observations at the end of the known period. A
    /// failing lookup yields no unit.
    async fn resolve_unit(
        &mut self,
        offering: &str,
        procedure: &str,
        phenomenon: &str,
        feature: &str,
        end: Option<DateTime<Utc>>,
    ) -> Option<Unit> {
        let filter = if self.config.supports_first_last {
            TemporalFilter::Latest
        } else {
            TemporalFilter::At(end?)
        };
        let request = ObservationRequest::new(procedure, phenomenon, feature)
            .with_offering(offering)
            .with_filter(filter);

        self.report.requests += 1;
        match self.client.get_observation(&self.config.url, &request).await {
            Ok(observations) => observations
                .into_iter()
                .next()
                .and_then(|o| o.unit)
                .map(Unit::new),
            Err(e) => {
                warn!(
                    procedure = %procedure,
                    phenomenon = %phenomenon,
                    feature = %feature,
                    error = %format!("{:#}", e),
                    "could not resolve unit"
                );
                None
            }
        }
    }
}

/// Connector for SOS 2.0 services offering data availability.
pub struct Sos2Connector {
    client: Arc<dyn SosClient>,
}

impl Sos2Connector {
    pub fn new(client: Arc<dyn SosClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SosConnector for Sos2Connector {
    fn client(&self) -> &dyn SosClient {
        self.client.as_ref()
    }

    fn name(&self) -> &str {
        "sos2"
    }

    fn description(&self) -> &str {
        "SOS 2.0 with GetDataAvailability"
    }

    fn can_handle(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
    ) -> bool {
        let caps = &capabilities.capabilities;
        is_sos2_with_availability(config, caps) && caps.extension(PROFILE_EXTENSION).is_none()
    }

    async fn get_constellation(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
        context: &HarvestContext,
    ) -> Result<Harvest, HarvestError> {
        let dialect = Dialect::Availability {
            kind: DatasetKind::Quantity,
        };
        SosHarvester::new(
            self.client.as_ref(),
            self.name(),
            config,
            capabilities,
            context,
            dialect,
        )
        .run()
        .await
    }
}

/// Connector for SOS 2.0 services delivering vertical profiles.
pub struct Sos2ProfileConnector {
    client: Arc<dyn SosClient>,
}

impl Sos2ProfileConnector {
    pub fn new(client: Arc<dyn SosClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SosConnector for Sos2ProfileConnector {
    fn client(&self) -> &dyn SosClient {
        self.client.as_ref()
    }

    fn name(&self) -> &str {
        "sos2-profile"
    }

    fn description(&self) -> &str {
        "SOS 2.0 with GetDataAvailability and profile observations"
    }

    fn can_handle(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
    ) -> bool {
        let caps = &capabilities.capabilities;
        is_sos2_with_availability(config, caps) && caps.extension(PROFILE_EXTENSION).is_some()
    }

    async fn get_constellation(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
        context: &HarvestContext,
    ) -> Result<Harvest, HarvestError> {
        let vertical_parameter = capabilities
            .capabilities
            .extension(PROFILE_EXTENSION)
            .and_then(|e| e.value.clone());
        let dialect = Dialect::Availability {
            kind: DatasetKind::Profile { vertical_parameter },
        };
        SosHarvester::new(
            self.client.as_ref(),
            self.name(),
            config,
            capabilities,
            context,
            dialect,
        )
        .run()
        .await
    }
}

/// Connector for legacy SOS 1.0 services.
pub struct Sos1Connector {
    client: Arc<dyn SosClient>,
}

impl Sos1Connector {
    pub fn new(client: Arc<dyn SosClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SosConnector for Sos1Connector {
    fn client(&self) -> &dyn SosClient {
        self.client.as_ref()
    }

    fn name(&self) -> &str {
        "sos1"
    }

    fn description(&self) -> &str {
        "SOS 1.0 from offering contents"
    }

    fn can_handle(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
    ) -> bool {
        version_matches(config, &capabilities.capabilities, SOS_100)
    }

    async fn get_constellation(
        &self,
        config: &DataSourceConfiguration,
        capabilities: &GetCapabilitiesResponse,
        context: &HarvestContext,
    ) -> Result<Harvest, HarvestError> {
        SosHarvester::new(
            self.client.as_ref(),
            self.name(),
            config,
            capabilities,
            context,
            Dialect::OfferingLists,
        )
        .run()
        .await
    }
}
