//! DCAT description of a harvested service.
//!
//! The free functions derive catalog content from a capabilities document
//! without touching any graph: keywords, temporal extent, spatial extent.
//! [`DatasetWriter`] turns that content into statements about one Dataset
//! resource.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::collections::HashSet;

use crate::constellation::ServiceNode;
use crate::extent;
use crate::graph::{Graph, Term};
use crate::models::{Address, Capabilities, Envelope, LocalizedString, ServiceProvider};
use crate::vocab::{dcat, dct, foaf, locn, time, vcard, xsd};

/// The secondary API through which harvested datasets are served.
#[derive(Debug, Clone)]
pub struct ApiEndpoint {
    /// Base URL, ending in `/`.
    pub url: String,
    pub description: Option<String>,
}

impl ApiEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self {
            url,
            description: None,
        }
    }

    pub fn service_url(&self, service: &ServiceNode) -> String {
        format!("{}services/{}", self.url, service.id())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalExtent {
    Instant(DateTime<Utc>),
    Interval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

pub fn is_absolute_uri(value: &str) -> bool {
    url::Url::parse(value).is_ok()
}

/// An IRI resource for absolute URIs, a plain literal otherwise.
pub fn resource_or_literal(value: &str) -> Term {
    if is_absolute_uri(value) {
        Term::iri(value)
    } else {
        Term::literal(value)
    }
}

pub fn format_time(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// URL of the capabilities document of the service at `url`.
pub fn capabilities_url(url: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}service=SOS&request=GetCapabilities", url, separator)
}

fn mail_uri(address: &str) -> String {
    if address.starts_with("mailto:") {
        address.to_string()
    } else {
        format!("mailto:{}", address.trim())
    }
}

fn tel_uri(number: &str) -> String {
    let digits: String = number.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.starts_with("tel:") {
        digits
    } else {
        format!("tel:{}", digits)
    }
}

/// Keywords derived from the offerings: identifiers, names, observable
/// properties, procedures and features of interest, in that order and
/// without duplicates.
pub fn keywords(capabilities: &Capabilities) -> Vec<Term> {
    let offerings = &capabilities.contents;
    let terms = offerings
        .iter()
        .map(|o| resource_or_literal(&o.identifier))
        .chain(
            offerings
                .iter()
                .flat_map(|o| o.names.iter())
                .map(|name| Term::lang_literal(name.text.as_str(), name.lang.as_deref())),
        )
        .chain(
            offerings
                .iter()
                .flat_map(|o| o.observable_properties.iter())
                .map(|p| resource_or_literal(p)),
        )
        .chain(
            offerings
                .iter()
                .flat_map(|o| o.procedures.iter())
                .map(|p| resource_or_literal(p)),
        )
        .chain(
            offerings
                .iter()
                .flat_map(|o| o.features_of_interest.iter())
                .map(|f| resource_or_literal(f)),
        );

    let mut seen = HashSet::new();
    terms.filter(|t| seen.insert(t.clone())).collect()
}

/// Minimum and maximum over all offerings' phenomenon time bounds.
pub fn temporal_extent(capabilities: &Capabilities) -> Option<TemporalExtent> {
    let bounds: Vec<DateTime<Utc>> = capabilities
        .contents
        .iter()
        .filter_map(|o| o.phenomenon_time.as_ref())
        .flat_map(|t| t.bounds())
        .collect();
    let min = *bounds.iter().min()?;
    let max = *bounds.iter().max()?;
    if min == max {
        Some(TemporalExtent::Instant(min))
    } else {
        Some(TemporalExtent::Interval {
            start: min,
            end: max,
        })
    }
}

/// GeoJSON union of every offering's observed area.
pub fn spatial_extent(capabilities: &Capabilities) -> Option<Value> {
    let areas: Vec<Envelope> = capabilities
        .contents
        .iter()
        .filter_map(|o| o.observed_area)
        .collect();
    extent::union(&areas)
}

/// Writes the description of one service into the catalog graph.
pub struct DatasetWriter<'a> {
    graph: &'a mut Graph,
    dataset: Term,
    capabilities: &'a Capabilities,
}

impl<'a> DatasetWriter<'a> {
    pub fn new(graph: &'a mut Graph, dataset: Term, capabilities: &'a Capabilities) -> Self {
        Self {
            graph,
            dataset,
            capabilities,
        }
    }

    fn add(&mut self, predicate: &str, object: Term) {
        let dataset = self.dataset.clone();
        self.graph.add(&dataset, predicate, object);
    }

    pub fn add_identifiers(&mut self, service: &ServiceNode) {
        self.add(dcat::LANDING_PAGE, Term::iri(capabilities_url(&service.url)));
        self.add(dct::IDENTIFIER, Term::literal(service.name.as_str()));
        self.add(dct::IDENTIFIER, Term::literal(service.id()));
        self.add(dct::IDENTIFIER, Term::literal(service.url.as_str()));
    }

    /// Title, description, keywords, extents, provider, languages and
    /// access rights.
    pub fn add_description(&mut self) {
        let capabilities = self.capabilities;
        let identification = capabilities.service_identification.as_ref();
        if let Some(identification) = identification {
            self.add_localized(dct::TITLE, &identification.title);
            self.add_localized(dct::DESCRIPTION, &identification.abstract_text);
            self.add_localized(dcat::KEYWORD, &identification.keywords);
        }
        for keyword in keywords(capabilities) {
            self.add(dcat::KEYWORD, keyword);
        }
        self.add_spatial_extent();
        self.add_temporal_extent();
        if let Some(provider) = &capabilities.service_provider {
            self.add_service_provider(provider);
        }
        for language in &capabilities.languages {
            self.add(dct::LANGUAGE, Term::literal(language.as_str()));
        }
        if let Some(identification) = identification {
            for constraint in &identification.access_constraints {
                self.add(dct::ACCESS_RIGHTS, resource_or_literal(constraint));
            }
        }
    }

    fn add_localized(&mut self, predicate: &str, values: &[LocalizedString]) {
        for value in values {
            self.add(
                predicate,
                Term::lang_literal(value.text.as_str(), value.lang.as_deref()),
            );
        }
    }

    fn add_spatial_extent(&mut self) {
        let Some(geometry) = spatial_extent(self.capabilities) else {
            return;
        };
        let location = self.graph.create_typed(dct::LOCATION);
        self.graph.add(
            &location,
            locn::GEOMETRY,
            Term::typed_literal(geometry.to_string(), locn::GEO_JSON),
        );
        self.add(dct::SPATIAL, location);
    }

    fn add_temporal_extent(&mut self) {
        let Some(extent) = temporal_extent(self.capabilities) else {
            return;
        };
        let time = match extent {
            TemporalExtent::Instant(t) => self.create_instant(&t),
            TemporalExtent::Interval { start, end } => {
                let interval = self.graph.create_typed(time::INTERVAL);
                let begin = self.create_instant(&start);
                let end = self.create_instant(&end);
                self.graph.add(&interval, time::HAS_BEGINNING, begin);
                self.graph.add(&interval, time::HAS_END, end);
                interval
            }
        };
        self.add(dct::TEMPORAL, time);
    }

    fn create_instant(&mut self, value: &DateTime<Utc>) -> Term {
        let instant = self.graph.create_typed(time::INSTANT);
        self.graph.add(
            &instant,
            time::IN_XSD_DATE_TIME_STAMP,
            Term::typed_literal(format_time(value), xsd::DATE_TIME),
        );
        instant
    }

    fn add_service_provider(&mut self, provider: &ServiceProvider) {
        let publisher = self.graph.create_typed(foaf::ORGANIZATION);
        self.graph.add(
            &publisher,
            foaf::NAME,
            Term::literal(provider.provider_name.as_str()),
        );
        if let Some(site) = provider.provider_site.as_deref().filter(|s| is_absolute_uri(s)) {
            let homepage = self.graph.create_resource(site, foaf::DOCUMENT);
            self.graph.add(&publisher, foaf::HOMEPAGE, homepage);
        }
        self.add(dct::PUBLISHER, publisher);

        let contact = &provider.service_contact;
        let organization = self.graph.create_typed(vcard::ORGANIZATION);
        let organization_name = contact
            .organisation_name
            .clone()
            .unwrap_or_else(|| provider.provider_name.clone());
        self.graph
            .add(&organization, vcard::FN, Term::literal(organization_name));

        if let Some(individual_name) = &contact.individual_name {
            let individual = self.graph.create_typed(vcard::INDIVIDUAL);
            self.graph
                .add(&individual, vcard::FN, Term::literal(individual_name.as_str()));
            if let Some(position) = &contact.position_name {
                self.graph
                    .add(&individual, vcard::ROLE, Term::literal(position.as_str()));
            }
            self.graph.add(&organization, vcard::HAS_MEMBER, individual);
        }
        if let Some(role) = &contact.role {
            self.graph
                .add(&organization, vcard::ROLE, Term::literal(role.as_str()));
        }
        self.add(dcat::CONTACT_POINT, organization.clone());

        let Some(info) = &contact.contact_info else {
            return;
        };
        if let Some(address) = &info.address {
            for mail in &address.electronic_mail_address {
                self.graph
                    .add(&organization, vcard::EMAIL, Term::iri(mail_uri(mail)));
            }
            if let Some(addr) = self.create_address(address) {
                self.graph.add(&organization, vcard::HAS_ADDRESS, addr);
            }
        }
        if let Some(phone) = &info.phone {
            for fax in &phone.facsimile {
                let number = self.graph.create_resource(&tel_uri(fax), vcard::FAX);
                self.graph.add(&organization, vcard::HAS_TELEPHONE, number);
            }
            for voice in &phone.voice {
                let number = self.graph.create_resource(&tel_uri(voice), vcard::VOICE);
                self.graph.add(&organization, vcard::HAS_TELEPHONE, number);
            }
        }
    }

    fn create_address(&mut self, address: &Address) -> Option<Term> {
        if !address.has_postal_parts() {
            return None;
        }
        let node = self.graph.create_typed(vcard::ADDRESS);
        let parts = [
            (vcard::REGION, &address.administrative_area),
            (vcard::LOCALITY, &address.city),
            (vcard::COUNTRY_NAME, &address.country),
            (vcard::POSTAL_CODE, &address.postal_code),
        ];
        for (predicate, value) in parts {
            if let Some(value) = value {
                self.graph.add(&node, predicate, Term::literal(value.as_str()));
            }
        }
        for street in &address.delivery_point {
            self.graph
                .add(&node, vcard::STREET_ADDRESS, Term::literal(street.as_str()));
        }
        Some(node)
    }

    /// One distribution for the native service endpoint and one for the API.
    pub fn add_distributions(&mut self, service: &ServiceNode, api: &ApiEndpoint) {
        let capabilities_url = capabilities_url(&service.url);

        let native_service = self.graph.create_typed(dcat::DATA_SERVICE);
        self.graph.add(
            &native_service,
            dcat::ENDPOINT_URL,
            Term::iri(service.url.as_str()),
        );
        self.graph.add(
            &native_service,
            dcat::ENDPOINT_DESCRIPTION,
            Term::iri(capabilities_url.as_str()),
        );
        self.graph
            .add(&native_service, dcat::SERVES_DATASET, self.dataset.clone());
        let capabilities = self.capabilities;
        let profiles = capabilities
            .service_identification
            .iter()
            .flat_map(|i| i.profiles.iter())
            .filter(|p| is_absolute_uri(p));
        for profile in profiles {
            let standard = self.graph.create_resource(profile, dct::STANDARD);
            self.graph.add(&native_service, dct::CONFORMS_TO, standard);
        }

        let native = self.graph.create_typed(dcat::DISTRIBUTION);
        self.graph.add(&native, dct::TITLE, Term::literal("SOS"));
        self.graph
            .add(&native, dcat::ACCESS_URL, Term::iri(capabilities_url.as_str()));
        self.graph
            .add(&native, dcat::MEDIA_TYPE, Term::literal("application/xml"));
        self.graph.add(&native, dcat::ACCESS_SERVICE, native_service);
        self.add(dcat::DISTRIBUTION_PROP, native);

        let api_service = self.graph.create_typed(dcat::DATA_SERVICE);
        self.graph
            .add(&api_service, dcat::ENDPOINT_URL, Term::iri(api.url.as_str()));
        if let Some(description) = &api.description {
            self.graph.add(
                &api_service,
                dcat::ENDPOINT_DESCRIPTION,
                Term::iri(description.as_str()),
            );
        }
        self.graph
            .add(&api_service, dcat::SERVES_DATASET, self.dataset.clone());

        let api_distribution = self.graph.create_typed(dcat::DISTRIBUTION);
        self.graph
            .add(&api_distribution, dct::TITLE, Term::literal("API"));
        self.graph.add(
            &api_distribution,
            dcat::MEDIA_TYPE,
            Term::literal("application/json"),
        );
        self.graph.add(
            &api_distribution,
            dcat::ACCESS_URL,
            Term::iri(api.service_url(service)),
        );
        self.graph
            .add(&api_distribution, dcat::ACCESS_SERVICE, api_service);
        self.add(dcat::DISTRIBUTION_PROP, api_distribution);
    }
}
