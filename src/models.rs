//! Decoded sensor observation service documents.
//!
//! The protocol client hands these to the core already decoded; nothing in
//! this crate parses the wire encoding. Every type derives `Deserialize` so
//! the snapshot client and the catalog can read them back from JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service version of the 2.0 protocol dialect.
pub const SOS_200: &str = "2.0.0";
/// Service version of the legacy 1.0 protocol dialect.
pub const SOS_100: &str = "1.0.0";
/// Operation name advertised by services offering data availability lookups.
pub const GET_DATA_AVAILABILITY: &str = "GetDataAvailability";
/// Extension name advertised by services delivering vertical profiles.
pub const PROFILE_EXTENSION: &str = "ProfileObservation";

/// A text with an optional language tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedString {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl LocalizedString {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: None,
        }
    }

    pub fn with_lang(text: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            lang: Some(lang.into()),
        }
    }
}

/// Response of a capabilities request: the decoded document plus the
/// service metadata text it was decoded from.
#[derive(Debug, Clone)]
pub struct GetCapabilitiesResponse {
    pub capabilities: Capabilities,
    pub metadata: String,
}

impl GetCapabilitiesResponse {
    /// Wrap decoded capabilities, rendering the metadata document as JSON.
    pub fn from_capabilities(capabilities: Capabilities) -> anyhow::Result<Self> {
        let metadata = serde_json::to_string(&capabilities)?;
        Ok(Self {
            capabilities,
            metadata,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Capabilities {
    pub version: String,
    #[serde(default)]
    pub service_identification: Option<ServiceIdentification>,
    #[serde(default)]
    pub service_provider: Option<ServiceProvider>,
    /// Names of the operations the service offers.
    #[serde(default)]
    pub operations: Vec<String>,
    /// Allowed values of the `language` operation parameter.
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub contents: Vec<ObservationOffering>,
}

impl Capabilities {
    pub fn supports_operation(&self, name: &str) -> bool {
        self.operations.iter().any(|op| op == name)
    }

    pub fn extension(&self, name: &str) -> Option<&Extension> {
        self.extensions.iter().find(|ext| ext.name == name)
    }
}

/// A capabilities extension, optionally carrying one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceIdentification {
    #[serde(default)]
    pub title: Vec<LocalizedString>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Vec<LocalizedString>,
    #[serde(default)]
    pub keywords: Vec<LocalizedString>,
    #[serde(default)]
    pub access_constraints: Vec<String>,
    #[serde(default)]
    pub profiles: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceProvider {
    pub provider_name: String,
    #[serde(default)]
    pub provider_site: Option<String>,
    #[serde(default)]
    pub service_contact: ResponsibleParty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponsibleParty {
    #[serde(default)]
    pub individual_name: Option<String>,
    #[serde(default)]
    pub organisation_name: Option<String>,
    #[serde(default)]
    pub position_name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default)]
    pub address: Option<Address>,
    #[serde(default)]
    pub phone: Option<Phone>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub delivery_point: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub administrative_area: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub electronic_mail_address: Vec<String>,
}

impl Address {
    /// Whether any postal component is present.
    pub fn has_postal_parts(&self) -> bool {
        self.city.is_some()
            || self.administrative_area.is_some()
            || self.postal_code.is_some()
            || self.country.is_some()
            || !self.delivery_point.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Phone {
    #[serde(default)]
    pub voice: Vec<String>,
    #[serde(default)]
    pub facsimile: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationOffering {
    pub identifier: String,
    #[serde(default)]
    pub names: Vec<LocalizedString>,
    #[serde(default)]
    pub procedures: Vec<String>,
    #[serde(default)]
    pub observable_properties: Vec<String>,
    #[serde(default)]
    pub features_of_interest: Vec<String>,
    #[serde(default)]
    pub observed_area: Option<Envelope>,
    #[serde(default)]
    pub phenomenon_time: Option<Time>,
}

/// Axis-aligned bounding box in `[x, y]` order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub lower: [f64; 2],
    pub upper: [f64; 2],
}

impl Envelope {
    pub fn new(lower: [f64; 2], upper: [f64; 2]) -> Self {
        Self { lower, upper }
    }

    pub fn is_point(&self) -> bool {
        self.lower == self.upper
    }

    pub fn has_area(&self) -> bool {
        self.upper[0] > self.lower[0] && self.upper[1] > self.lower[1]
    }

    pub fn contains(&self, other: &Envelope) -> bool {
        self.lower[0] <= other.lower[0]
            && self.lower[1] <= other.lower[1]
            && self.upper[0] >= other.upper[0]
            && self.upper[1] >= other.upper[1]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Time {
    Instant {
        value: DateTime<Utc>,
    },
    Period {
        #[serde(default)]
        start: Option<DateTime<Utc>>,
        #[serde(default)]
        end: Option<DateTime<Utc>>,
    },
}

impl Time {
    pub fn period(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Time::Period {
            start: Some(start),
            end: Some(end),
        }
    }

    /// All bounds that are set, in start/end order.
    pub fn bounds(&self) -> Vec<DateTime<Utc>> {
        match self {
            Time::Instant { value } => vec![*value],
            Time::Period { start, end } => start.iter().chain(end.iter()).copied().collect(),
        }
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            Time::Instant { value } => Some(*value),
            Time::Period { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        match self {
            Time::Instant { value } => Some(*value),
            Time::Period { end, .. } => *end,
        }
    }
}

/// A reference to a remote resource by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub href: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl Reference {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            title: None,
        }
    }
}

/// One entry of a data availability response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataAvailability {
    pub procedure: Reference,
    pub observed_property: Reference,
    pub feature_of_interest: Reference,
    #[serde(default)]
    pub offering: Option<Reference>,
    /// Falls back to the observed property when the service reports none.
    #[serde(default)]
    pub category: Option<Reference>,
    pub phenomenon_time: AvailabilityPeriod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityPeriod {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureOfInterest {
    pub identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    /// GeoJSON geometry, if the service reported one.
    #[serde(default)]
    pub geometry: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub procedure: String,
    #[serde(default)]
    pub offering: Option<String>,
    pub observed_property: String,
    pub feature_of_interest: String,
    pub phenomenon_time: DateTime<Utc>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}
